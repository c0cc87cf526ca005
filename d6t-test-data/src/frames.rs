// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross

/// The 7-bit I²C address the D6T-44L-06 responds to.
pub const DEFAULT_ADDRESS: u8 = 0x0A;

/// The command byte that requests a measurement frame.
pub const COMMAND: u8 = 0x4C;

/// Number of thermopile pixels (4×4).
pub const PIXEL_COUNT: usize = 16;

/// Reference temperature, 16 pixels, and one byte of packet error code.
pub const FRAME_LENGTH: usize = (PIXEL_COUNT + 1) * 2 + 1;

/// Reference temperature for [`example_frame`], in tenths of a degree Celsius.
pub const EXAMPLE_REFERENCE: i16 = 245;

/// Pixel values for [`example_frame`].
///
/// A warm object sits in the middle of the field of view, with a cold spot (below freezing, to
/// exercise the sign handling) in the bottom row.
pub const EXAMPLE_PIXELS: [i16; PIXEL_COUNT] = [
    221, 224, 230, 228, //
    225, 301, 312, 233, //
    226, 305, 318, 235, //
    219, 222, -15, 227, //
];

// This is deliberately the bit-at-a-time version from the datasheet instead of a table-driven
// CRC, so that the library's checksum code is checked against something independent.
fn crc_step(data: u8) -> u8 {
    let mut data = data;
    for _ in 0..8 {
        let shifted_out = data & 0x80;
        data <<= 1;
        if shifted_out != 0 {
            data ^= 0x07;
        }
    }
    data
}

/// Compute the packet error code the sensor would append to `payload`.
///
/// `address` is the 7-bit address of the sensor.
pub fn packet_error_code(address: u8, payload: &[u8]) -> u8 {
    let write_address = address << 1;
    let mut crc = crc_step(write_address);
    crc = crc_step(COMMAND ^ crc);
    crc = crc_step((write_address | 1) ^ crc);
    for byte in payload {
        crc = crc_step(byte ^ crc);
    }
    crc
}

/// Build a complete frame (with a valid packet error code) as the sensor at `address` would send
/// it.
pub fn frame_bytes(address: u8, reference: i16, pixels: &[i16; PIXEL_COUNT]) -> [u8; FRAME_LENGTH] {
    let mut frame = [0u8; FRAME_LENGTH];
    frame[0..2].copy_from_slice(&reference.to_le_bytes());
    for (chunk, pixel) in frame[2..(FRAME_LENGTH - 1)]
        .chunks_exact_mut(2)
        .zip(pixels.iter())
    {
        chunk.copy_from_slice(&pixel.to_le_bytes());
    }
    frame[FRAME_LENGTH - 1] = packet_error_code(address, &frame[..(FRAME_LENGTH - 1)]);
    frame
}

/// A frame where every pixel reads the same value.
pub fn uniform_frame(address: u8, reference: i16, pixel: i16) -> [u8; FRAME_LENGTH] {
    frame_bytes(address, reference, &[pixel; PIXEL_COUNT])
}

/// A frame built from [`EXAMPLE_REFERENCE`] and [`EXAMPLE_PIXELS`].
pub fn example_frame(address: u8) -> [u8; FRAME_LENGTH] {
    frame_bytes(address, EXAMPLE_REFERENCE, &EXAMPLE_PIXELS)
}
