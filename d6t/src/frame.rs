// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! The measurement frame sent by the sensor.
//!
//! A read returns [`FRAME_LENGTH`] bytes:
//!
//! ```text
//! +-----------+-----------+-----------+-----+------------+-----+
//! | PTAT (LE) | P0,0 (LE) | P1,0 (LE) | ... | P3,3 (LE)  | PEC |
//! +-----------+-----------+-----------+-----+------------+-----+
//!    2 bytes     2 bytes     2 bytes           2 bytes    1 byte
//! ```
//!
//! All temperatures are signed 16-bit integers in tenths of a degree Celsius, little-endian.
//! Pixels are in row-major order.

use core::fmt;

use crate::error::LibraryError;
use crate::pec::validate_packet_error_code;

/// Width of the thermopile array, in pixels.
pub const WIDTH: usize = 4;

/// Height of the thermopile array, in pixels.
pub const HEIGHT: usize = 4;

/// Number of thermopile pixels.
pub const PIXEL_COUNT: usize = WIDTH * HEIGHT;

/// Length of a complete frame: the reference temperature, each pixel, and the PEC byte.
pub const FRAME_LENGTH: usize = (PIXEL_COUNT + 1) * 2 + 1;

/// One reading from the sensor.
///
/// Temperatures are kept as the raw tenths of a degree the sensor sends; the `*_celsius` methods
/// convert for display.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ThermalFrame {
    reference_temperature: i16,
    pixels: [i16; PIXEL_COUNT],
}

impl ThermalFrame {
    pub fn new(reference_temperature: i16, pixels: [i16; PIXEL_COUNT]) -> Self {
        Self {
            reference_temperature,
            pixels,
        }
    }

    /// Decode a frame without looking at the PEC byte.
    ///
    /// Most users want [`decode`], which checks the PEC first.
    pub fn from_bytes(bytes: &[u8; FRAME_LENGTH]) -> Self {
        let reference_temperature = i16::from_le_bytes([bytes[0], bytes[1]]);
        let mut pixels = [0i16; PIXEL_COUNT];
        bytes[2..(FRAME_LENGTH - 1)]
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .zip(pixels.iter_mut())
            .for_each(|(value, pixel)| *pixel = value);
        Self {
            reference_temperature,
            pixels,
        }
    }

    /// The PTAT (proportional to absolute temperature) reading, in tenths of a degree.
    ///
    /// This is the temperature of the sensor itself, and is used as the center of the color
    /// mapping window.
    pub fn reference_temperature(&self) -> i16 {
        self.reference_temperature
    }

    pub fn reference_celsius(&self) -> f32 {
        f32::from(self.reference_temperature) / 10.0
    }

    /// All pixels, row-major, in tenths of a degree.
    pub fn pixels(&self) -> &[i16; PIXEL_COUNT] {
        &self.pixels
    }

    /// A single pixel, in tenths of a degree.
    ///
    /// Panics if `x` or `y` are out of range.
    pub fn pixel(&self, x: usize, y: usize) -> i16 {
        assert!(x < WIDTH && y < HEIGHT, "({}, {}) is outside of the 4x4 array", x, y);
        self.pixels[y * WIDTH + x]
    }

    pub fn pixel_celsius(&self, x: usize, y: usize) -> f32 {
        f32::from(self.pixel(x, y)) / 10.0
    }

    /// Iterate over the rows of pixels, top to bottom.
    pub fn rows(&self) -> core::slice::ChunksExact<'_, i16> {
        self.pixels.chunks_exact(WIDTH)
    }
}

/// A plain-text readout: the PTAT on the first line, then one line per row of pixels.
impl fmt::Display for ThermalFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PTAT: {:6.1}[degC]", self.reference_celsius())?;
        for row in self.rows() {
            for pixel in row {
                write!(f, "{:4.1}, ", f32::from(*pixel) / 10.0)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Validate the PEC of a frame from the sensor at `address`, then decode it.
pub fn decode(address: u8, command: u8, bytes: &[u8]) -> Result<ThermalFrame, LibraryError> {
    let bytes: &[u8; FRAME_LENGTH] = bytes
        .try_into()
        .map_err(|_| LibraryError::InvalidData("Frames must be exactly 35 bytes"))?;
    validate_packet_error_code(address, command, &bytes[..])?;
    Ok(ThermalFrame::from_bytes(bytes))
}
