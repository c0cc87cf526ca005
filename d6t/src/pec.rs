// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross

//! D6T packet error code (PEC)
//!
//! Every frame the sensor sends ends with a one byte checksum. It is a CRC-8 with the polynomial
//! x<sup>8</sup> + x<sup>2</sup> + x + 1 (0x07), no reflection, an initial value of 0 and no final
//! XOR, better known as CRC-8/SMBUS. The CRC doesn't only cover the received bytes though, it is
//! computed as if the whole I²C transaction were on the wire:
//!
//! 1. The sensor address in write form (`address << 1`).
//! 2. The command byte.
//! 3. The sensor address in read form (`address << 1 | 1`).
//! 4. The frame, minus the trailing PEC byte.
//!
//! Getting that order wrong produces checksums that never match the sensor's, so it's fixed here
//! instead of being left to callers.

use crc::{Crc, CRC_8_SMBUS};

use crate::error::LibraryError;

const PEC: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

/// Compute the packet error code for a transaction with the sensor at `address`.
///
/// `address` is the 7-bit I²C address, `payload` is everything the sensor sent *except* the PEC
/// byte itself.
pub fn packet_error_code(address: u8, command: u8, payload: &[u8]) -> u8 {
    let write_address = address << 1;
    let mut digest = PEC.digest();
    digest.update(&[write_address, command, write_address | 1]);
    digest.update(payload);
    digest.finalize()
}

/// Check the trailing PEC byte of `frame`.
///
/// `frame` is the complete response from the sensor, including the PEC byte.
pub fn validate_packet_error_code(
    address: u8,
    command: u8,
    frame: &[u8],
) -> Result<(), LibraryError> {
    let (received, payload) = frame
        .split_last()
        .ok_or(LibraryError::InvalidData("An empty frame has no packet error code"))?;
    let computed = packet_error_code(address, command, payload);
    if computed == *received {
        Ok(())
    } else {
        Err(LibraryError::Checksum {
            computed,
            received: *received,
        })
    }
}
