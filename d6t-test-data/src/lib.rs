// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
mod delay_mock;
mod frames;
mod i2c_mock;

pub use delay_mock::MockDelay;
pub use frames::{
    example_frame, frame_bytes, packet_error_code, uniform_frame, COMMAND, DEFAULT_ADDRESS,
    EXAMPLE_PIXELS, EXAMPLE_REFERENCE, FRAME_LENGTH, PIXEL_COUNT,
};
pub use i2c_mock::{sensor_at_address, I2cOperation, MockError, MockSensorBus};
