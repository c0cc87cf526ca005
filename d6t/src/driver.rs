// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross

use core::num::NonZeroU32;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c;
use log::{debug, trace, warn};

use crate::error::{Error, LibraryError};
use crate::frame::{decode, ThermalFrame, FRAME_LENGTH};

/// The (7-bit) I²C address of the D6T-44L-06. It isn't configurable on the sensor.
pub const DEFAULT_ADDRESS: u8 = 0x0A;

/// The command that asks the sensor for a measurement frame.
pub const COMMAND: u8 = 0x4C;

/// How long to wait after power-up before the first read.
///
/// The datasheet asks for "about" 100ms, a bit of extra margin doesn't hurt.
pub const STARTUP_DELAY_MS: u32 = 150;

/// How [`D6t44l::read_frame_blocking`] deals with failed reads.
///
/// Every failure (bus errors and checksum errors alike) is treated as transient: wait `delay_ms`,
/// then try again.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Milliseconds to wait between attempts.
    pub delay_ms: u32,

    /// Give up after this many attempts. `None` retries forever.
    pub max_attempts: Option<NonZeroU32>,
}

impl RetryPolicy {
    /// Keep trying until the sensor answers.
    pub const fn unbounded(delay_ms: u32) -> Self {
        Self {
            delay_ms,
            max_attempts: None,
        }
    }

    /// Try at most `max_attempts` times.
    pub const fn bounded(delay_ms: u32, max_attempts: NonZeroU32) -> Self {
        Self {
            delay_ms,
            max_attempts: Some(max_attempts),
        }
    }
}

impl Default for RetryPolicy {
    /// Retry every 10ms, forever.
    fn default() -> Self {
        Self::unbounded(10)
    }
}

/// Driver for the Omron D6T-44L-06 4×4 thermopile array.
///
/// The driver owns the bus for its lifetime, which is what guarantees that nothing else can
/// sneak a transaction in between the command and the read. If the bus has to be shared, wrap it
/// in a [`SharedBus`][crate::bus::SharedBus] first.
#[derive(Clone, Debug)]
pub struct D6t44l<I2C> {
    /// The I²C bus this sensor is accessible on.
    bus: I2C,

    /// The I²C address this sensor is accessible at.
    address: u8,

    /// Buffer for reading frames off of the sensor.
    buffer: [u8; FRAME_LENGTH],

    /// The most recent frame that passed validation.
    last_frame: Option<ThermalFrame>,
}

impl<I2C> D6t44l<I2C>
where
    I2C: i2c::WriteRead,
{
    /// Create a driver for a sensor at the default address.
    pub fn new(bus: I2C) -> Self {
        Self {
            bus,
            address: DEFAULT_ADDRESS,
            buffer: [0u8; FRAME_LENGTH],
            last_frame: None,
        }
    }

    /// Create a driver for a sensor at a non-standard address (behind an address translator, for
    /// example).
    pub fn new_with_address(bus: I2C, address: u8) -> Result<Self, Error<I2C>> {
        if address == 0 || address > 0x7F {
            return Err(LibraryError::InvalidAddress(address).into());
        }
        Ok(Self {
            address,
            ..Self::new(bus)
        })
    }

    /// Wait out the sensor's power-up time.
    ///
    /// There's nothing to configure on the sensor, this only blocks for [`STARTUP_DELAY_MS`].
    pub fn setup<D>(&mut self, delay: &mut D)
    where
        D: DelayMs<u32>,
    {
        delay.delay_ms(STARTUP_DELAY_MS);
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// The most recent frame successfully read, if any.
    pub fn last_frame(&self) -> Option<&ThermalFrame> {
        self.last_frame.as_ref()
    }

    /// Read and validate one frame from the sensor.
    ///
    /// The command and the read are sent as one transaction (with a repeated start). Failures are
    /// returned as-is, there are no retries at this level.
    pub fn read_frame(&mut self) -> Result<ThermalFrame, Error<I2C>> {
        trace!("Reading frame from {:#04X}", self.address);
        self.bus
            .write_read(self.address, &[COMMAND], &mut self.buffer)
            .map_err(Error::I2cWriteReadError)?;
        let frame = decode(self.address, COMMAND, &self.buffer)?;
        debug!(
            "PTAT {} (tenths of ℃), pixels {:?}",
            frame.reference_temperature(),
            frame.pixels()
        );
        self.last_frame = Some(frame);
        Ok(frame)
    }

    /// Read a frame, retrying according to `policy`.
    ///
    /// When the policy is bounded and every attempt fails, the error from the last attempt is
    /// returned.
    pub fn read_frame_blocking<D>(
        &mut self,
        delay: &mut D,
        policy: &RetryPolicy,
    ) -> Result<ThermalFrame, Error<I2C>>
    where
        D: DelayMs<u32>,
    {
        let mut attempt: u32 = 1;
        loop {
            match self.read_frame() {
                Ok(frame) => return Ok(frame),
                Err(err) => {
                    warn!("Sensor read failed ({:?}), attempt {}", err.kind(), attempt);
                    if let Some(max_attempts) = policy.max_attempts {
                        if attempt >= max_attempts.get() {
                            return Err(err);
                        }
                    }
                }
            }
            delay.delay_ms(policy.delay_ms);
            attempt = attempt.saturating_add(1);
        }
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.bus
    }
}

#[cfg(test)]
mod test {
    use core::num::NonZeroU32;

    use d6t_test_data::{
        example_frame, sensor_at_address, uniform_frame, I2cOperation, MockDelay, MockError,
        MockSensorBus, EXAMPLE_PIXELS, EXAMPLE_REFERENCE,
    };

    use super::{D6t44l, RetryPolicy, COMMAND, DEFAULT_ADDRESS, STARTUP_DELAY_MS};
    use crate::error::{Error, ErrorKind, LibraryError};
    use crate::frame::FRAME_LENGTH;

    fn create_sensor() -> (D6t44l<MockSensorBus>, MockSensorBus) {
        let mocked = sensor_at_address(DEFAULT_ADDRESS);
        (D6t44l::new(mocked.clone()), mocked)
    }

    #[test]
    fn read_example_frame() {
        let (mut sensor, mocked) = create_sensor();
        assert!(sensor.last_frame().is_none());
        let frame = sensor.read_frame().unwrap();
        assert_eq!(frame.reference_temperature(), EXAMPLE_REFERENCE);
        assert_eq!(frame.pixels(), &EXAMPLE_PIXELS);
        assert_eq!(sensor.last_frame(), Some(&frame));
        let ops = mocked.recent_operations();
        assert_eq!(
            ops.len(),
            1,
            "Only one transaction should be performed to read a frame"
        );
        assert_eq!(
            ops[0],
            I2cOperation::WriteRead {
                command: COMMAND,
                length: FRAME_LENGTH
            }
        );
    }

    #[test]
    fn end_to_end_bytes() {
        // PTAT of 10.0℃, every pixel at 15.0℃. The PEC was worked out by hand.
        let mut bytes = [0u8; FRAME_LENGTH];
        bytes[0] = 100;
        for pair in bytes[2..34].chunks_exact_mut(2) {
            pair[0] = 150;
        }
        bytes[34] = 0x52;
        let mocked = MockSensorBus::new(DEFAULT_ADDRESS, &bytes);
        let mut sensor = D6t44l::new(mocked);
        let frame = sensor.read_frame().unwrap();
        assert_eq!(frame.reference_temperature(), 100);
        assert!(frame.pixels().iter().all(|pixel| *pixel == 150));
    }

    #[test]
    fn non_default_address() {
        let address = 0x21;
        let mocked = sensor_at_address(address);
        let mut sensor = D6t44l::new_with_address(mocked, address).unwrap();
        assert_eq!(sensor.address(), address);
        assert!(sensor.read_frame().is_ok());
        // The default address doesn't get an answer
        let mut wrong = D6t44l::new(sensor.release());
        assert!(matches!(
            wrong.read_frame(),
            Err(Error::I2cWriteReadError(MockError::UnknownI2cAddress(0x0A)))
        ));
    }

    #[test]
    fn invalid_addresses() {
        for address in [0x00, 0x80, 0xFF] {
            let result = D6t44l::new_with_address(sensor_at_address(DEFAULT_ADDRESS), address);
            assert!(matches!(
                result,
                Err(Error::LibraryError(LibraryError::InvalidAddress(_)))
            ));
        }
    }

    #[test]
    fn bus_error() {
        let (mut sensor, mocked) = create_sensor();
        mocked.fail_next(1);
        let err = sensor.read_frame().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bus);
        assert!(sensor.last_frame().is_none());
        assert!(sensor.read_frame().is_ok());
    }

    #[test]
    fn checksum_error_every_byte() {
        let (mut sensor, mocked) = create_sensor();
        let good = sensor.read_frame().unwrap();
        for index in 0..FRAME_LENGTH {
            mocked.set_frame(&example_frame(DEFAULT_ADDRESS));
            mocked.corrupt_byte(index, 0x10);
            let err = sensor.read_frame().unwrap_err();
            assert_eq!(
                err.kind(),
                ErrorKind::Checksum,
                "Corrupted byte {} was not rejected",
                index
            );
            // A failed read must not replace the last good frame
            assert_eq!(sensor.last_frame(), Some(&good));
        }
    }

    #[test]
    fn setup_waits() {
        let (mut sensor, mocked) = create_sensor();
        let mut delay = MockDelay::new();
        sensor.setup(&mut delay);
        assert_eq!(delay.total_ms(), u64::from(STARTUP_DELAY_MS));
        assert!(mocked.recent_operations().is_empty());
    }

    #[test]
    fn retry_until_success() {
        let (mut sensor, mocked) = create_sensor();
        mocked.fail_next(3);
        let mut delay = MockDelay::new();
        let frame = sensor
            .read_frame_blocking(&mut delay, &RetryPolicy::default())
            .unwrap();
        assert_eq!(frame.reference_temperature(), EXAMPLE_REFERENCE);
        assert_eq!(mocked.recent_operations().len(), 4);
        assert_eq!(delay.calls(), 3);
        assert_eq!(delay.total_ms(), 30);
    }

    #[test]
    fn retry_after_checksum_error() {
        let (mut sensor, mocked) = create_sensor();
        mocked.corrupt_byte(5, 0x01);
        let mut delay = MockDelay::new();
        let policy = RetryPolicy::bounded(10, NonZeroU32::new(3).unwrap());
        let err = sensor.read_frame_blocking(&mut delay, &policy).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Checksum);
        assert_eq!(mocked.recent_operations().len(), 3);
        mocked.clear_recent_operations();
        assert!(mocked.recent_operations().is_empty());
        // Fix the "wiring" and try again
        mocked.set_frame(&uniform_frame(DEFAULT_ADDRESS, 200, 210));
        let frame = sensor.read_frame_blocking(&mut delay, &policy).unwrap();
        assert_eq!(frame.reference_temperature(), 200);
        assert_eq!(mocked.recent_operations().len(), 1);
    }

    #[test]
    fn retry_bounded() {
        let (mut sensor, mocked) = create_sensor();
        mocked.set_always_fail(true);
        let mut delay = MockDelay::new();
        let policy = RetryPolicy::bounded(25, NonZeroU32::new(5).unwrap());
        let result = sensor.read_frame_blocking(&mut delay, &policy);
        assert!(matches!(
            result,
            Err(Error::I2cWriteReadError(MockError::Nack))
        ));
        assert_eq!(mocked.recent_operations().len(), 5);
        // No waiting after the last attempt
        assert_eq!(delay.calls(), 4);
        assert_eq!(delay.total_ms(), 100);
    }
}
