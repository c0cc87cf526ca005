// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
use std::cell::{Cell, Ref, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::blocking::i2c;

use crate::frames::{example_frame, COMMAND, FRAME_LENGTH};

const RECENT_OPERATIONS_QUEUE_LENGTH: usize = 32;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MockError {
    /// An unknown I2C address was given.
    UnknownI2cAddress(u8),

    /// The sensor only understands one command.
    UnknownCommand(u8),

    /// The requested operation is not allowed.
    ///
    /// This covers things situations such as:
    /// * A write-read transaction writing anything other than a single command byte.
    /// * A read longer than a full frame, or a zero-length read.
    IllegalOperation,

    /// The sensor didn't acknowledge the transaction (simulated transport failure).
    Nack,
}

impl std::fmt::Display for MockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for MockError {}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum I2cOperation {
    WriteRead { command: u8, length: usize },
}

/// A fake D6T sensor on an I²C bus.
///
/// Clones share their state, so a test can keep a clone around to poke at the "sensor" after
/// handing the bus to a driver.
#[derive(Clone, Debug)]
pub struct MockSensorBus {
    i2c_address: u8,
    frame: Rc<RefCell<[u8; FRAME_LENGTH]>>,
    pending_failures: Rc<Cell<usize>>,
    always_fail: Rc<Cell<bool>>,
    recent_operations: Rc<RefCell<VecDeque<I2cOperation>>>,
}

impl MockSensorBus {
    pub fn new(i2c_address: u8, frame: &[u8; FRAME_LENGTH]) -> Self {
        Self {
            i2c_address,
            frame: Rc::new(RefCell::new(*frame)),
            pending_failures: Rc::new(Cell::new(0)),
            always_fail: Rc::new(Cell::new(false)),
            recent_operations: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Replace the frame the sensor will send on the next read.
    pub fn set_frame(&self, frame: &[u8; FRAME_LENGTH]) {
        self.frame.borrow_mut().copy_from_slice(frame);
    }

    /// Flip one bit in the stored frame, simulating a corrupted transfer.
    pub fn corrupt_byte(&self, index: usize, mask: u8) {
        self.frame.borrow_mut()[index] ^= mask;
    }

    /// NACK the next `count` transactions.
    pub fn fail_next(&self, count: usize) {
        self.pending_failures.set(count);
    }

    /// NACK every transaction until this is set back to `false`.
    pub fn set_always_fail(&self, fail: bool) {
        self.always_fail.set(fail);
    }

    fn add_operation(&self, operation: I2cOperation) {
        let mut recent_ops = self.recent_operations.borrow_mut();
        recent_ops.push_front(operation);
        recent_ops.truncate(RECENT_OPERATIONS_QUEUE_LENGTH);
    }

    pub fn recent_operations(&self) -> Ref<VecDeque<I2cOperation>> {
        self.recent_operations.borrow()
    }

    pub fn clear_recent_operations(&self) {
        self.recent_operations.borrow_mut().clear()
    }
}

impl i2c::WriteRead for MockSensorBus {
    type Error = MockError;

    fn write_read(
        &mut self,
        i2c_address: u8,
        write_buffer: &[u8],
        out_buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        if i2c_address != self.i2c_address {
            return Err(MockError::UnknownI2cAddress(i2c_address));
        }
        if write_buffer.len() != 1 || out_buffer.is_empty() || out_buffer.len() > FRAME_LENGTH {
            return Err(MockError::IllegalOperation);
        }
        self.add_operation(I2cOperation::WriteRead {
            command: write_buffer[0],
            length: out_buffer.len(),
        });
        if write_buffer[0] != COMMAND {
            return Err(MockError::UnknownCommand(write_buffer[0]));
        }
        let pending = self.pending_failures.get();
        if pending > 0 {
            self.pending_failures.set(pending - 1);
            return Err(MockError::Nack);
        }
        if self.always_fail.get() {
            return Err(MockError::Nack);
        }
        let frame = self.frame.borrow();
        out_buffer.copy_from_slice(&frame[..out_buffer.len()]);
        Ok(())
    }
}

/// A mock sensor at `i2c_address`, sending [`example_frame`].
pub fn sensor_at_address(i2c_address: u8) -> MockSensorBus {
    MockSensorBus::new(i2c_address, &example_frame(i2c_address))
}
