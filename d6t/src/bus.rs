// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Sharing one I²C bus between several drivers.
//!
//! [`D6t44l`][crate::D6t44l] takes its bus by value, which is the simplest way to make sure the
//! command and the following read aren't interleaved with somebody else's traffic. When other
//! devices live on the same bus, wrap the bus in a [`SharedBus`] and give each driver a reference
//! to it instead. Every transaction then happens with the bus lock held, and the lock is dropped
//! when the transaction finishes, failed or not.
extern crate std;

use std::sync::{Mutex, MutexGuard};

use embedded_hal::blocking::i2c;

#[derive(Debug, Default)]
pub struct SharedBus<I2C> {
    bus: Mutex<I2C>,
}

impl<I2C> SharedBus<I2C> {
    pub fn new(bus: I2C) -> Self {
        Self {
            bus: Mutex::new(bus),
        }
    }

    /// Take exclusive access to the bus until the returned guard is dropped.
    ///
    /// A panic while the lock was held doesn't leave the bus in a state worth refusing access
    /// over, so poisoning is ignored.
    pub fn acquire(&self) -> MutexGuard<'_, I2C> {
        self.bus
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn into_inner(self) -> I2C {
        self.bus
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<'a, I2C> i2c::WriteRead for &'a SharedBus<I2C>
where
    I2C: i2c::WriteRead,
{
    type Error = I2C::Error;

    fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        let mut bus = self.acquire();
        bus.write_read(address, bytes, buffer)
    }
}
