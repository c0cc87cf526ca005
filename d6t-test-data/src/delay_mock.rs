// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::blocking::delay::DelayMs;

/// A delay that doesn't, but remembers how long it was asked to wait.
#[derive(Clone, Debug, Default)]
pub struct MockDelay {
    total_ms: Rc<Cell<u64>>,
    calls: Rc<Cell<usize>>,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of milliseconds requested so far.
    pub fn total_ms(&self) -> u64 {
        self.total_ms.get()
    }

    /// How many times a delay was requested.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn record(&self, ms: u64) {
        self.total_ms.set(self.total_ms.get() + ms);
        self.calls.set(self.calls.get() + 1);
    }
}

impl DelayMs<u32> for MockDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.record(u64::from(ms));
    }
}

impl DelayMs<u16> for MockDelay {
    fn delay_ms(&mut self, ms: u16) {
        self.record(u64::from(ms));
    }
}

impl DelayMs<u8> for MockDelay {
    fn delay_ms(&mut self, ms: u8) {
        self.record(u64::from(ms));
    }
}
