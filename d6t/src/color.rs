// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! False-color mapping.
//!
//! Temperatures are first squashed into `[0, 1]` relative to a [`TemperatureWindow`], then turned
//! into a color sweeping blue → cyan → green → yellow → red. Colors are 16-bit ARGB4444, stored
//! in the channel order the graphics layer expects (green, blue, alpha, red from the most
//! significant nibble down).

use core::convert::TryFrom;
use core::f32::consts::PI;

use num_traits::Float;

use crate::error::LibraryError;

/// A 4-bit alpha value.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Alpha(u8);

impl Alpha {
    /// Fully transparent.
    pub const TRANSPARENT: Alpha = Alpha(0x00);

    /// Fully opaque.
    pub const MAX: Alpha = Alpha(0x0F);

    /// First step of the fade-out.
    pub const SWITCH_HIGH: Alpha = Alpha(0x0A);

    /// Second step of the fade-out.
    pub const SWITCH_LOW: Alpha = Alpha(0x06);

    /// Mostly see-through, so the camera image underneath shows.
    pub const DEFAULT: Alpha = Alpha(0x03);

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Alpha {
    type Error = LibraryError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 0x0F {
            Err(LibraryError::InvalidAlpha(value))
        } else {
            Ok(Alpha(value))
        }
    }
}

impl From<Alpha> for u8 {
    fn from(alpha: Alpha) -> Self {
        alpha.0
    }
}

/// A packed ARGB4444 color, in GBAR nibble order.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct Color(u16);

impl Color {
    pub const TRANSPARENT: Color = Color(0x0000);

    pub const WHITE: Color = Color(0xFFFF);

    /// Opaque black (only the alpha nibble is set).
    pub const BLACK: Color = Color(0x00F0);

    /// Pack the given channels. Only the lower four bits of each channel are used.
    pub const fn new(red: u8, green: u8, blue: u8, alpha: Alpha) -> Self {
        let red = (red & 0x0F) as u16;
        let green = (green & 0x0F) as u16;
        let blue = (blue & 0x0F) as u16;
        let alpha = (alpha.0 & 0x0F) as u16;
        Color((green << 12) | (blue << 8) | (alpha << 4) | red)
    }

    pub const fn from_raw(raw: u16) -> Self {
        Color(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 12) as u8 & 0x0F
    }

    pub const fn blue(self) -> u8 {
        (self.0 >> 8) as u8 & 0x0F
    }

    pub const fn alpha(self) -> Alpha {
        Alpha((self.0 >> 4) as u8 & 0x0F)
    }

    pub const fn red(self) -> u8 {
        self.0 as u8 & 0x0F
    }
}

impl From<Color> for u16 {
    fn from(color: Color) -> Self {
        color.0
    }
}

/// Squash `value` into `[0, 1]`.
///
/// Anything at or below `min` is exactly 0, anything at or above `max` is exactly 1.
pub fn normalize_0_to_1(value: i16, min: i32, max: i32) -> f32 {
    let value = i32::from(value);
    if value <= min {
        0.0
    } else if max <= value {
        1.0
    } else {
        (value - min) as f32 / (max - min) as f32
    }
}

/// The range of temperatures (tenths of a degree) spread over the color ramp.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct TemperatureWindow {
    min: i32,
    max: i32,
}

impl TemperatureWindow {
    /// How far below the reference temperature the window starts, in tenths of a degree.
    pub const MARGIN_BELOW: u16 = 70;

    /// How far above the reference temperature the window ends, in tenths of a degree.
    pub const MARGIN_ABOVE: u16 = 20;

    /// A window from 7℃ below to 2℃ above `reference`.
    ///
    /// Centering on the sensor's own PTAT reading instead of a fixed scale means objects at room
    /// temperature show up blue-ish and anything warmer than the sensor is red.
    pub fn around(reference: i16) -> Self {
        Self::with_margins(reference, Self::MARGIN_BELOW, Self::MARGIN_ABOVE)
    }

    pub fn with_margins(reference: i16, below: u16, above: u16) -> Self {
        let reference = i32::from(reference);
        Self {
            min: reference - i32::from(below),
            max: reference + i32::from(above),
        }
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn normalize(&self, value: i16) -> f32 {
        normalize_0_to_1(value, self.min, self.max)
    }
}

/// Map a normalized temperature to a color.
///
/// 0 and 1 are pure blue and pure red. In between, each quarter of the range holds one channel at
/// full intensity while a second channel follows
///
/// ```text
/// ramp = round((-cos(4πt) / 2 + 0.5) * 15)
/// ```
///
/// which runs 0 → 15 over the first and third quarters and 15 → 0 over the second and fourth,
/// so neighbouring quarters meet at the same color.
pub fn map_color(alpha: Alpha, normalized: f32) -> Color {
    if normalized == 0.0 {
        Color::new(0x00, 0x00, 0x0F, alpha)
    } else if normalized == 1.0 {
        Color::new(0x0F, 0x00, 0x00, alpha)
    } else {
        let cos = Float::cos(4.0 * PI * normalized);
        let ramp = Float::round((-cos / 2.0 + 0.5) * 15.0) as u8;
        let ramp = ramp.min(0x0F);
        if normalized < 0.25 {
            Color::new(0x00, ramp, 0x0F, alpha)
        } else if normalized < 0.50 {
            Color::new(0x00, 0x0F, ramp, alpha)
        } else if normalized < 0.75 {
            Color::new(ramp, 0x0F, 0x00, alpha)
        } else {
            Color::new(0x0F, ramp, 0x00, alpha)
        }
    }
}
