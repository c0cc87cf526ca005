//! A pure-Rust driver for the Omron D6T-44L-06 4×4 thermal sensor, along with a small
//! false-color renderer for showing its readings.
//!
//! This library uses the [`embedded-hal`][embedded-hal] I²C and delay traits, so it should work
//! anywhere there's an `embedded-hal` implementation available. It is also `no_std` compatible;
//! floating point math comes from either `std` (the default) or `libm`.
//!
//! [embedded-hal]: https://docs.rs/embedded-hal/*/embedded_hal/blocking/i2c/index.html
//!
//! # Reading the Sensor
//! ```no_run
//! use d6t::{D6t44l, RetryPolicy};
//! use linux_embedded_hal::{Delay, I2cdev};
//!
//! let i2c_bus = I2cdev::new("/dev/i2c-1").expect("/dev/i2c-1 needs to be an I2C controller");
//! let mut delay = Delay;
//! let mut sensor = D6t44l::new(i2c_bus);
//! sensor.setup(&mut delay);
//! let frame = sensor.read_frame_blocking(&mut delay, &RetryPolicy::default())?;
//! println!("{}", frame);
//! # Ok::<(), d6t::Error<I2cdev>>(())
//! ```
//! Each frame holds the sensor's own temperature (PTAT) and the 16 pixel temperatures, all in
//! tenths of a degree Celsius. Every frame carries a CRC-8 packet error code that is checked
//! before anything is decoded; [`D6t44l::read_frame`] reports a mismatch as an error instead of
//! returning suspect data, while [`D6t44l::read_frame_blocking`] retries according to a
//! [`RetryPolicy`].
//!
//! # Rendering
//! The rest of the crate turns frames into pictures. Pixel temperatures are normalized to a
//! window around the PTAT reading ([`color`]), upscaled with bilinear interpolation
//! ([`interpolate`]), and mapped onto a blue to red color ramp. [`Thermograph`] strings these
//! together with a [`Sequencer`] that steps through increasingly fine resolutions and fades, and
//! hands each result to a [`DisplaySink`] using alternating buffers.

#![no_std]
#![allow(clippy::float_cmp)]

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("Either the 'std' or 'libm' feature must be enabled.");

#[cfg(feature = "std")]
pub mod bus;
pub mod color;
pub mod display;
pub mod driver;
pub mod error;
pub mod frame;
pub mod interpolate;
pub mod pec;
pub mod render;
pub mod sequencer;

#[cfg(feature = "std")]
pub use bus::SharedBus;
pub use color::{Alpha, Color, TemperatureWindow};
pub use display::{BufferSelect, ColorFrame, DisplaySink, DoubleBuffer, Layer};
#[doc(inline)]
pub use driver::{D6t44l, RetryPolicy, COMMAND, DEFAULT_ADDRESS, STARTUP_DELAY_MS};
#[doc(inline)]
pub use error::{Error, ErrorKind, LibraryError, RenderError, StepError};
pub use frame::ThermalFrame;
pub use interpolate::Resolution;
#[doc(inline)]
pub use render::{Thermograph, ThermographConfig};
pub use sequencer::{Phase, Scene, Sequencer};
