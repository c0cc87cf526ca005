// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
#[cfg(feature = "std")]
extern crate std;

use core::fmt;

use embedded_hal::blocking::i2c;

/// Errors that don't involve I²C.
#[derive(Clone, Debug, PartialEq)]
pub enum LibraryError {
    /// The packet error code sent by the sensor did not match the one computed over the frame.
    Checksum { computed: u8, received: u8 },

    /// Grid dimensions that the resampler can't work with (too small, downscaling, or a buffer
    /// that doesn't match the dimensions).
    InvalidDimensions(&'static str),

    /// An I²C address outside of the valid 7-bit range.
    InvalidAddress(u8),

    /// An alpha value that doesn't fit in four bits.
    InvalidAlpha(u8),

    /// A dwell count of zero would never render anything.
    InvalidDwell,

    /// When a value from the sensor is malformed in some way.
    InvalidData(&'static str),
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::Checksum { computed, received } => write!(
                f,
                "packet error code mismatch (computed {:#04X}, received {:#04X})",
                computed, received
            ),
            LibraryError::InvalidDimensions(msg) => write!(f, "{}", msg),
            LibraryError::InvalidAddress(address) => {
                write!(f, "{:#04X} is not a valid 7-bit I²C address", address)
            }
            LibraryError::InvalidAlpha(alpha) => {
                write!(f, "{:#04X} does not fit in a 4-bit alpha channel", alpha)
            }
            LibraryError::InvalidDwell => write!(f, "dwell counts must be at least 1"),
            LibraryError::InvalidData(msg) => write!(f, "{}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LibraryError {}

/// A coarse classification of [`Error`].
///
/// The sensor is read in a retry loop that treats every failure the same, but callers that want
/// to tell a flaky bus from corrupted transfers can match on this.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The transport failed (NACK, arbitration loss, timeout...).
    Bus,

    /// A frame arrived, but its packet error code was wrong.
    Checksum,

    /// Anything else raised by this library.
    Other,
}

pub enum Error<I2C>
where
    I2C: i2c::WriteRead,
{
    /// Errors originating from the I²C implementation during a combined write-read transaction.
    I2cWriteReadError(I2C::Error),

    /// Errors originating from within this library.
    LibraryError(LibraryError),
}

impl<I2C> Error<I2C>
where
    I2C: i2c::WriteRead,
{
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::I2cWriteReadError(_) => ErrorKind::Bus,
            Error::LibraryError(LibraryError::Checksum { .. }) => ErrorKind::Checksum,
            Error::LibraryError(_) => ErrorKind::Other,
        }
    }
}

// Clone and PartialEq only need the bus error to support them, not the bus itself.
impl<I2C> Clone for Error<I2C>
where
    I2C: i2c::WriteRead,
    <I2C as i2c::WriteRead>::Error: Clone,
{
    fn clone(&self) -> Self {
        match self {
            Error::I2cWriteReadError(i2c_error) => Error::I2cWriteReadError(i2c_error.clone()),
            Error::LibraryError(err) => Error::LibraryError(err.clone()),
        }
    }
}

impl<I2C> PartialEq for Error<I2C>
where
    I2C: i2c::WriteRead,
    <I2C as i2c::WriteRead>::Error: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::I2cWriteReadError(lhs), Error::I2cWriteReadError(rhs)) => lhs == rhs,
            (Error::LibraryError(lhs), Error::LibraryError(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

// Custom Debug implementation so that I2C doesn't need to implement Debug (like the one from
// linux-embedded-hal).
impl<I2C> fmt::Debug for Error<I2C>
where
    I2C: i2c::WriteRead,
    <I2C as i2c::WriteRead>::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::I2cWriteReadError(i2c_error) => f
                .debug_tuple("Error::I2cWriteReadError")
                .field(i2c_error)
                .finish(),
            Error::LibraryError(err) => f.debug_tuple("Error::LibraryError").field(err).finish(),
        }
    }
}

impl<I2C> fmt::Display for Error<I2C>
where
    I2C: i2c::WriteRead,
    <I2C as i2c::WriteRead>::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::I2cWriteReadError(i2c_error) => write!(f, "I2C Error: {:?}", i2c_error),
            Error::LibraryError(err) => write!(f, "Library Error: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl<I2C> std::error::Error for Error<I2C>
where
    I2C: i2c::WriteRead,
    <I2C as i2c::WriteRead>::Error: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::I2cWriteReadError(i2c_error) => Some(i2c_error),
            Error::LibraryError(lib_err) => Some(lib_err),
        }
    }
}

impl<I2C> From<LibraryError> for Error<I2C>
where
    I2C: i2c::WriteRead,
{
    fn from(lib_err: LibraryError) -> Self {
        Self::LibraryError(lib_err)
    }
}

/// Errors from rendering one frame.
#[derive(Clone, PartialEq)]
pub enum RenderError<E> {
    /// The display sink refused the frame.
    Display(E),

    /// Errors originating from within this library.
    LibraryError(LibraryError),
}

impl<E: fmt::Debug> fmt::Debug for RenderError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Display(err) => f.debug_tuple("RenderError::Display").field(err).finish(),
            RenderError::LibraryError(err) => f
                .debug_tuple("RenderError::LibraryError")
                .field(err)
                .finish(),
        }
    }
}

impl<E: fmt::Debug> fmt::Display for RenderError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Display(err) => write!(f, "Display Error: {:?}", err),
            RenderError::LibraryError(err) => write!(f, "Library Error: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl<E> std::error::Error for RenderError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Display(err) => Some(err),
            RenderError::LibraryError(err) => Some(err),
        }
    }
}

impl<E> From<LibraryError> for RenderError<E> {
    fn from(lib_err: LibraryError) -> Self {
        Self::LibraryError(lib_err)
    }
}

/// Errors from one full cycle of reading the sensor and rendering.
pub enum StepError<I2C, E>
where
    I2C: i2c::WriteRead,
{
    /// Reading the sensor failed (after any retries).
    Sensor(Error<I2C>),

    /// The frame was read, but couldn't be shown.
    Render(RenderError<E>),
}

impl<I2C, E> fmt::Debug for StepError<I2C, E>
where
    I2C: i2c::WriteRead,
    <I2C as i2c::WriteRead>::Error: fmt::Debug,
    E: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepError::Sensor(err) => f.debug_tuple("StepError::Sensor").field(err).finish(),
            StepError::Render(err) => f.debug_tuple("StepError::Render").field(err).finish(),
        }
    }
}

impl<I2C, E> fmt::Display for StepError<I2C, E>
where
    I2C: i2c::WriteRead,
    <I2C as i2c::WriteRead>::Error: fmt::Debug,
    E: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepError::Sensor(err) => fmt::Display::fmt(err, f),
            StepError::Render(err) => fmt::Display::fmt(err, f),
        }
    }
}

#[cfg(feature = "std")]
impl<I2C, E> std::error::Error for StepError<I2C, E>
where
    I2C: i2c::WriteRead + 'static,
    <I2C as i2c::WriteRead>::Error: std::error::Error + 'static,
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StepError::Sensor(err) => Some(err),
            StepError::Render(err) => Some(err),
        }
    }
}
