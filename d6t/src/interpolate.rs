// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Bilinear upscaling of the thermopile grid.
//!
//! The 4×4 readings are stretched to larger grids in two separable passes. The source cells are
//! first pinned to "anchor" positions in the output, spread as evenly as integer division
//! allows:
//!
//! ```text
//! x_out = floor((W_out - 1) * x_in / (W_in - 1))
//! ```
//!
//! (and the same for rows). The first pass fills every anchor row by interpolating between
//! horizontally adjacent anchors, the second pass fills the rows between anchor rows by
//! interpolating down each column. Anchors are copied, never recomputed, so they hold the source
//! values exactly.
//!
//! Because of the integer division, the anchors for 64×60 from a 4×4 grid land on columns 0, 21,
//! 42, 63 and rows 0, 19, 39, 59; the segments aren't all the same length.

use core::fmt::{self, Write as _};

use arrayvec::ArrayString;

use crate::error::LibraryError;
use crate::frame::{HEIGHT, PIXEL_COUNT, WIDTH};

/// The number of cells in the largest supported grid (160×120).
pub const MAX_CELLS: usize = 160 * 120;

/// The grid sizes the renderer knows about.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Resolution {
    /// 4×4, the sensor's own resolution.
    Native,
    /// 8×8
    Eight,
    /// 16×16
    Sixteen,
    /// 32×32
    ThirtyTwo,
    /// 64×60
    SixtyFour,
    /// 160×120
    OneSixty,
}

impl Resolution {
    /// Every resolution, smallest first.
    pub const ALL: [Resolution; 6] = [
        Resolution::Native,
        Resolution::Eight,
        Resolution::Sixteen,
        Resolution::ThirtyTwo,
        Resolution::SixtyFour,
        Resolution::OneSixty,
    ];

    pub const fn width(self) -> usize {
        match self {
            Resolution::Native => WIDTH,
            Resolution::Eight => 8,
            Resolution::Sixteen => 16,
            Resolution::ThirtyTwo => 32,
            Resolution::SixtyFour => 64,
            Resolution::OneSixty => 160,
        }
    }

    pub const fn height(self) -> usize {
        match self {
            Resolution::Native => HEIGHT,
            Resolution::Eight => 8,
            Resolution::Sixteen => 16,
            Resolution::ThirtyTwo => 32,
            Resolution::SixtyFour => 60,
            Resolution::OneSixty => 120,
        }
    }

    /// Total number of cells in a grid of this resolution.
    pub const fn cells(self) -> usize {
        self.width() * self.height()
    }

    /// The size, in display pixels, of one cell when this grid is stretched over a display.
    pub const fn tile_size(self, display_width: usize, display_height: usize) -> (usize, usize) {
        (display_width / self.width(), display_height / self.height())
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Padded so captions keep a fixed width.
        let mut label = ArrayString::<7>::new();
        write!(label, "{}*{}", self.width(), self.height())?;
        f.pad(&label)
    }
}

/// Where source cell `index` lands in the output.
#[inline]
fn anchor(out_size: usize, index: usize, in_size: usize) -> usize {
    (out_size - 1) * index / (in_size - 1)
}

#[inline]
fn lerp(start: f32, goal: f32, t: f32) -> f32 {
    start + (goal - start) * t
}

/// Upscale a row-major grid.
///
/// `source` must hold `in_width * in_height` cells and `destination` `out_width * out_height`.
/// Both input dimensions must be at least 2, and the output can't be smaller than the input in
/// either dimension.
pub fn interpolate(
    source: &[f32],
    in_width: usize,
    in_height: usize,
    destination: &mut [f32],
    out_width: usize,
    out_height: usize,
) -> Result<(), LibraryError> {
    if in_width < 2 || in_height < 2 {
        return Err(LibraryError::InvalidDimensions(
            "Source grids must be at least 2 cells in each dimension",
        ));
    }
    if out_width < in_width || out_height < in_height {
        return Err(LibraryError::InvalidDimensions("Only upscaling is supported"));
    }
    if source.len() != in_width * in_height {
        return Err(LibraryError::InvalidDimensions(
            "Source length doesn't match its dimensions",
        ));
    }
    if destination.len() != out_width * out_height {
        return Err(LibraryError::InvalidDimensions(
            "Destination length doesn't match its dimensions",
        ));
    }

    // Horizontal pass, only touching anchor rows.
    for (y_in, source_row) in source.chunks_exact(in_width).enumerate() {
        let y_out = anchor(out_height, y_in, in_height);
        let out_row = &mut destination[(y_out * out_width)..((y_out + 1) * out_width)];
        for x_in in 1..in_width {
            let start = anchor(out_width, x_in - 1, in_width);
            let goal = anchor(out_width, x_in, in_width);
            let delta = (goal - start) as f32;
            let data_start = source_row[x_in - 1];
            let data_goal = source_row[x_in];
            out_row[start] = data_start;
            for x in (start + 1)..goal {
                out_row[x] = lerp(data_start, data_goal, (x - start) as f32 / delta);
            }
            out_row[goal] = data_goal;
        }
    }

    // Vertical pass, filling in between the anchor rows.
    for x in 0..out_width {
        for y_in in 1..in_height {
            let start = anchor(out_height, y_in - 1, in_height);
            let goal = anchor(out_height, y_in, in_height);
            let delta = (goal - start) as f32;
            let data_start = destination[start * out_width + x];
            let data_goal = destination[goal * out_width + x];
            for y in (start + 1)..goal {
                destination[y * out_width + x] =
                    lerp(data_start, data_goal, (y - start) as f32 / delta);
            }
        }
    }
    Ok(())
}

/// Upscale a sensor-sized (4×4) grid to `resolution`.
///
/// Only the first `resolution.cells()` entries of `destination` are written. For
/// [`Resolution::Native`] the source is copied as-is.
pub fn upscale(
    source: &[f32; PIXEL_COUNT],
    resolution: Resolution,
    destination: &mut [f32],
) -> Result<(), LibraryError> {
    let cells = resolution.cells();
    if destination.len() < cells {
        return Err(LibraryError::InvalidDimensions(
            "Destination is too small for the requested resolution",
        ));
    }
    let destination = &mut destination[..cells];
    match resolution {
        Resolution::Native => {
            destination.copy_from_slice(&source[..]);
            Ok(())
        }
        _ => interpolate(
            &source[..],
            WIDTH,
            HEIGHT,
            destination,
            resolution.width(),
            resolution.height(),
        ),
    }
}
