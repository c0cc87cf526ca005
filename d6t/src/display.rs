// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Handing rendered frames to a display.
//!
//! The library never touches display hardware itself. Each render cycle fills a [`ColorFrame`]
//! and passes it to a [`DisplaySink`], along with which of the sink's two buffers to put it in.
//! [`DoubleBuffer`] keeps track of that choice so a frame is never written into the buffer that
//! is currently on screen.

use arrayvec::ArrayString;

use crate::color::Color;
use crate::error::LibraryError;
use crate::interpolate::{Resolution, MAX_CELLS};
use crate::sequencer::CAPTION_LENGTH;

/// Size in display pixels (width, height) of the box drawn behind the caption.
pub const CAPTION_BOX: (usize, usize) = (30, 20);

/// The graphics layers the renderer draws on.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Layer {
    /// The translucent overlay above the camera image.
    Thermograph,
}

impl Layer {
    /// The hardware layer number.
    pub const fn index(self) -> u8 {
        match self {
            Layer::Thermograph => 3,
        }
    }
}

/// One of the two buffers backing a layer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BufferSelect {
    A,
    B,
}

impl BufferSelect {
    pub const fn other(self) -> Self {
        match self {
            BufferSelect::A => BufferSelect::B,
            BufferSelect::B => BufferSelect::A,
        }
    }
}

/// Something that can show a [`ColorFrame`].
///
/// `present` should copy (or rasterize) `frame` into the given buffer of `layer` and make that
/// buffer visible. The frame is reused for the next cycle as soon as the call returns.
pub trait DisplaySink {
    type Error;

    fn present(
        &mut self,
        layer: Layer,
        buffer: BufferSelect,
        frame: &ColorFrame,
    ) -> Result<(), Self::Error>;
}

impl<S: DisplaySink + ?Sized> DisplaySink for &mut S {
    type Error = S::Error;

    fn present(
        &mut self,
        layer: Layer,
        buffer: BufferSelect,
        frame: &ColorFrame,
    ) -> Result<(), Self::Error> {
        (**self).present(layer, buffer, frame)
    }
}

/// A rendered grid of colors, plus how big each cell is on the display and the caption for it.
#[derive(Clone, Debug)]
pub struct ColorFrame {
    resolution: Resolution,
    tile_size: (usize, usize),
    cells: [Color; MAX_CELLS],
    caption: ArrayString<CAPTION_LENGTH>,
}

impl ColorFrame {
    pub fn new() -> Self {
        Self {
            resolution: Resolution::Native,
            tile_size: (0, 0),
            cells: [Color::TRANSPARENT; MAX_CELLS],
            caption: ArrayString::new(),
        }
    }

    /// Set up the frame for a new grid, returning the cells to fill in (row-major).
    pub fn prepare(
        &mut self,
        resolution: Resolution,
        tile_size: (usize, usize),
        caption: ArrayString<CAPTION_LENGTH>,
    ) -> &mut [Color] {
        self.resolution = resolution;
        self.tile_size = tile_size;
        self.caption = caption;
        &mut self.cells[..resolution.cells()]
    }

    /// Make every cell transparent, leaving only the caption.
    pub fn clear(&mut self, tile_size: (usize, usize), caption: ArrayString<CAPTION_LENGTH>) {
        self.prepare(Resolution::Native, tile_size, caption)
            .fill(Color::TRANSPARENT);
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// The size of one cell in display pixels, as (width, height).
    pub fn tile_size(&self) -> (usize, usize) {
        self.tile_size
    }

    /// The cells of the current grid, row-major.
    pub fn cells(&self) -> &[Color] {
        &self.cells[..self.resolution.cells()]
    }

    /// Panics if `x` or `y` are outside of the current grid.
    pub fn cell(&self, x: usize, y: usize) -> Color {
        let width = self.resolution.width();
        assert!(x < width && y < self.resolution.height());
        self.cells[y * width + x]
    }

    pub fn caption(&self) -> &str {
        self.caption.as_str()
    }

    /// Width and height in display pixels covered by the grid.
    pub fn covered_size(&self) -> (usize, usize) {
        (
            self.tile_size.0 * self.resolution.width(),
            self.tile_size.1 * self.resolution.height(),
        )
    }

    /// Paint the frame into a full-size framebuffer, `stride` pixels per row.
    ///
    /// Each cell becomes a solid tile, then a white box is drawn in the top left corner for the
    /// caption to go on. Pixels outside of the grid are left alone.
    pub fn rasterize(&self, destination: &mut [Color], stride: usize) -> Result<(), LibraryError> {
        let (covered_width, covered_height) = self.covered_size();
        let (tile_width, tile_height) = self.tile_size;
        let width = covered_width.max(CAPTION_BOX.0);
        let height = covered_height.max(CAPTION_BOX.1);
        if stride < width {
            return Err(LibraryError::InvalidDimensions(
                "Framebuffer stride is narrower than the frame",
            ));
        }
        if destination.len() < (height - 1) * stride + width {
            return Err(LibraryError::InvalidDimensions(
                "Framebuffer is too small for the frame",
            ));
        }
        if tile_width > 0 && tile_height > 0 {
            let grid_width = self.resolution.width();
            for (y, line) in destination
                .chunks_mut(stride)
                .take(covered_height)
                .enumerate()
            {
                let row = &self.cells()[(y / tile_height) * grid_width..][..grid_width];
                for (cell, tile) in row.iter().zip(line[..covered_width].chunks_mut(tile_width)) {
                    tile.fill(*cell);
                }
            }
        }
        for line in destination.chunks_mut(stride).take(CAPTION_BOX.1) {
            line[..CAPTION_BOX.0].fill(Color::WHITE);
        }
        Ok(())
    }
}

impl Default for ColorFrame {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks which of a layer's two buffers is being drawn and which is on screen.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DoubleBuffer {
    back: BufferSelect,
    visible: Option<BufferSelect>,
}

impl DoubleBuffer {
    pub const fn new() -> Self {
        Self {
            back: BufferSelect::A,
            visible: None,
        }
    }

    /// The buffer the next frame goes into.
    pub fn back(&self) -> BufferSelect {
        self.back
    }

    /// The buffer last handed to the display, if any.
    pub fn visible(&self) -> Option<BufferSelect> {
        self.visible
    }

    /// Hand `frame` to `sink` in the back buffer, then swap.
    ///
    /// If the sink fails nothing is swapped, so the next attempt reuses the same back buffer and
    /// the visible one stays untouched.
    pub fn present<S>(
        &mut self,
        sink: &mut S,
        layer: Layer,
        frame: &ColorFrame,
    ) -> Result<BufferSelect, S::Error>
    where
        S: DisplaySink + ?Sized,
    {
        let buffer = self.back;
        sink.present(layer, buffer, frame)?;
        self.visible = Some(buffer);
        self.back = buffer.other();
        Ok(buffer)
    }
}

impl Default for DoubleBuffer {
    fn default() -> Self {
        Self::new()
    }
}
