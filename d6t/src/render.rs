// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! The render loop.
//!
//! [`Thermograph`] owns everything that has to survive from one cycle to the next: the
//! [`Sequencer`], the [`DoubleBuffer`] state, and the working buffers for the normalized and
//! resampled grids. A typical loop looks like:
//!
//! ```no_run
//! # use d6t::{D6t44l, Thermograph, ThermographConfig};
//! # use d6t::display::{BufferSelect, ColorFrame, DisplaySink, Layer};
//! # struct Screen;
//! # impl DisplaySink for Screen {
//! #     type Error = core::convert::Infallible;
//! #     fn present(&mut self, _: Layer, _: BufferSelect, _: &ColorFrame) -> Result<(), Self::Error> {
//! #         Ok(())
//! #     }
//! # }
//! # let mut screen = Screen;
//! use linux_embedded_hal::{Delay, I2cdev};
//!
//! let bus = I2cdev::new("/dev/i2c-1")?;
//! let mut delay = Delay;
//! let mut sensor = D6t44l::new(bus);
//! sensor.setup(&mut delay);
//! let mut thermograph = Thermograph::new(ThermographConfig::default())?;
//! loop {
//!     thermograph.step(&mut sensor, &mut delay, &mut screen)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c;
use log::trace;

use crate::color::{map_color, TemperatureWindow};
use crate::display::{ColorFrame, DisplaySink, DoubleBuffer, Layer};
use crate::driver::{D6t44l, RetryPolicy};
use crate::error::{LibraryError, RenderError, StepError};
use crate::frame::{ThermalFrame, PIXEL_COUNT};
use crate::interpolate::{upscale, Resolution, MAX_CELLS};
use crate::sequencer::{Scene, Sequencer};

/// Settings for a [`Thermograph`].
///
/// The defaults describe a VGA display, showing each phase for 2 seconds at 5 frames per
/// second.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ThermographConfig {
    /// Width of the display, in pixels.
    pub display_width: usize,

    /// Height of the display, in pixels.
    pub display_height: usize,

    /// Render cycles per base dwell period (see [`crate::sequencer`]).
    pub base_dwell: u16,

    /// Tenths of a degree below the PTAT where the color scale starts.
    pub margin_below: u16,

    /// Tenths of a degree above the PTAT where the color scale ends.
    pub margin_above: u16,

    /// How long [`Thermograph::step`] waits after presenting a frame.
    pub phase_delay_ms: u32,

    /// How sensor reads are retried in [`Thermograph::step`].
    pub retry: RetryPolicy,
}

impl Default for ThermographConfig {
    fn default() -> Self {
        Self {
            display_width: 640,
            display_height: 480,
            base_dwell: Sequencer::DEFAULT_BASE_DWELL,
            margin_below: TemperatureWindow::MARGIN_BELOW,
            margin_above: TemperatureWindow::MARGIN_ABOVE,
            phase_delay_ms: 200,
            retry: RetryPolicy::default(),
        }
    }
}

/// The state of the demo renderer.
#[derive(Clone, Debug)]
pub struct Thermograph {
    config: ThermographConfig,
    sequencer: Sequencer,
    double_buffer: DoubleBuffer,

    /// The latest frame, normalized to `[0, 1]`.
    normalized: [f32; PIXEL_COUNT],

    /// The resampled grid, only the first `Resolution::cells()` entries are meaningful.
    resampled: [f32; MAX_CELLS],

    color_frame: ColorFrame,
}

impl Thermograph {
    pub fn new(config: ThermographConfig) -> Result<Self, LibraryError> {
        let largest = Resolution::OneSixty;
        if config.display_width < largest.width() || config.display_height < largest.height() {
            return Err(LibraryError::InvalidDimensions(
                "The display must be at least 160x120 pixels",
            ));
        }
        Ok(Self {
            config,
            sequencer: Sequencer::new(config.base_dwell)?,
            double_buffer: DoubleBuffer::new(),
            normalized: [0f32; PIXEL_COUNT],
            resampled: [0f32; MAX_CELLS],
            color_frame: ColorFrame::new(),
        })
    }

    pub fn config(&self) -> &ThermographConfig {
        &self.config
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn double_buffer(&self) -> &DoubleBuffer {
        &self.double_buffer
    }

    /// The most recently rendered frame.
    pub fn color_frame(&self) -> &ColorFrame {
        &self.color_frame
    }

    /// The most recent sensor reading, normalized to the color window around its PTAT.
    pub fn normalized(&self) -> &[f32; PIXEL_COUNT] {
        &self.normalized
    }

    /// Start the sequence over from the first phase.
    pub fn reset(&mut self) {
        self.sequencer.reset();
    }

    /// Render `frame` for the current phase, present it, then advance the sequencer.
    ///
    /// If the sink rejects the frame the sequencer stays where it is.
    pub fn render<S>(
        &mut self,
        frame: &ThermalFrame,
        sink: &mut S,
    ) -> Result<Scene, RenderError<S::Error>>
    where
        S: DisplaySink + ?Sized,
    {
        let reference = frame.reference_temperature();
        let window = TemperatureWindow::with_margins(
            reference,
            self.config.margin_below,
            self.config.margin_above,
        );
        for (normalized, pixel) in self.normalized.iter_mut().zip(frame.pixels().iter()) {
            *normalized = window.normalize(*pixel);
        }

        let scene = self.sequencer.scene();
        let caption = scene.caption(reference);
        let (width, height) = (self.config.display_width, self.config.display_height);
        match scene {
            Scene::Thermograph { resolution, alpha } => {
                upscale(&self.normalized, resolution, &mut self.resampled)?;
                let cells = self.color_frame.prepare(
                    resolution,
                    resolution.tile_size(width, height),
                    caption,
                );
                for (cell, value) in cells.iter_mut().zip(self.resampled.iter()) {
                    *cell = map_color(alpha, *value);
                }
            }
            Scene::Off => self
                .color_frame
                .clear(Resolution::Native.tile_size(width, height), caption),
        }

        let buffer = self
            .double_buffer
            .present(sink, Layer::Thermograph, &self.color_frame)
            .map_err(RenderError::Display)?;
        trace!("Presented {:?} in buffer {:?}", scene, buffer);
        self.sequencer.advance();
        Ok(scene)
    }

    /// One full cycle: read the sensor (retrying as configured), render, then wait out the phase
    /// delay.
    pub fn step<I2C, D, S>(
        &mut self,
        sensor: &mut D6t44l<I2C>,
        delay: &mut D,
        sink: &mut S,
    ) -> Result<Scene, StepError<I2C, S::Error>>
    where
        I2C: i2c::WriteRead,
        D: DelayMs<u32>,
        S: DisplaySink + ?Sized,
    {
        let frame = sensor
            .read_frame_blocking(delay, &self.config.retry)
            .map_err(StepError::Sensor)?;
        let scene = self.render(&frame, sink).map_err(StepError::Render)?;
        delay.delay_ms(self.config.phase_delay_ms);
        Ok(scene)
    }
}

#[cfg(test)]
mod test {
    extern crate std;

    use std::boxed::Box;
    use std::vec::Vec;

    use d6t_test_data::{
        sensor_at_address, uniform_frame, MockDelay, MockSensorBus, DEFAULT_ADDRESS,
    };
    use float_cmp::assert_approx_eq;

    use super::{Thermograph, ThermographConfig};
    use crate::color::{Alpha, Color};
    use crate::display::test::{RecordingSink, SinkFailed};
    use crate::display::{BufferSelect, Layer};
    use crate::driver::D6t44l;
    use crate::error::{LibraryError, RenderError, StepError};
    use crate::frame::ThermalFrame;
    use crate::interpolate::Resolution;
    use crate::sequencer::{Phase, Scene};

    fn new_thermograph(config: ThermographConfig) -> Box<Thermograph> {
        Box::new(Thermograph::new(config).unwrap())
    }

    #[test]
    fn hot_pixels_are_red() {
        let mut thermograph = new_thermograph(ThermographConfig::default());
        let mut sink = RecordingSink::default();
        let frame = ThermalFrame::new(100, [150; 16]);
        let scene = thermograph.render(&frame, &mut sink).unwrap();
        assert_eq!(
            scene,
            Scene::Thermograph {
                resolution: Resolution::Native,
                alpha: Alpha::MAX
            }
        );
        assert!(thermograph.normalized().iter().all(|v| *v == 1.0));
        assert_eq!(sink.last_cells.len(), 16);
        assert!(sink.last_cells.iter().all(|c| c.raw() == 0x00FF));
        assert_eq!(sink.last_caption, "PTAT[10.0]   4*4  ");
        assert_eq!(
            sink.presented,
            [(Layer::Thermograph, BufferSelect::A)].to_vec()
        );
        assert_eq!(thermograph.color_frame().tile_size(), (160, 120));
    }

    #[test]
    fn normalized_window() {
        let mut thermograph = new_thermograph(ThermographConfig::default());
        let mut sink = RecordingSink::default();
        let mut pixels = [75i16; 16];
        pixels[0] = 30;
        pixels[1] = -300;
        thermograph
            .render(&ThermalFrame::new(100, pixels), &mut sink)
            .unwrap();
        assert_eq!(thermograph.normalized()[0], 0.0);
        assert_eq!(thermograph.normalized()[1], 0.0);
        assert_approx_eq!(f32, thermograph.normalized()[2], 0.5);
        assert_eq!(sink.last_cells[0], Color::new(0, 0, 0xF, Alpha::MAX));

        // Wider margins move the midpoint
        let mut thermograph = new_thermograph(ThermographConfig {
            margin_below: 25,
            margin_above: 25,
            ..ThermographConfig::default()
        });
        thermograph
            .render(&ThermalFrame::new(100, [100; 16]), &mut sink)
            .unwrap();
        assert!(thermograph
            .normalized()
            .iter()
            .all(|v| (*v - 0.5).abs() < 1e-6));
    }

    #[test]
    fn full_cycle() {
        let mocked = MockSensorBus::new(DEFAULT_ADDRESS, &uniform_frame(DEFAULT_ADDRESS, 200, 210));
        let mut sensor = D6t44l::new(mocked);
        let mut delay = MockDelay::new();
        let mut sink = RecordingSink::default();
        let mut thermograph = new_thermograph(ThermographConfig::default());
        let cycle_length = thermograph.sequencer().cycle_length();
        let mut scenes = Vec::new();
        for _ in 0..cycle_length {
            scenes.push(
                thermograph
                    .step(&mut sensor, &mut delay, &mut sink)
                    .unwrap(),
            );
        }
        assert_eq!(scenes.len(), 190);
        assert_eq!(sink.presented.len(), 190);
        for pair in sink.presented.windows(2) {
            assert_ne!(pair[0].1, pair[1].1);
        }
        assert_eq!(delay.calls(), 190);
        assert_eq!(delay.total_ms(), 190 * 200);
        assert_eq!(scenes[0], Phase::Native.scene());
        assert_eq!(scenes[19], Phase::Native.scene());
        assert_eq!(scenes[20], Phase::Eight.scene());
        assert_eq!(scenes[50], Phase::SixtyFour.scene());
        assert_eq!(scenes[60], Phase::Headline.scene());
        assert_eq!(scenes[89], Phase::Headline.scene());
        assert_eq!(scenes[90], Phase::FadeHigh.scene());
        assert_eq!(scenes[110], Phase::FadeDefault.scene());
        assert_eq!(scenes[179], Phase::DimNative.scene());
        assert_eq!(scenes[180], Scene::Off);
        assert_eq!(scenes[189], Scene::Off);
        // The last frame was the blank one
        assert_eq!(sink.last_caption, "off");
        assert!(sink.last_cells.iter().all(|c| *c == Color::TRANSPARENT));
        // And the sequence starts over
        assert_eq!(thermograph.sequencer().phase(), Phase::Native);
        assert_eq!(thermograph.sequencer().sub_phase(), 0);
    }

    #[test]
    fn resampled_frames() {
        let mut thermograph = new_thermograph(ThermographConfig {
            base_dwell: 1,
            ..ThermographConfig::default()
        });
        let mut sink = RecordingSink::default();
        let frame = ThermalFrame::new(100, [150; 16]);
        // Two cycles of the native grid, then 8×8
        thermograph.render(&frame, &mut sink).unwrap();
        thermograph.render(&frame, &mut sink).unwrap();
        thermograph.render(&frame, &mut sink).unwrap();
        assert_eq!(sink.last_resolution, Some(Resolution::Eight));
        assert_eq!(sink.last_cells.len(), 64);
        assert_eq!(sink.last_caption, "PTAT[10.0]   8*8  ");
        assert_eq!(thermograph.color_frame().tile_size(), (80, 60));
        // Skip ahead to the second step of the fade-out
        for _ in 0..8 {
            thermograph.render(&frame, &mut sink).unwrap();
        }
        assert_eq!(sink.last_resolution, Some(Resolution::OneSixty));
        assert_eq!(sink.last_cells.len(), 160 * 120);
        assert!(sink
            .last_cells
            .iter()
            .all(|c| *c == Color::new(0xF, 0, 0, Alpha::SWITCH_LOW)));
    }

    #[test]
    fn step_retries_sensor() {
        let mocked = sensor_at_address(DEFAULT_ADDRESS);
        let mut sensor = D6t44l::new(mocked.clone());
        let mut delay = MockDelay::new();
        let mut sink = RecordingSink::default();
        let mut thermograph = new_thermograph(ThermographConfig::default());
        mocked.fail_next(2);
        thermograph
            .step(&mut sensor, &mut delay, &mut sink)
            .unwrap();
        assert_eq!(mocked.recent_operations().len(), 3);
        assert_eq!(delay.total_ms(), 2 * 10 + 200);
        assert_eq!(sink.presented.len(), 1);
    }

    #[test]
    fn step_sensor_failure() {
        let mocked = sensor_at_address(DEFAULT_ADDRESS);
        let mut sensor = D6t44l::new(mocked.clone());
        let mut delay = MockDelay::new();
        let mut sink = RecordingSink::default();
        let mut thermograph = new_thermograph(ThermographConfig {
            retry: crate::driver::RetryPolicy::bounded(10, core::num::NonZeroU32::new(2).unwrap()),
            ..ThermographConfig::default()
        });
        mocked.set_always_fail(true);
        let result = thermograph.step(&mut sensor, &mut delay, &mut sink);
        assert!(matches!(result, Err(StepError::Sensor(_))));
        assert!(sink.presented.is_empty());
        assert_eq!(thermograph.sequencer().sub_phase(), 0);
    }

    #[test]
    fn sink_failure_keeps_state() {
        let mut thermograph = new_thermograph(ThermographConfig::default());
        let mut sink = RecordingSink::default();
        let frame = ThermalFrame::new(100, [150; 16]);
        thermograph.render(&frame, &mut sink).unwrap();
        let sequencer = *thermograph.sequencer();
        let double_buffer = *thermograph.double_buffer();
        sink.fail_next = true;
        assert!(matches!(
            thermograph.render(&frame, &mut sink),
            Err(RenderError::Display(SinkFailed))
        ));
        assert_eq!(*thermograph.sequencer(), sequencer);
        assert_eq!(*thermograph.double_buffer(), double_buffer);
        thermograph.render(&frame, &mut sink).unwrap();
        assert_eq!(
            sink.presented.iter().map(|(_, b)| *b).collect::<Vec<_>>(),
            [BufferSelect::A, BufferSelect::B].to_vec()
        );
    }

    #[test]
    fn reset() {
        let mut thermograph = new_thermograph(ThermographConfig {
            base_dwell: 1,
            ..ThermographConfig::default()
        });
        let mut sink = RecordingSink::default();
        let frame = ThermalFrame::new(100, [150; 16]);
        for _ in 0..5 {
            thermograph.render(&frame, &mut sink).unwrap();
        }
        assert_ne!(thermograph.sequencer().phase(), Phase::Native);
        thermograph.reset();
        assert_eq!(thermograph.sequencer().phase(), Phase::Native);
        assert_eq!(
            thermograph.render(&frame, &mut sink).unwrap(),
            Phase::Native.scene()
        );
    }

    #[test]
    fn invalid_config() {
        assert!(matches!(
            Thermograph::new(ThermographConfig {
                base_dwell: 0,
                ..ThermographConfig::default()
            }),
            Err(LibraryError::InvalidDwell)
        ));
        assert!(matches!(
            Thermograph::new(ThermographConfig {
                display_width: 100,
                ..ThermographConfig::default()
            }),
            Err(LibraryError::InvalidDimensions(_))
        ));
    }
}
