// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! The demo sequence.
//!
//! The renderer steps through a fixed loop of [`Phase`]s: the raw 4×4 grid, increasingly fine
//! interpolations at full opacity, a fade-out of the finest grid, the same interpolations in
//! reverse while faded, and finally a blank screen before starting over. Each phase is shown for
//! a multiple of a base dwell count of render cycles.
//!
//! | Phase | Grid    | Alpha  | Dwell |
//! |-------|---------|--------|-------|
//! | 0     | 4×4     | `0x0F` | 2     |
//! | 1–4   | 8×8 → 64×60 | `0x0F` | 1 |
//! | 5     | 160×120 | `0x0F` | 3     |
//! | 6–8   | 160×120 | `0x0A`, `0x06`, `0x03` | 1 |
//! | 9–12  | 64×60 → 8×8 | `0x03` | 1 |
//! | 13    | 4×4     | `0x03` | 2     |
//! | 14    | off     |        | 1     |

use core::fmt::{self, Write};

use arrayvec::ArrayString;
use log::debug;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::color::Alpha;
use crate::error::LibraryError;
use crate::interpolate::Resolution;

/// Maximum length of a [`Scene::caption`].
pub const CAPTION_LENGTH: usize = 32;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Phase {
    Native = 0,
    Eight = 1,
    Sixteen = 2,
    ThirtyTwo = 3,
    SixtyFour = 4,
    Headline = 5,
    FadeHigh = 6,
    FadeLow = 7,
    FadeDefault = 8,
    DimSixtyFour = 9,
    DimThirtyTwo = 10,
    DimSixteen = 11,
    DimEight = 12,
    DimNative = 13,
    Off = 14,
}

impl Phase {
    /// Every phase, in order.
    pub const ALL: [Phase; 15] = [
        Phase::Native,
        Phase::Eight,
        Phase::Sixteen,
        Phase::ThirtyTwo,
        Phase::SixtyFour,
        Phase::Headline,
        Phase::FadeHigh,
        Phase::FadeLow,
        Phase::FadeDefault,
        Phase::DimSixtyFour,
        Phase::DimThirtyTwo,
        Phase::DimSixteen,
        Phase::DimEight,
        Phase::DimNative,
        Phase::Off,
    ];

    /// What to show during this phase.
    pub const fn scene(self) -> Scene {
        let (resolution, alpha) = match self {
            Phase::Native => (Resolution::Native, Alpha::MAX),
            Phase::Eight => (Resolution::Eight, Alpha::MAX),
            Phase::Sixteen => (Resolution::Sixteen, Alpha::MAX),
            Phase::ThirtyTwo => (Resolution::ThirtyTwo, Alpha::MAX),
            Phase::SixtyFour => (Resolution::SixtyFour, Alpha::MAX),
            Phase::Headline => (Resolution::OneSixty, Alpha::MAX),
            Phase::FadeHigh => (Resolution::OneSixty, Alpha::SWITCH_HIGH),
            Phase::FadeLow => (Resolution::OneSixty, Alpha::SWITCH_LOW),
            Phase::FadeDefault => (Resolution::OneSixty, Alpha::DEFAULT),
            Phase::DimSixtyFour => (Resolution::SixtyFour, Alpha::DEFAULT),
            Phase::DimThirtyTwo => (Resolution::ThirtyTwo, Alpha::DEFAULT),
            Phase::DimSixteen => (Resolution::Sixteen, Alpha::DEFAULT),
            Phase::DimEight => (Resolution::Eight, Alpha::DEFAULT),
            Phase::DimNative => (Resolution::Native, Alpha::DEFAULT),
            Phase::Off => return Scene::Off,
        };
        Scene::Thermograph { resolution, alpha }
    }

    /// How many base dwell periods this phase lasts.
    pub const fn dwell_multiplier(self) -> u32 {
        match self {
            Phase::Native | Phase::DimNative => 2,
            Phase::Headline => 3,
            _ => 1,
        }
    }

    /// The phase after this one, wrapping from [`Phase::Off`] back to [`Phase::Native`].
    pub fn next(self) -> Phase {
        let index = u8::from(self) + 1;
        Phase::try_from_primitive(index).unwrap_or(Phase::Native)
    }
}

/// The output of the sequencer: what the current render cycle should draw.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Scene {
    /// Draw the thermal grid at `resolution`, with every cell at `alpha`.
    Thermograph { resolution: Resolution, alpha: Alpha },

    /// Blank the display.
    Off,
}

impl Scene {
    /// The label shown in the corner of the display.
    ///
    /// `reference` is the sensor's PTAT reading in tenths of a degree.
    pub fn caption(&self, reference: i16) -> ArrayString<CAPTION_LENGTH> {
        let mut caption = ArrayString::new();
        // The longest caption ("PTAT[-3276.8] 160*120") is well under CAPTION_LENGTH.
        let _ = self.write_caption(&mut caption, reference);
        caption
    }

    fn write_caption<W: Write>(&self, out: &mut W, reference: i16) -> fmt::Result {
        match self {
            Scene::Thermograph { resolution, .. } => write!(
                out,
                "PTAT[{:.1}] {:^7}",
                f32::from(reference) / 10.0,
                resolution
            ),
            Scene::Off => out.write_str("off"),
        }
    }
}

/// Cyclic state machine picking the [`Scene`] for each render cycle.
///
/// The scene only depends on the current phase; the sub-phase counts render cycles within the
/// phase and never reaches the phase's dwell limit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Sequencer {
    phase: Phase,
    sub_phase: u32,
    base_dwell: u16,
}

impl Sequencer {
    /// Render cycles per base dwell period, 2 seconds at the default 200ms cadence.
    pub const DEFAULT_BASE_DWELL: u16 = 10;

    pub fn new(base_dwell: u16) -> Result<Self, LibraryError> {
        if base_dwell == 0 {
            Err(LibraryError::InvalidDwell)
        } else {
            Ok(Self {
                phase: Phase::Native,
                sub_phase: 0,
                base_dwell,
            })
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn sub_phase(&self) -> u32 {
        self.sub_phase
    }

    pub fn base_dwell(&self) -> u16 {
        self.base_dwell
    }

    pub fn scene(&self) -> Scene {
        self.phase.scene()
    }

    /// Number of cycles the current phase lasts.
    pub fn dwell_limit(&self) -> u32 {
        u32::from(self.base_dwell) * self.phase.dwell_multiplier()
    }

    /// Number of cycles for one trip through every phase.
    pub fn cycle_length(&self) -> u32 {
        Phase::ALL
            .iter()
            .map(|phase| u32::from(self.base_dwell) * phase.dwell_multiplier())
            .sum()
    }

    /// Count one render cycle. Returns `true` if that moved the sequencer to a new phase.
    pub fn advance(&mut self) -> bool {
        self.sub_phase += 1;
        if self.sub_phase >= self.dwell_limit() {
            self.sub_phase = 0;
            self.phase = self.phase.next();
            debug!("Entering phase {:?}", self.phase);
            true
        } else {
            false
        }
    }

    /// Go back to the start of the sequence.
    pub fn reset(&mut self) {
        self.phase = Phase::Native;
        self.sub_phase = 0;
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self {
            phase: Phase::Native,
            sub_phase: 0,
            base_dwell: Self::DEFAULT_BASE_DWELL,
        }
    }
}

#[cfg(test)]
mod test {
    use core::convert::TryFrom;

    use super::{Phase, Scene, Sequencer};
    use crate::color::Alpha;
    use crate::error::LibraryError;
    use crate::interpolate::Resolution;

    #[test]
    fn first_transition() {
        for base_dwell in [1u16, 3, 10] {
            let mut sequencer = Sequencer::new(base_dwell).unwrap();
            for _ in 0..(2 * base_dwell - 1) {
                assert!(!sequencer.advance());
                assert_eq!(sequencer.phase(), Phase::Native);
            }
            assert!(sequencer.advance());
            assert_eq!(sequencer.phase(), Phase::Eight);
            assert_eq!(sequencer.sub_phase(), 0);
        }
    }

    #[test]
    fn full_cycle_closure() {
        let mut sequencer = Sequencer::default();
        let cycle_length = sequencer.cycle_length();
        assert_eq!(cycle_length, 190);
        for step in 1..=cycle_length {
            sequencer.advance();
            assert!(sequencer.sub_phase() < sequencer.dwell_limit());
            if step < cycle_length {
                assert!(
                    !(sequencer.phase() == Phase::Native && sequencer.sub_phase() == 0),
                    "Returned to the start early, after {} steps",
                    step
                );
            }
        }
        assert_eq!(sequencer.phase(), Phase::Native);
        assert_eq!(sequencer.sub_phase(), 0);
    }

    #[test]
    fn visits_every_phase_in_order() {
        let mut sequencer = Sequencer::new(2).unwrap();
        let mut seen = [0u32; 15];
        let mut last = u8::from(sequencer.phase());
        for _ in 0..sequencer.cycle_length() {
            seen[usize::from(u8::from(sequencer.phase()))] += 1;
            sequencer.advance();
            let current = u8::from(sequencer.phase());
            assert!(current == last || current == (last + 1) % 15);
            last = current;
        }
        for (index, count) in seen.iter().enumerate() {
            let phase = Phase::try_from(index as u8).unwrap();
            assert_eq!(*count, 2 * phase.dwell_multiplier(), "{:?}", phase);
        }
    }

    #[test]
    fn scene_table() {
        let expected = [
            (Resolution::Native, Alpha::MAX),
            (Resolution::Eight, Alpha::MAX),
            (Resolution::Sixteen, Alpha::MAX),
            (Resolution::ThirtyTwo, Alpha::MAX),
            (Resolution::SixtyFour, Alpha::MAX),
            (Resolution::OneSixty, Alpha::MAX),
            (Resolution::OneSixty, Alpha::SWITCH_HIGH),
            (Resolution::OneSixty, Alpha::SWITCH_LOW),
            (Resolution::OneSixty, Alpha::DEFAULT),
            (Resolution::SixtyFour, Alpha::DEFAULT),
            (Resolution::ThirtyTwo, Alpha::DEFAULT),
            (Resolution::Sixteen, Alpha::DEFAULT),
            (Resolution::Eight, Alpha::DEFAULT),
            (Resolution::Native, Alpha::DEFAULT),
        ];
        for (phase, (resolution, alpha)) in Phase::ALL.iter().zip(expected.iter()) {
            assert_eq!(
                phase.scene(),
                Scene::Thermograph {
                    resolution: *resolution,
                    alpha: *alpha
                }
            );
        }
        assert_eq!(Phase::Off.scene(), Scene::Off);
    }

    #[test]
    fn phase_conversion() {
        assert_eq!(Phase::try_from(14u8).ok(), Some(Phase::Off));
        assert!(Phase::try_from(15u8).is_err());
        assert_eq!(Phase::Off.next(), Phase::Native);
        assert_eq!(Phase::DimNative.next(), Phase::Off);
    }

    #[test]
    fn zero_dwell_rejected() {
        assert_eq!(Sequencer::new(0), Err(LibraryError::InvalidDwell));
    }

    #[test]
    fn reset() {
        let mut sequencer = Sequencer::new(1).unwrap();
        for _ in 0..7 {
            sequencer.advance();
        }
        assert_ne!(sequencer.phase(), Phase::Native);
        sequencer.reset();
        assert_eq!(sequencer, Sequencer::new(1).unwrap());
    }

    #[test]
    fn captions() {
        assert_eq!(
            Phase::Headline.scene().caption(245).as_str(),
            "PTAT[24.5] 160*120"
        );
        assert_eq!(Phase::Native.scene().caption(-15).as_str(), "PTAT[-1.5]   4*4  ");
        assert_eq!(Phase::Sixteen.scene().caption(0).as_str(), "PTAT[0.0]  16*16 ");
        assert_eq!(Phase::DimSixtyFour.scene().caption(0).as_str(), "PTAT[0.0]  64*60 ");
        assert_eq!(Phase::Off.scene().caption(245).as_str(), "off");
        assert_eq!(
            Phase::Native.scene().caption(i16::MIN).as_str(),
            "PTAT[-3276.8]   4*4  "
        );
    }
}
