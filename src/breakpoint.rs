//! Keyboard level scaling of operators around a breakpoint note.

use strum::{Display, EnumIter, EnumString};

use crate::utils::{note_to_frequency, percentage_position};

// -------------------------------------------------------------------------------------------------

/// Transition curve of one side of a [`Breakpoint`].
///
/// Decreasing curves attenuate notes away from the breakpoint down to roughly 0.005, increasing
/// curves boost them up to 2.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum BreakpointCurve {
    LinearIncrease,
    #[default]
    LinearDecrease,
    SmoothIncrease,
    SmoothDecrease,
    ExponentialIncrease,
    ExponentialDecrease,
}

impl BreakpointCurve {
    const MIN_LEVEL: f64 = 0.005;
    const MAX_LEVEL: f64 = 2.0;

    /// Maps a ratio (1 at the breakpoint, 0 at the end of the scaling region) to a level
    /// multiplier in \[0, 2\].
    pub fn apply(self, ratio: f64) -> f64 {
        let ratio = ratio.clamp(0.0, 1.0);
        let smooth = ratio * ratio * (3.0 - 2.0 * ratio);
        let level = match self {
            Self::LinearDecrease => Self::MIN_LEVEL + (1.0 - Self::MIN_LEVEL) * ratio,
            Self::LinearIncrease => Self::MAX_LEVEL - (Self::MAX_LEVEL - 1.0) * ratio,
            Self::SmoothDecrease => Self::MIN_LEVEL + (1.0 - Self::MIN_LEVEL) * smooth,
            Self::SmoothIncrease => Self::MAX_LEVEL - (Self::MAX_LEVEL - 1.0) * smooth,
            Self::ExponentialDecrease => Self::MIN_LEVEL.powf(1.0 - ratio),
            Self::ExponentialIncrease => Self::MAX_LEVEL.powf(1.0 - ratio),
        };
        level.clamp(0.0, Self::MAX_LEVEL)
    }
}

// -------------------------------------------------------------------------------------------------

/// Keyboard scaling configuration of an operator.
///
/// Depths are given in keyboard positions (0-99) and define how far the scaling region extends
/// below and above the center note. A depth of 0 disables scaling on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakpointPreset {
    pub center_note: u8,
    pub left_depth: u8,
    pub right_depth: u8,
    pub left_curve: BreakpointCurve,
    pub right_curve: BreakpointCurve,
}

impl Default for BreakpointPreset {
    fn default() -> Self {
        Self {
            center_note: 60,
            left_depth: 0,
            right_depth: 0,
            left_curve: BreakpointCurve::default(),
            right_curve: BreakpointCurve::default(),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Calculates operator level multipliers from played note frequencies.
///
/// Evaluated once per note-on, not per sample.
#[derive(Debug, Clone)]
pub struct Breakpoint {
    preset: BreakpointPreset,
    center_frequency: f64,
    lower_bound: f64,
    upper_bound: f64,
}

impl Breakpoint {
    const MAX_DEPTH: u8 = 99;

    pub fn new(preset: BreakpointPreset) -> Self {
        let left_depth = preset.left_depth.min(Self::MAX_DEPTH);
        let right_depth = preset.right_depth.min(Self::MAX_DEPTH);
        let center_note = preset.center_note as f64;
        Self {
            preset: BreakpointPreset {
                left_depth,
                right_depth,
                ..preset
            },
            center_frequency: note_to_frequency(center_note),
            lower_bound: note_to_frequency(center_note - left_depth as f64),
            upper_bound: note_to_frequency(center_note + right_depth as f64),
        }
    }

    pub fn preset(&self) -> &BreakpointPreset {
        &self.preset
    }

    /// Frequency of the center note in Hz.
    pub fn center_frequency(&self) -> f64 {
        self.center_frequency
    }

    /// Level multiplier in \[0, 2\] for the given played frequency. Exactly 1 at the center
    /// frequency and on sides with zero depth.
    pub fn level_offset(&self, frequency: f64) -> f64 {
        if frequency < self.center_frequency {
            if self.preset.left_depth == 0 {
                return 1.0;
            }
            let ratio =
                percentage_position(self.lower_bound, self.center_frequency, frequency) / 100.0;
            self.preset.left_curve.apply(ratio)
        } else if frequency > self.center_frequency {
            if self.preset.right_depth == 0 {
                return 1.0;
            }
            let ratio = 1.0
                - percentage_position(self.center_frequency, self.upper_bound, frequency) / 100.0;
            self.preset.right_curve.apply(ratio)
        } else {
            1.0
        }
    }
}

impl Default for Breakpoint {
    fn default() -> Self {
        Self::new(BreakpointPreset::default())
    }
}

// -------------------------------------------------------------------------------------------------
