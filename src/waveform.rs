//! Operator waveforms.
//!
//! All waveforms are evaluated statelessly from an integer time index, so a single operator
//! node can serve any number of voices without keeping phase accumulators.

use std::f64::consts::{FRAC_2_PI, PI, TAU};

use strum::{Display, EnumIter, EnumString, FromRepr};

// -------------------------------------------------------------------------------------------------

/// Waveform kind of an operator.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, Display, EnumIter, EnumString, FromRepr,
)]
#[repr(u8)]
pub enum Waveform {
    #[default]
    Sine = 0,
    Square = 1,
    Triangle = 2,
    Sawtooth = 3,
    WhiteNoise = 4,
    /// Produces silence. Unknown waveform indices from external preset sources map to this.
    Silent = 255,
}

impl Waveform {
    /// Maps a raw preset waveform index to a waveform. Unknown indices yield [`Waveform::Silent`].
    pub fn from_index(index: u8) -> Self {
        match Self::from_repr(index) {
            Some(waveform) => waveform,
            None => {
                log::warn!("Unknown waveform index {index}, using silence");
                Self::Silent
            }
        }
    }

    /// Generate a single sample in approximately \[-1, 1\].
    ///
    /// - `rate`: phase increment per sample in cycles (frequency / sample rate).
    /// - `modulation`: accumulated phase modulation in radians.
    /// - `phase`: additional phase offset in radians.
    /// - `time`: integer sample time index.
    #[inline]
    pub fn generate(self, rate: f64, modulation: f64, phase: f64, time: u64) -> f64 {
        let t = time as f64;
        match self {
            Self::Sine => sine(rate, modulation, phase, t),
            Self::Square => {
                let value = sine(rate, modulation, phase, t);
                if value > 0.0 {
                    1.0
                } else if value < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            }
            Self::Triangle => FRAC_2_PI * sine(rate, modulation, phase, t).asin(),
            Self::Sawtooth => {
                let cotangent = 1.0 / (PI * t * rate + modulation + phase).tan();
                -FRAC_2_PI * cotangent.atan()
            }
            Self::WhiteNoise => rand::random_range(-1.0..=1.0),
            Self::Silent => 0.0,
        }
    }
}

#[inline(always)]
fn sine(rate: f64, modulation: f64, phase: f64, t: f64) -> f64 {
    (TAU * rate * t + modulation + phase).sin()
}

// -------------------------------------------------------------------------------------------------
