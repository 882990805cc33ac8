use std::f64::consts::PI;

use strum::{Display, EnumIter, EnumString};

// -------------------------------------------------------------------------------------------------

/// Available response types for the [`BiquadFilter`].
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, Display, EnumIter, EnumString)]
pub enum BiquadFilterType {
    #[default]
    Lowpass,
    Highpass,
    Bandpass,
    Notch,
}

// -------------------------------------------------------------------------------------------------

/// Normalized coefficients of a [`BiquadFilter`], calculated with the RBJ audio EQ cookbook
/// formulas.
///
/// Coefficients are recalculated with [`Self::set`] when the filter parameters change. Out of
/// range parameters are clamped into a playable range instead of being rejected: the cutoff to
/// \[[`Self::MIN_CUTOFF`], nyquist\) and Q to \[[`Self::MIN_Q`], [`Self::MAX_Q`]\].
#[derive(Debug, Clone, PartialEq)]
pub struct BiquadFilterCoefficients {
    filter_type: BiquadFilterType,
    sample_rate: u32,
    cutoff: f64,
    q: f64,
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadFilterCoefficients {
    pub const MIN_CUTOFF: f64 = 1.0;
    pub const MIN_Q: f64 = 0.01;
    pub const MAX_Q: f64 = 40.0;
    pub const DEFAULT_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;

    pub fn new(filter_type: BiquadFilterType, sample_rate: u32, cutoff: f64, q: f64) -> Self {
        let mut coefficients = Self::neutral();
        coefficients.set(filter_type, sample_rate, cutoff, q);
        coefficients
    }

    /// Pass-through coefficients: `b0 = 1`, all others zero.
    pub fn neutral() -> Self {
        Self {
            filter_type: BiquadFilterType::default(),
            sample_rate: 0,
            cutoff: 0.0,
            q: Self::DEFAULT_Q,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }

    /// The applied cutoff or center frequency in Hz, after clamping.
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// The applied resonance (Q factor), after clamping.
    pub fn q(&self) -> f64 {
        self.q
    }

    /// Sets and applies a batch of new filter parameters.
    pub fn set(&mut self, filter_type: BiquadFilterType, sample_rate: u32, cutoff: f64, q: f64) {
        self.filter_type = filter_type;
        self.sample_rate = sample_rate;
        self.cutoff = cutoff;
        self.q = q;
        self.apply();
    }

    /// Clamps parameters and recalculates the normalized coefficients.
    fn apply(&mut self) {
        self.sample_rate = self.sample_rate.max(1);
        let nyquist = self.sample_rate as f64 / 2.0;
        let max_cutoff = (nyquist * 0.999).max(Self::MIN_CUTOFF);
        if !(Self::MIN_CUTOFF..=max_cutoff).contains(&self.cutoff) {
            log::warn!(
                "Biquad cutoff {} Hz is out of range, clamping to [{}, {}]",
                self.cutoff,
                Self::MIN_CUTOFF,
                max_cutoff
            );
            self.cutoff = self.cutoff.clamp(Self::MIN_CUTOFF, max_cutoff);
        }
        if !(Self::MIN_Q..=Self::MAX_Q).contains(&self.q) {
            log::warn!(
                "Biquad Q {} is out of range, clamping to [{}, {}]",
                self.q,
                Self::MIN_Q,
                Self::MAX_Q
            );
            self.q = if self.q.is_nan() {
                Self::DEFAULT_Q
            } else {
                self.q.clamp(Self::MIN_Q, Self::MAX_Q)
            };
        }

        let omega = 2.0 * PI * self.cutoff / self.sample_rate as f64;
        let (sin_omega, cos_omega) = omega.sin_cos();
        let alpha = sin_omega / (2.0 * self.q);

        let (b0, b1, b2) = match self.filter_type {
            BiquadFilterType::Lowpass => {
                let b1 = 1.0 - cos_omega;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            BiquadFilterType::Highpass => {
                let b1 = -(1.0 + cos_omega);
                (-b1 / 2.0, b1, -b1 / 2.0)
            }
            BiquadFilterType::Bandpass => (alpha, 0.0, -alpha),
            BiquadFilterType::Notch => (1.0, -2.0 * cos_omega, 1.0),
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
    }
}

impl Default for BiquadFilterCoefficients {
    fn default() -> Self {
        Self::neutral()
    }
}

// -------------------------------------------------------------------------------------------------

/// Second order IIR filter in direct form I.
///
/// `y = b0·x0 + b1·x1 + b2·x2 − a1·y1 − a2·y2` with two input and two output history cells.
/// Coefficients are passed in from an external [`BiquadFilterCoefficients`].
#[derive(Debug, Default, Clone)]
pub struct BiquadFilter {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadFilter {
    pub fn new() -> Self {
        Self {
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Apply the filter on a single sample.
    #[inline]
    pub fn process_sample(&mut self, coefficients: &BiquadFilterCoefficients, input: f64) -> f64 {
        let output = coefficients.b0 * input + coefficients.b1 * self.x1 + coefficients.b2 * self.x2
            - coefficients.a1 * self.y1
            - coefficients.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }

    /// Reset the filter's history.
    #[inline]
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

// -------------------------------------------------------------------------------------------------
