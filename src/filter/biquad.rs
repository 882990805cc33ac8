use four_cc::FourCC;

use crate::{
    filter::{Filter, FilterId},
    parameter::{FloatParameter, FloatParameterValue, Parameter},
    utils::{
        dsp::filters::biquad::{
            BiquadFilter as BiquadFilterState, BiquadFilterCoefficients, BiquadFilterType,
        },
        unique_usize_id,
    },
    Error,
};

// -------------------------------------------------------------------------------------------------

/// Second order low-pass, high-pass, band-pass or notch filter.
#[derive(Debug)]
pub struct BiquadFilter {
    id: FilterId,
    filter_type: BiquadFilterType,
    sample_rate: u32,
    cutoff: FloatParameterValue,
    q: FloatParameterValue,
    coefficients: BiquadFilterCoefficients,
    state: BiquadFilterState,
}

impl BiquadFilter {
    pub const FILTER_NAME: &str = "BiquadFilter";
    pub const CUTOFF_ID: FourCC = FourCC(*b"freq");
    pub const Q_ID: FourCC = FourCC(*b"reso");

    const CUTOFF: FloatParameter =
        FloatParameter::new(Self::CUTOFF_ID, "Cutoff", 1.0..=22000.0, 1000.0).with_unit("Hz");
    const Q: FloatParameter = FloatParameter::new(
        Self::Q_ID,
        "Q",
        BiquadFilterCoefficients::MIN_Q..=BiquadFilterCoefficients::MAX_Q,
        BiquadFilterCoefficients::DEFAULT_Q,
    );

    /// Create a new filter. The cutoff (or center frequency) is given in Hz and gets clamped
    /// below nyquist, Q is clamped to \[0.01, 40\].
    pub fn new(filter_type: BiquadFilterType, sample_rate: u32, cutoff: f64, q: f64) -> Self {
        let mut filter = Self::neutral(sample_rate);
        filter.filter_type = filter_type;
        filter.cutoff.set_value_clamped(cutoff);
        filter.q.set_value_clamped(q);
        filter.update_coefficients();
        filter
    }

    pub fn lowpass(sample_rate: u32, cutoff: f64, q: f64) -> Self {
        Self::new(BiquadFilterType::Lowpass, sample_rate, cutoff, q)
    }

    pub fn highpass(sample_rate: u32, cutoff: f64, q: f64) -> Self {
        Self::new(BiquadFilterType::Highpass, sample_rate, cutoff, q)
    }

    pub fn bandpass(sample_rate: u32, center: f64, q: f64) -> Self {
        Self::new(BiquadFilterType::Bandpass, sample_rate, center, q)
    }

    pub fn notch(sample_rate: u32, center: f64, q: f64) -> Self {
        Self::new(BiquadFilterType::Notch, sample_rate, center, q)
    }

    /// A pass-through filter with neutral coefficients. Turns into a low-pass filter as soon
    /// as one of its parameters is set.
    pub fn neutral(sample_rate: u32) -> Self {
        Self {
            id: unique_usize_id(),
            filter_type: BiquadFilterType::default(),
            sample_rate,
            cutoff: FloatParameterValue::from_description(Self::CUTOFF),
            q: FloatParameterValue::from_description(Self::Q),
            coefficients: BiquadFilterCoefficients::neutral(),
            state: BiquadFilterState::new(),
        }
    }

    pub fn filter_type(&self) -> BiquadFilterType {
        self.filter_type
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Applied cutoff or center frequency in Hz, after clamping it below nyquist.
    /// Neutral filters report 0.
    pub fn cutoff(&self) -> f64 {
        self.coefficients.cutoff()
    }

    pub fn q(&self) -> f64 {
        self.q.value()
    }

    pub fn set_cutoff(&mut self, cutoff: f64) {
        self.cutoff.set_value_clamped(cutoff);
        self.update_coefficients();
    }

    pub fn set_q(&mut self, q: f64) {
        self.q.set_value_clamped(q);
        self.update_coefficients();
    }

    fn update_coefficients(&mut self) {
        self.coefficients.set(
            self.filter_type,
            self.sample_rate,
            self.cutoff.value(),
            self.q.value(),
        );
    }
}

impl Filter for BiquadFilter {
    fn name(&self) -> &'static str {
        Self::FILTER_NAME
    }

    fn id(&self) -> FilterId {
        self.id
    }

    fn parameters(&self) -> Vec<&dyn Parameter> {
        vec![self.cutoff.description(), self.q.description()]
    }

    fn set_parameter(&mut self, id: FourCC, value: f64) -> Result<(), Error> {
        match id {
            Self::CUTOFF_ID => self.set_cutoff(value),
            Self::Q_ID => self.set_q(value),
            _ => {
                return Err(Error::ParameterError(format!(
                    "Unknown parameter: '{id}' for filter '{}'",
                    self.name()
                )))
            }
        }
        Ok(())
    }

    #[inline]
    fn apply(&mut self, sample: f64) -> f64 {
        self.state.process_sample(&self.coefficients, sample)
    }

    fn reset(&mut self) {
        self.state.reset();
    }
}

// -------------------------------------------------------------------------------------------------
