#![doc = include_str!("../README.md")]

// private mods (will be partly re-exported)
mod algorithm;
mod breakpoint;
mod envelope;
mod error;
mod filter;
mod instrument;
mod operator;
mod parameter;
mod preset;
mod waveform;

// public, flat re-exports
pub use error::Error;

pub use algorithm::Algorithm;
pub use breakpoint::{Breakpoint, BreakpointCurve, BreakpointPreset};
pub use envelope::{EnvelopeGenerator, EnvelopePreset, EnvelopeStage};
pub use instrument::{Instrument, InstrumentConfig, InstrumentController};
pub use operator::Operator;
pub use preset::{AlgorithmTopology, FeedbackEdge, ModulationEdge, OperatorPreset};
pub use waveform::Waveform;

pub use filter::{chain::FilterChain, chain::FilterMode, Filter, FilterId};

pub use parameter::{
    FloatParameter, FloatParameterValue, IntegerParameter, Parameter, ParameterType,
};

// public mods
pub mod utils;

pub mod filters {
    //! Set of post synthesis filters for the [`FilterChain`](super::FilterChain).

    pub use super::filter::{
        biquad::BiquadFilter,
        distortion::{Distortion, DistortionType},
    };
    pub use super::utils::dsp::filters::biquad::BiquadFilterType;
}

pub mod parameters {
    //! Parameter descriptors of instruments and operator presets.

    pub use super::instrument::GAIN;
    pub use super::preset::{
        ENVELOPE_LEVEL, ENVELOPE_RATE, FEEDBACK, FREQUENCY_RATIO, MAX_OPERATORS, OUTPUT_LEVEL,
    };
}
