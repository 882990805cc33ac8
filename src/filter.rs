use std::fmt::Debug;

use four_cc::FourCC;

use crate::{parameter::Parameter, Error};

// -------------------------------------------------------------------------------------------------

pub mod biquad;
pub mod chain;
pub mod distortion;

// -------------------------------------------------------------------------------------------------

/// Unique identifier of a filter instance, as used in [`FilterChain`](chain::FilterChain).
pub type FilterId = usize;

// -------------------------------------------------------------------------------------------------

/// Post synthesis signal processor, applied sample by sample in an instrument's filter chain.
///
/// Each filter instance carries a unique id which identifies it in a chain. Parameter
/// descriptors can be queried via [`Filter::parameters`] and values changed with
/// [`Filter::set_parameter`]: out of range values get clamped, unknown parameter ids are an error.
///
/// NB: `apply` is called in the real-time audio path, so it must not block or allocate.
pub trait Filter: Debug + Send + 'static {
    /// A static name of the filter type, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Unique id of this filter instance.
    fn id(&self) -> FilterId;

    /// Descriptors of all parameters of this filter.
    fn parameters(&self) -> Vec<&dyn Parameter>;

    /// Set a parameter's plain value. Values are clamped into the parameter's range.
    fn set_parameter(&mut self, id: FourCC, value: f64) -> Result<(), Error>;

    /// Process a single sample.
    fn apply(&mut self, sample: f64) -> f64;

    /// Clear the filter's history, if it has one.
    fn reset(&mut self) {}
}
