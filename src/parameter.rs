//! Parameter descriptors and value wrappers for instruments and filters.

use std::fmt::Debug;

use four_cc::FourCC;

// -------------------------------------------------------------------------------------------------

/// Describes the type of a [`Parameter`] to e.g. select a proper visual representation in a UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterType {
    /// A continuous floating-point value.
    Float,
    /// A discrete integer value.
    Integer,
}

// -------------------------------------------------------------------------------------------------

/// Describes a single tunable parameter of an instrument, operator or filter.
pub trait Parameter: Debug {
    /// The unique id of the parameter.
    fn id(&self) -> FourCC;

    /// The name of the parameter.
    fn name(&self) -> &'static str;

    /// The parameter type.
    fn parameter_type(&self) -> ParameterType;

    /// Default value of parameter, expressed as normalized floating point value in range \[0,1\].
    fn default_value(&self) -> f64;

    /// Convert the given plain value to a display string.
    fn value_to_string(&self, value: f64, include_unit: bool) -> String;
}

// -------------------------------------------------------------------------------------------------

mod float;
pub use float::{FloatParameter, FloatParameterValue};

mod integer;
pub use integer::IntegerParameter;
