use std::ops::RangeInclusive;

use four_cc::FourCC;

use super::{Parameter, ParameterType};

// -------------------------------------------------------------------------------------------------

/// A continuous (float) parameter descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatParameter {
    id: FourCC,
    name: &'static str,
    range: RangeInclusive<f64>,
    default: f64,
    unit: &'static str,
}

impl FloatParameter {
    /// Create a new float parameter descriptor.
    pub const fn new(
        id: FourCC,
        name: &'static str,
        range: RangeInclusive<f64>,
        default: f64,
    ) -> Self {
        assert!(
            default >= *range.start() && default <= *range.end(),
            "Invalid parameter default value"
        );
        Self {
            id,
            name,
            range,
            default,
            unit: "",
        }
    }

    /// Optional unit for string displays.
    pub const fn with_unit(mut self, unit: &'static str) -> Self {
        self.unit = unit;
        self
    }

    /// The parameter's value range.
    pub fn range(&self) -> &RangeInclusive<f64> {
        &self.range
    }

    /// The parameter's plain default value.
    pub fn default_plain_value(&self) -> f64 {
        self.default
    }

    /// Clamp the given plain value to the parameter's range. NaN values fall back to the default.
    pub fn clamp_value(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(*self.range.start(), *self.range.end())
        }
    }

    /// Normalize the given plain value to a 0.0-1.0 range.
    pub fn normalize_value(&self, value: f64) -> f64 {
        (value - *self.range.start()) / (*self.range.end() - *self.range.start())
    }

    /// Denormalize a 0.0-1.0 ranged value to the corresponding plain value.
    pub fn denormalize_value(&self, normalized: f64) -> f64 {
        let normalized = normalized.clamp(0.0, 1.0);
        *self.range.start() + normalized * (*self.range.end() - *self.range.start())
    }
}

impl Parameter for FloatParameter {
    fn id(&self) -> FourCC {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn parameter_type(&self) -> ParameterType {
        ParameterType::Float
    }

    fn default_value(&self) -> f64 {
        self.normalize_value(self.default)
    }

    fn value_to_string(&self, value: f64, include_unit: bool) -> String {
        if include_unit && !self.unit.is_empty() {
            format!("{:.2} {}", value, self.unit)
        } else {
            format!("{:.2}", value)
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Holds a float parameter value and its description.
#[derive(Debug, Clone)]
pub struct FloatParameterValue {
    description: FloatParameter,
    value: f64,
}

impl FloatParameterValue {
    /// Create a new parameter value with the given parameter description, initialized to the
    /// parameter's default value.
    pub fn from_description(description: FloatParameter) -> Self {
        let value = description.default_plain_value();
        Self { description, value }
    }

    /// Access the parameter value's description.
    pub fn description(&self) -> &FloatParameter {
        &self.description
    }

    /// Access to the current value.
    #[inline(always)]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set a new value, clamping the given value into the parameter's value bounds if necessary.
    /// Returns true when the stored value changed.
    pub fn set_value_clamped(&mut self, value: f64) -> bool {
        let clamped = self.description.clamp_value(value);
        if clamped != value {
            log::warn!(
                "Value {value} for parameter '{}' is out of range, clamped to {clamped}",
                self.description.name()
            );
        }
        let changed = self.value != clamped;
        self.value = clamped;
        changed
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const GAIN: FloatParameter = FloatParameter::new(FourCC(*b"gain"), "Gain", 0.0..=10.0, 1.0);

    #[test]
    fn clamping() {
        assert_eq!(GAIN.clamp_value(-1.0), 0.0);
        assert_eq!(GAIN.clamp_value(11.0), 10.0);
        assert_eq!(GAIN.clamp_value(f64::NAN), 1.0);
        assert_eq!(GAIN.clamp_value(2.5), 2.5);
    }

    #[test]
    fn normalization() {
        assert_eq!(GAIN.normalize_value(5.0), 0.5);
        assert_eq!(GAIN.denormalize_value(0.5), 5.0);
        assert_eq!(GAIN.denormalize_value(2.0), 10.0);
        assert_eq!(GAIN.default_value(), 0.1);
    }

    #[test]
    fn parameter_values() {
        let mut value = FloatParameterValue::from_description(GAIN.clone());
        assert_eq!(value.value(), 1.0);
        assert!(value.set_value_clamped(20.0));
        assert_eq!(value.value(), 10.0);
        assert!(!value.set_value_clamped(10.0));
    }
}
