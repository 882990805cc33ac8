use std::ops::RangeInclusive;

use four_cc::FourCC;

use super::{Parameter, ParameterType};

// -------------------------------------------------------------------------------------------------

/// A discrete (integer) parameter descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegerParameter {
    id: FourCC,
    name: &'static str,
    range: RangeInclusive<i32>,
    default: i32,
}

impl IntegerParameter {
    pub const fn new(
        id: FourCC,
        name: &'static str,
        range: RangeInclusive<i32>,
        default: i32,
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
        }
    }

    pub fn range(&self) -> &RangeInclusive<i32> {
        &self.range
    }

    pub fn default_plain_value(&self) -> i32 {
        self.default
    }

    pub fn clamp_value(&self, value: i32) -> i32 {
        value.clamp(*self.range.start(), *self.range.end())
    }

    /// Clamps the value and logs a warning when it was out of range.
    pub fn clamp_value_logged(&self, value: i32) -> i32 {
        let clamped = self.clamp_value(value);
        if clamped != value {
            log::warn!(
                "Value {value} for parameter '{}' is out of range, clamped to {clamped}",
                self.name
            );
        }
        clamped
    }

    pub fn normalize_value(&self, value: i32) -> f64 {
        (value as f64 - *self.range.start() as f64)
            / (*self.range.end() as f64 - *self.range.start() as f64)
    }
}

impl Parameter for IntegerParameter {
    fn id(&self) -> FourCC {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn parameter_type(&self) -> ParameterType {
        ParameterType::Integer
    }

    fn default_value(&self) -> f64 {
        self.normalize_value(self.default)
    }

    fn value_to_string(&self, value: f64, _include_unit: bool) -> String {
        format!("{}", value.round() as i32)
    }
}
