use four_cc::FourCC;
use strum::{Display, EnumIter, EnumString, FromRepr};

use crate::{
    filter::{Filter, FilterId},
    parameter::{FloatParameter, FloatParameterValue, IntegerParameter, Parameter},
    utils::unique_usize_id,
    Error,
};

// -------------------------------------------------------------------------------------------------

/// Transfer function of a [`Distortion`] filter.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Default, Display, EnumIter, EnumString, FromRepr,
)]
#[repr(u8)]
pub enum DistortionType {
    /// Rational waveshaper `x·(|x|+a)/(x²+(a−1)|x|+1)` with `a` being the level.
    ///
    /// Level 0 gently compresses, higher levels add more and more odd harmonics.
    #[default]
    Waveshaper = 0,
    /// Soft clipping using a cubic polynomial on the boosted signal.
    SoftClip = 1,
    /// Hard clipping at a threshold which falls with the level.
    HardClip = 2,
}

// -------------------------------------------------------------------------------------------------

/// Memoryless, non-linear distortion stage with a drive level in \[0, 5\].
#[derive(Debug)]
pub struct Distortion {
    id: FilterId,
    distortion_type: DistortionType,
    level: FloatParameterValue,
}

impl Distortion {
    pub const FILTER_NAME: &str = "Distortion";
    pub const TYPE_ID: FourCC = FourCC(*b"type");
    pub const LEVEL_ID: FourCC = FourCC(*b"levl");

    const TYPE: IntegerParameter = IntegerParameter::new(Self::TYPE_ID, "Type", 0..=2, 0);
    const LEVEL: FloatParameter =
        FloatParameter::new(Self::LEVEL_ID, "Level", 0.0..=5.0, 1.0).with_unit("x");

    /// Create a new waveshaper distortion with the given level. Levels are clamped to \[0, 5\].
    pub fn new(level: f64) -> Self {
        Self::with_type(DistortionType::default(), level)
    }

    /// Create a new distortion with the given type and level.
    pub fn with_type(distortion_type: DistortionType, level: f64) -> Self {
        let mut level_value = FloatParameterValue::from_description(Self::LEVEL);
        level_value.set_value_clamped(level);
        Self {
            id: unique_usize_id(),
            distortion_type,
            level: level_value,
        }
    }

    pub fn distortion_type(&self) -> DistortionType {
        self.distortion_type
    }

    pub fn set_distortion_type(&mut self, distortion_type: DistortionType) {
        self.distortion_type = distortion_type;
    }

    pub fn level(&self) -> f64 {
        self.level.value()
    }

    pub fn set_level(&mut self, level: f64) {
        self.level.set_value_clamped(level);
    }

    #[inline]
    fn waveshape(sample: f64, level: f64) -> f64 {
        let magnitude = sample.abs();
        sample * (magnitude + level) / (sample * sample + (level - 1.0) * magnitude + 1.0)
    }

    #[inline]
    fn soft_clip(sample: f64, level: f64) -> f64 {
        const BOOST_FACTOR: f64 = 15.0;
        let drive = level / 5.0;
        let gain = 1.0 + drive.powi(4) * (BOOST_FACTOR - 1.0);
        let amplified_sample = sample * gain;
        if amplified_sample >= 1.0 {
            1.0
        } else if amplified_sample > -1.0 {
            (3.0 / 2.0) * (amplified_sample - amplified_sample.powi(3) / 3.0)
        } else {
            -1.0
        }
    }

    #[inline]
    fn hard_clip(sample: f64, level: f64) -> f64 {
        const BOOST_FACTOR: f64 = 50.0;
        let drive = level / 5.0;
        let gain = 1.0 + drive.powi(4) * (BOOST_FACTOR - 1.0);
        let threshold = 1.0 / gain;
        sample.clamp(-threshold, threshold) * gain
    }
}

impl Default for Distortion {
    fn default() -> Self {
        Self::new(Self::LEVEL.default_plain_value())
    }
}

impl Filter for Distortion {
    fn name(&self) -> &'static str {
        Self::FILTER_NAME
    }

    fn id(&self) -> FilterId {
        self.id
    }

    fn parameters(&self) -> Vec<&dyn Parameter> {
        vec![&Self::TYPE, self.level.description()]
    }

    fn set_parameter(&mut self, id: FourCC, value: f64) -> Result<(), Error> {
        match id {
            Self::TYPE_ID => {
                let index = Self::TYPE.clamp_value_logged(value.round() as i32);
                let distortion_type = DistortionType::from_repr(index as u8).unwrap_or_default();
                self.set_distortion_type(distortion_type);
            }
            Self::LEVEL_ID => self.set_level(value),
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
        let level = self.level.value();
        match self.distortion_type {
            DistortionType::Waveshaper => Self::waveshape(sample, level),
            DistortionType::SoftClip => Self::soft_clip(sample, level),
            DistortionType::HardClip => Self::hard_clip(sample, level),
        }
    }
}

// -------------------------------------------------------------------------------------------------
