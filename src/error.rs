use std::{error, fmt};

use crate::filter::FilterId;

// -------------------------------------------------------------------------------------------------

/// Provides an enumeration of all possible errors reported by fmsynth.
///
/// Errors are only ever reported from control paths (preset loading, parameter routing,
/// controller event sends). Sample generation itself never fails.
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    InvalidTopology(String),
    InvalidPreset(String),
    ParameterError(String),
    FilterNotFound(FilterId),
    SendError(String),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTopology(str) => write!(f, "Invalid algorithm topology: {str}"),
            Self::InvalidPreset(str) => write!(f, "Invalid operator preset: {str}"),
            Self::ParameterError(str) => write!(f, "Invalid parameter: {str}"),
            Self::FilterNotFound(filter_id) => {
                write!(f, "Filter with id {filter_id} not found")
            }
            Self::SendError(str) => write!(f, "Failed to send control event: {str}"),
        }
    }
}
