//! Process wide, immutable lookup tables for DX7 style 0-99 parameter indices.
//!
//! Tables are generated once on first use and shared by all operators and envelopes.

use std::sync::LazyLock;

// -------------------------------------------------------------------------------------------------

/// Highest valid level, rate and output-level index.
pub const MAX_INDEX: u8 = 99;
/// Highest valid feedback depth (in both directions).
pub const MAX_FEEDBACK: i8 = 7;

/// Attenuation per level index step in dB.
const LEVEL_STEP_DB: f64 = 0.75;

/// Segment duration at envelope rate 0 in seconds.
const SLOWEST_SEGMENT_SECS: f64 = 40.0;
/// Segment duration at envelope rate 99 in seconds.
const FASTEST_SEGMENT_SECS: f64 = 0.002;

// -------------------------------------------------------------------------------------------------

static OUTPUT_LEVELS: LazyLock<[f64; 100]> = LazyLock::new(|| std::array::from_fn(level_curve));

static ENVELOPE_LEVELS: LazyLock<[f64; 100]> = LazyLock::new(|| std::array::from_fn(level_curve));

static ENVELOPE_DURATIONS: LazyLock<[f64; 100]> = LazyLock::new(|| {
    std::array::from_fn(|index| {
        let ratio = FASTEST_SEGMENT_SECS / SLOWEST_SEGMENT_SECS;
        SLOWEST_SEGMENT_SECS * ratio.powf(index as f64 / MAX_INDEX as f64)
    })
});

static FEEDBACK_DEPTHS: LazyLock<[f64; 8]> = LazyLock::new(|| {
    std::array::from_fn(|depth| {
        if depth == 0 {
            0.0
        } else {
            2.0_f64.powi(depth as i32 - MAX_FEEDBACK as i32)
        }
    })
});

// exponential, 0 is silent and 99 is unity gain
fn level_curve(index: usize) -> f64 {
    if index == 0 {
        0.0
    } else {
        let attenuation_db = (MAX_INDEX as usize - index) as f64 * LEVEL_STEP_DB;
        10.0_f64.powf(-attenuation_db / 20.0)
    }
}

// -------------------------------------------------------------------------------------------------

/// Operator output level amplitude in \[0, 1\] for the given index. Indices > 99 are clamped.
#[inline]
pub fn output_level(index: u8) -> f64 {
    OUTPUT_LEVELS[index.min(MAX_INDEX) as usize]
}

/// Envelope target amplitude in \[0, 1\] for the given level index. Indices > 99 are clamped.
#[inline]
pub fn envelope_level(index: u8) -> f64 {
    ENVELOPE_LEVELS[index.min(MAX_INDEX) as usize]
}

/// Envelope segment duration in seconds for the given rate index: higher rates are faster.
/// Indices > 99 are clamped.
#[inline]
pub fn envelope_duration(index: u8) -> f64 {
    ENVELOPE_DURATIONS[index.min(MAX_INDEX) as usize]
}

/// Feedback scaling factor for the given depth. The sign only selects the harmonic set in
/// operators, so the returned magnitude is symmetric. Depths outside of -7..=7 are clamped.
#[inline]
pub fn feedback_depth(depth: i8) -> f64 {
    FEEDBACK_DEPTHS[depth.clamp(-MAX_FEEDBACK, MAX_FEEDBACK).unsigned_abs() as usize]
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_tables_are_monotonic() {
        assert_eq!(output_level(0), 0.0);
        assert_eq!(output_level(99), 1.0);
        assert_eq!(envelope_level(99), 1.0);
        for index in 1..=MAX_INDEX {
            assert!(output_level(index) > output_level(index - 1));
            assert!(envelope_level(index) > envelope_level(index - 1));
        }
        // out of range indices are clamped
        assert_eq!(output_level(200), 1.0);
    }

    #[test]
    fn durations_decrease_with_rate() {
        assert!((envelope_duration(0) - SLOWEST_SEGMENT_SECS).abs() < 1e-9);
        assert!((envelope_duration(99) - FASTEST_SEGMENT_SECS).abs() < 1e-9);
        for index in 1..=MAX_INDEX {
            assert!(envelope_duration(index) < envelope_duration(index - 1));
        }
    }

    #[test]
    fn feedback_depths() {
        assert_eq!(feedback_depth(0), 0.0);
        assert_eq!(feedback_depth(7), 1.0);
        assert_eq!(feedback_depth(-7), 1.0);
        assert_eq!(feedback_depth(3), feedback_depth(-3));
        assert_eq!(feedback_depth(100), 1.0);
        for depth in 1..=MAX_FEEDBACK {
            assert!(feedback_depth(depth) > feedback_depth(depth - 1));
        }
    }
}
