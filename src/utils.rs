//! Shared helpers and lookup tables used by the synthesis engine.

pub mod dsp;
pub mod tables;

use std::sync::atomic::{AtomicUsize, Ordering};

// -------------------------------------------------------------------------------------------------

/// Number of supported keyboard positions (voice slots) of an instrument.
pub const VOICE_COUNT: usize = 132;

/// Keyboard position of the A4 reference pitch.
const REFERENCE_NOTE: usize = 69;
/// Frequency of the A4 reference pitch in Hz.
const REFERENCE_FREQUENCY: f64 = 440.0;

// -------------------------------------------------------------------------------------------------

/// Generates a unique usize number, by simply counting atomically upwards from 1.
pub fn unique_usize_id() -> usize {
    static ID_COUNTER: AtomicUsize = AtomicUsize::new(1);
    ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

// -------------------------------------------------------------------------------------------------

/// Equal tempered frequency in Hz of the given keyboard position (voice id).
///
/// Position 69 is A4 (440 Hz). Positions are not clamped, so this also works for fractional
/// offsets outside of the playable `0..VOICE_COUNT` range, as needed by keyboard scaling.
pub fn note_to_frequency(note: f64) -> f64 {
    REFERENCE_FREQUENCY * 2.0_f64.powf((note - REFERENCE_NOTE as f64) / 12.0)
}

/// Returns the relative position of `value` between `start` and `end` in percent,
/// clamped to \[0, 100\].
pub fn percentage_position(start: f64, end: f64, value: f64) -> f64 {
    if end == start {
        return 100.0;
    }
    ((value - start) / (end - start) * 100.0).clamp(0.0, 100.0)
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_frequencies() {
        assert_eq!(note_to_frequency(69.0), 440.0);
        assert!((note_to_frequency(81.0) - 880.0).abs() < 1e-9);
        assert!((note_to_frequency(57.0) - 220.0).abs() < 1e-9);
        assert!((note_to_frequency(60.0) - 261.6256).abs() < 1e-3);
    }

    #[test]
    fn percentage_positions() {
        assert_eq!(percentage_position(100.0, 200.0, 150.0), 50.0);
        assert_eq!(percentage_position(100.0, 200.0, 50.0), 0.0);
        assert_eq!(percentage_position(100.0, 200.0, 300.0), 100.0);
        assert_eq!(percentage_position(200.0, 200.0, 200.0), 100.0);
    }

    #[test]
    fn unique_ids() {
        let a = unique_usize_id();
        let b = unique_usize_id();
        assert_ne!(a, b);
        assert!(a > 0 && b > 0);
    }
}
