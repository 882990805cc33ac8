//! FM operator nodes, shared by all voices of an instrument.

use crate::{
    breakpoint::Breakpoint,
    envelope::{EnvelopeGenerator, EnvelopeStage},
    preset::OperatorPreset,
    utils::{
        tables::{feedback_depth, output_level},
        VOICE_COUNT,
    },
    waveform::Waveform,
};

// -------------------------------------------------------------------------------------------------

/// Harmonics of the additive feedback approximation for positive feedback depths (saw-like).
const SAW_FEEDBACK_HARMONICS: [f64; 5] = [2.0, 3.0, 4.0, 5.0, 6.0];
/// Harmonics of the additive feedback approximation for negative feedback depths (square-like).
const SQUARE_FEEDBACK_HARMONICS: [f64; 5] = [3.0, 5.0, 7.0, 9.0, 11.0];

// -------------------------------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy)]
struct OperatorVoice {
    phase_rate: f64,
    level_scaling: f64,
    evaluation: u64,
    frame: f64,
}

// -------------------------------------------------------------------------------------------------

/// A single FM operator: waveform, envelope, keyboard scaling and optional feedback.
///
/// Operators are nodes of an [`Algorithm`](crate::Algorithm) graph. They only know the indices
/// of their modulators: the algorithm walks the graph and passes the averaged modulator output
/// into [`Operator::frame`]. All dynamic state is kept in fixed size arrays indexed by voice id.
#[derive(Debug, Clone)]
pub struct Operator {
    index: usize,
    preset: OperatorPreset,
    sample_rate: u32,
    output_level: f64,
    feedback_level: f64,
    feedback_harmonics: Option<&'static [f64; 5]>,
    modulators: Vec<usize>,
    envelope: EnvelopeGenerator,
    breakpoint: Breakpoint,
    voices: Box<[OperatorVoice]>,
}

impl Operator {
    /// Create a new operator with the given (already validated) preset.
    ///
    /// `is_feedback_source` enables the preset's feedback depth, `modulators` are the indices of
    /// the operators which modulate this one.
    pub fn new(
        index: usize,
        preset: &OperatorPreset,
        is_feedback_source: bool,
        modulators: Vec<usize>,
        sample_rate: u32,
    ) -> Self {
        let preset = preset.clamped();
        let feedback_harmonics = match preset.feedback {
            _ if !is_feedback_source => None,
            0 => None,
            depth if depth > 0 => Some(&SAW_FEEDBACK_HARMONICS),
            _ => Some(&SQUARE_FEEDBACK_HARMONICS),
        };
        Self {
            index,
            sample_rate: sample_rate.max(1),
            output_level: output_level(preset.output_level),
            feedback_level: feedback_depth(preset.feedback),
            feedback_harmonics,
            modulators,
            envelope: EnvelopeGenerator::new(preset.envelope, sample_rate),
            breakpoint: Breakpoint::new(preset.breakpoint),
            voices: vec![OperatorVoice::default(); VOICE_COUNT].into_boxed_slice(),
            preset,
        }
    }

    /// Index of this operator in its algorithm.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The clamped preset this operator was created with.
    pub fn preset(&self) -> &OperatorPreset {
        &self.preset
    }

    /// Indices of the operators which modulate this operator.
    pub fn modulators(&self) -> &[usize] {
        &self.modulators
    }

    /// True when this operator adds the feedback approximation to its output.
    pub fn has_feedback(&self) -> bool {
        self.feedback_harmonics.is_some()
    }

    pub fn envelope(&self) -> &EnvelopeGenerator {
        &self.envelope
    }

    /// Current envelope stage of the given voice.
    pub fn stage(&self, voice: usize) -> EnvelopeStage {
        self.envelope.stage(voice)
    }

    /// True while the envelope of the given voice is not idle.
    #[inline]
    pub fn is_active(&self, voice: usize) -> bool {
        self.envelope.is_active(voice)
    }

    /// Phase increment per sample of the given voice in cycles.
    pub fn phase_rate(&self, voice: usize) -> f64 {
        self.voices.get(voice).map(|v| v.phase_rate).unwrap_or(0.0)
    }

    /// Keyboard scaling multiplier of the given voice, as calculated on note-on.
    pub fn level_scaling(&self, voice: usize) -> f64 {
        self.voices.get(voice).map(|v| v.level_scaling).unwrap_or(0.0)
    }

    /// Start a note on the given voice: recalculates the voice's phase rate and keyboard scaling
    /// from `frequency` and arms the envelope's attack.
    pub fn start(&mut self, voice: usize, frequency: f64) {
        let phase_rate = self.preset.frequency_ratio * frequency / self.sample_rate as f64;
        let level_scaling = self.breakpoint.level_offset(frequency);
        if let Some(state) = self.voices.get_mut(voice) {
            state.phase_rate = phase_rate;
            state.level_scaling = level_scaling;
            self.envelope.initialize(voice);
        }
    }

    /// Release the note of the given voice.
    pub fn stop(&mut self, voice: usize) {
        self.envelope.arm_release(voice);
    }

    /// Immediately silence all voices.
    pub fn reset_all(&mut self) {
        self.envelope.reset_all();
        self.voices.fill(OperatorVoice::default());
    }

    /// Returns the frame of the given voice when it already got calculated in `evaluation`.
    #[inline]
    pub fn cached_frame(&self, voice: usize, evaluation: u64) -> Option<f64> {
        self.voices
            .get(voice)
            .filter(|state| state.evaluation == evaluation)
            .map(|state| state.frame)
    }

    /// Calculate the next output frame of the given voice and advance its envelope.
    ///
    /// - `modulation`: averaged output of all modulators in radians.
    /// - `phase`: additional phase offset in radians.
    /// - `time`: sample time of the voice.
    /// - `evaluation`: id of the running evaluation pass, used to memorize the frame for
    ///   operators which modulate more than one target.
    #[inline]
    pub fn frame(
        &mut self,
        voice: usize,
        modulation: f64,
        phase: f64,
        time: u64,
        evaluation: u64,
    ) -> f64 {
        let Some(state) = self.voices.get(voice).copied() else {
            return 0.0;
        };
        let envelope = self.envelope.amplitude(voice);
        let mut frame = self
            .preset
            .waveform
            .generate(state.phase_rate, modulation, phase, time)
            * self.output_level
            * state.level_scaling
            * envelope;
        if let Some(harmonics) = self.feedback_harmonics {
            // added after the level product: not scaled by level, scaling or envelope
            frame += self.feedback_level * feedback(harmonics, state.phase_rate, phase, time);
        }
        let state = &mut self.voices[voice];
        state.evaluation = evaluation;
        state.frame = frame;
        frame
    }
}

// additive approximation of self modulation: sum of sine partials scaled by 1/harmonic
#[inline]
fn feedback(harmonics: &[f64; 5], phase_rate: f64, phase: f64, time: u64) -> f64 {
    harmonics
        .iter()
        .map(|harmonic| {
            Waveform::Sine.generate(phase_rate * harmonic, 0.0, phase, time) / harmonic
        })
        .sum()
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::EnvelopePreset;

    const SAMPLE_RATE: u32 = 1000;

    fn operator(preset: OperatorPreset, is_feedback_source: bool) -> Operator {
        Operator::new(0, &preset, is_feedback_source, Vec::new(), SAMPLE_RATE)
    }

    #[test]
    fn silent_until_started() {
        let mut op = operator(OperatorPreset::default(), false);
        for time in 0..100 {
            assert_eq!(op.frame(0, 0.0, 0.0, time, time + 1), 0.0);
        }
        assert!(!op.is_active(0));
    }

    #[test]
    fn start_sets_rate_and_scaling() {
        let mut op = operator(
            OperatorPreset {
                frequency_ratio: 2.0,
                ..OperatorPreset::default()
            },
            false,
        );
        op.start(3, 100.0);
        assert!((op.phase_rate(3) - 0.2).abs() < 1e-12);
        assert_eq!(op.level_scaling(3), 1.0);
        assert_eq!(op.stage(3), EnvelopeStage::Attack);
        assert!(op.is_active(3));
        // other voices are untouched
        assert!(!op.is_active(4));
        // out of range voices are ignored
        op.start(VOICE_COUNT, 100.0);
        assert_eq!(op.frame(VOICE_COUNT, 0.0, 0.0, 0, 1), 0.0);
    }

    #[test]
    fn frames_are_scaled_by_envelope_and_level() {
        let preset = OperatorPreset {
            output_level: 80,
            envelope: EnvelopePreset {
                levels: [99, 99, 99, 0],
                rates: [99, 99, 99, 99],
            },
            ..OperatorPreset::default()
        };
        let mut op = operator(preset, false);
        op.start(0, 110.0);
        let level = output_level(80);
        for time in 0..500 {
            let frame = op.frame(0, 0.0, 0.0, time, time + 1);
            assert!(frame.abs() <= level + 1e-12);
        }
        assert_eq!(op.stage(0), EnvelopeStage::Hold);
        let expected = Waveform::Sine.generate(op.phase_rate(0), 0.0, 0.0, 500) * level;
        assert!((op.frame(0, 0.0, 0.0, 500, 501) - expected).abs() < 1e-12);
    }

    #[test]
    fn frames_are_cached_per_evaluation() {
        let mut op = operator(OperatorPreset::default(), false);
        op.start(0, 440.0);
        assert_eq!(op.cached_frame(0, 1), None);
        let frame = op.frame(0, 0.0, 0.0, 7, 1);
        assert_eq!(op.cached_frame(0, 1), Some(frame));
        assert_eq!(op.cached_frame(0, 2), None);
        assert_eq!(op.cached_frame(1, 1), None);
    }

    #[test]
    fn feedback_only_on_source() {
        let preset = OperatorPreset {
            feedback: 7,
            ..OperatorPreset::default()
        };
        assert!(operator(preset.clone(), true).has_feedback());
        assert!(!operator(preset, false).has_feedback());
        let preset = OperatorPreset {
            feedback: 0,
            ..OperatorPreset::default()
        };
        assert!(!operator(preset, true).has_feedback());
    }

    #[test]
    fn feedback_changes_timbre() {
        let run = |feedback: i8| {
            let mut op = operator(
                OperatorPreset {
                    feedback,
                    ..OperatorPreset::default()
                },
                true,
            );
            op.start(0, 50.0);
            (0..200)
                .map(|time| op.frame(0, 0.0, 0.0, time, time + 1))
                .collect::<Vec<_>>()
        };
        let plain = run(0);
        let saw = run(7);
        let square = run(-7);
        assert_ne!(plain, saw);
        assert_ne!(plain, square);
        assert_ne!(saw, square);
    }

    fn expected_feedback(depth: i8, harmonics: &[f64], phase_rate: f64, time: u64) -> f64 {
        let partials: f64 = harmonics
            .iter()
            .map(|h| (std::f64::consts::TAU * phase_rate * h * time as f64).sin() / h)
            .sum();
        feedback_depth(depth) * partials
    }

    #[test]
    fn feedback_is_independent_of_level_and_envelope() {
        let mut op = operator(
            OperatorPreset {
                output_level: 0,
                feedback: 7,
                ..OperatorPreset::default()
            },
            true,
        );
        op.start(0, 50.0);
        let mut non_zero = 0;
        for time in 0..100 {
            let frame = op.frame(0, 0.0, 0.0, time, time + 1);
            let expected = expected_feedback(7, &[2.0, 3.0, 4.0, 5.0, 6.0], 0.05, time);
            assert!((frame - expected).abs() < 1e-9, "{frame} != {expected} at {time}");
            if frame.abs() > 1e-6 {
                non_zero += 1;
            }
        }
        assert!(non_zero > 50);

        // still present once the envelope is idle
        let mut op = operator(
            OperatorPreset {
                feedback: 7,
                ..OperatorPreset::default()
            },
            true,
        );
        op.start(0, 50.0);
        op.stop(0);
        let mut time = 0;
        while op.is_active(0) {
            op.frame(0, 0.0, 0.0, time, time + 1);
            time += 1;
        }
        let frame = op.frame(0, 0.0, 0.0, 7, time + 1);
        let expected = expected_feedback(7, &[2.0, 3.0, 4.0, 5.0, 6.0], 0.05, 7);
        assert!(expected.abs() > 0.1);
        assert!((frame - expected).abs() < 1e-9);
    }

    #[test]
    fn feedback_harmonics_follow_depth_sign() {
        let preset = OperatorPreset {
            output_level: 80,
            envelope: EnvelopePreset {
                levels: [99, 99, 99, 0],
                rates: [99, 99, 99, 99],
            },
            ..OperatorPreset::default()
        };
        for (depth, harmonics) in [
            (5_i8, [2.0, 3.0, 4.0, 5.0, 6.0]),
            (-3_i8, [3.0, 5.0, 7.0, 9.0, 11.0]),
        ] {
            let mut op = operator(
                OperatorPreset {
                    feedback: depth,
                    ..preset.clone()
                },
                true,
            );
            op.start(0, 50.0);
            // run into hold, where the envelope amplitude stays at 1
            for time in 0..500 {
                op.frame(0, 0.0, 0.0, time, time + 1);
            }
            assert_eq!(op.stage(0), EnvelopeStage::Hold);
            for time in 500..600 {
                let frame = op.frame(0, 0.0, 0.0, time, time + 1);
                let carrier = Waveform::Sine.generate(op.phase_rate(0), 0.0, 0.0, time)
                    * output_level(80);
                let expected = carrier + expected_feedback(depth, &harmonics, 0.05, time);
                assert!((frame - expected).abs() < 1e-9, "{frame} != {expected} at {time}");
            }
        }
    }

    #[test]
    fn stop_releases_envelope() {
        let mut op = operator(OperatorPreset::default(), false);
        op.start(2, 440.0);
        op.frame(2, 0.0, 0.0, 0, 1);
        op.stop(2);
        assert_eq!(op.stage(2), EnvelopeStage::Release);
        op.reset_all();
        assert!(!op.is_active(2));
        assert_eq!(op.phase_rate(2), 0.0);
    }
}
