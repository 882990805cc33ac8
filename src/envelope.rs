//! DX7 style 4-rate/4-level envelope generator with per-voice state.

use strum::{Display, EnumIter};

use crate::utils::{
    tables::{envelope_duration, envelope_level},
    VOICE_COUNT,
};

// -------------------------------------------------------------------------------------------------

/// Current processing stage of a single voice in an [`EnvelopeGenerator`].
///
/// Stages run in order `Attack → Decay → Sustain → Hold`, then after a release
/// `Release → PreIdle → Idle`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum EnvelopeStage {
    Attack,
    Decay,
    Sustain,
    /// Plateau at the sustain level, waiting for a release.
    Hold,
    Release,
    /// Fixed duration fade to zero after the release segment.
    PreIdle,
    #[default]
    /// Before the first note and after the pre-idle fade (zero amplitude).
    Idle,
}

impl EnvelopeStage {
    /// True for all stages which can be released.
    pub fn is_releasable(self) -> bool {
        matches!(self, Self::Attack | Self::Decay | Self::Sustain | Self::Hold)
    }
}

// -------------------------------------------------------------------------------------------------

/// Envelope levels and rates as raw 0-99 indices.
///
/// Index 0 is the attack segment, 1 decay, 2 sustain and 3 release. Levels are target levels
/// of each segment, rates define how fast the segment reaches its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopePreset {
    pub levels: [u8; 4],
    pub rates: [u8; 4],
}

impl Default for EnvelopePreset {
    fn default() -> Self {
        Self {
            levels: [99, 99, 99, 0],
            rates: [99, 99, 99, 90],
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy)]
struct EnvelopeVoice {
    stage: EnvelopeStage,
    start_level: f64,
    end_level: f64,
    position: u64,
    size: u64,
    amplitude: f64,
}

impl EnvelopeVoice {
    fn enter(&mut self, stage: EnvelopeStage, end_level: f64, size: u64) {
        self.stage = stage;
        self.start_level = self.amplitude;
        self.end_level = end_level;
        self.position = 0;
        self.size = size.max(1);
    }
}

// -------------------------------------------------------------------------------------------------

/// Multi-segment amplitude envelope of a single operator, shared by all voices.
///
/// All dynamic state lives in a fixed array indexed by voice id, so a generator never allocates
/// after construction. Each segment linearly interpolates from the amplitude the previous
/// segment reached to the segment's target level, which keeps the output continuous across
/// stage changes, retriggers and releases.
#[derive(Debug, Clone)]
pub struct EnvelopeGenerator {
    sample_rate: u32,
    preset: EnvelopePreset,
    levels: [f64; 4],
    segment_sizes: [u64; 4],
    pre_idle_size: u64,
    voices: Box<[EnvelopeVoice]>,
}

impl EnvelopeGenerator {
    const ATTACK: usize = 0;
    const DECAY: usize = 1;
    const SUSTAIN: usize = 2;
    const RELEASE: usize = 3;

    /// Create a new envelope generator with all voices idle.
    pub fn new(preset: EnvelopePreset, sample_rate: u32) -> Self {
        let mut envelope = Self {
            sample_rate: sample_rate.max(1),
            preset,
            levels: [0.0; 4],
            segment_sizes: [1; 4],
            pre_idle_size: 1,
            voices: vec![EnvelopeVoice::default(); VOICE_COUNT].into_boxed_slice(),
        };
        envelope.apply();
        envelope
    }

    /// Get currently applied sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the level and rate indices.
    pub fn preset(&self) -> &EnvelopePreset {
        &self.preset
    }

    /// Length of the given segment (0 = attack ... 3 = release) in samples.
    pub fn segment_samples(&self, segment: usize) -> u64 {
        self.segment_sizes[segment.min(Self::RELEASE)]
    }

    /// Length of the fixed pre-idle fade in samples (200 ms).
    pub fn pre_idle_samples(&self) -> u64 {
        self.pre_idle_size
    }

    /// Target amplitude of the given segment (0 = attack ... 3 = release).
    pub fn segment_level(&self, segment: usize) -> f64 {
        self.levels[segment.min(Self::RELEASE)]
    }

    /// Current stage of the given voice.
    pub fn stage(&self, voice: usize) -> EnvelopeStage {
        self.voices
            .get(voice)
            .map(|state| state.stage)
            .unwrap_or_default()
    }

    /// True when the given voice is not in the idle stage.
    #[inline]
    pub fn is_active(&self, voice: usize) -> bool {
        self.stage(voice) != EnvelopeStage::Idle
    }

    /// Last produced amplitude of the given voice, without advancing the envelope.
    pub fn current_amplitude(&self, voice: usize) -> f64 {
        self.voices
            .get(voice)
            .map(|state| state.amplitude)
            .unwrap_or(0.0)
    }

    /// Start and end amplitude of the given voice's current segment.
    pub fn segment_levels(&self, voice: usize) -> (f64, f64) {
        self.voices
            .get(voice)
            .map(|state| (state.start_level, state.end_level))
            .unwrap_or((0.0, 0.0))
    }

    /// Arms the attack segment, starting from the voice's current amplitude, so retriggering a
    /// still fading voice does not click.
    pub fn initialize(&mut self, voice: usize) {
        let (level, size) = (self.levels[Self::ATTACK], self.segment_sizes[Self::ATTACK]);
        if let Some(state) = self.voices.get_mut(voice) {
            state.enter(EnvelopeStage::Attack, level, size);
        }
    }

    /// Switches to the release segment, starting from the current amplitude. Does nothing when
    /// the voice already is releasing or idle.
    pub fn arm_release(&mut self, voice: usize) {
        let (level, size) = (self.levels[Self::RELEASE], self.segment_sizes[Self::RELEASE]);
        if let Some(state) = self.voices.get_mut(voice) {
            if state.stage.is_releasable() {
                state.enter(EnvelopeStage::Release, level, size);
            }
        }
    }

    /// Immediately stop the voice and set it to idle with zero amplitude.
    pub fn reset(&mut self, voice: usize) {
        if let Some(state) = self.voices.get_mut(voice) {
            *state = EnvelopeVoice::default();
        }
    }

    /// Immediately stop all voices.
    pub fn reset_all(&mut self) {
        self.voices.fill(EnvelopeVoice::default());
    }

    /// Compute and return the next amplitude of the given voice. Advances the voice's segment
    /// by one sample, except in the hold and idle stages.
    #[inline]
    pub fn amplitude(&mut self, voice: usize) -> f64 {
        let Some(state) = self.voices.get_mut(voice) else {
            return 0.0;
        };
        match state.stage {
            EnvelopeStage::Idle => {
                state.amplitude = 0.0;
            }
            EnvelopeStage::Hold => {
                // nothing to do (waiting for release)
            }
            stage => {
                state.position += 1;
                if state.position >= state.size {
                    state.amplitude = state.end_level;
                    match stage {
                        EnvelopeStage::Attack => state.enter(
                            EnvelopeStage::Decay,
                            self.levels[Self::DECAY],
                            self.segment_sizes[Self::DECAY],
                        ),
                        EnvelopeStage::Decay => state.enter(
                            EnvelopeStage::Sustain,
                            self.levels[Self::SUSTAIN],
                            self.segment_sizes[Self::SUSTAIN],
                        ),
                        EnvelopeStage::Sustain => {
                            state.stage = EnvelopeStage::Hold;
                        }
                        EnvelopeStage::Release => {
                            state.enter(EnvelopeStage::PreIdle, 0.0, self.pre_idle_size)
                        }
                        _ => {
                            state.stage = EnvelopeStage::Idle;
                            state.amplitude = 0.0;
                        }
                    }
                } else {
                    let progress = state.position as f64 / state.size as f64;
                    state.amplitude =
                        state.start_level + (state.end_level - state.start_level) * progress;
                }
            }
        }
        state.amplitude
    }

    fn apply(&mut self) {
        for segment in 0..4 {
            self.levels[segment] = envelope_level(self.preset.levels[segment]);
            let duration = envelope_duration(self.preset.rates[segment]);
            self.segment_sizes[segment] =
                ((duration * self.sample_rate as f64).round() as u64).max(1);
        }
        self.pre_idle_size = (self.sample_rate as u64 / 5).max(1);
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 1000;

    fn envelope() -> EnvelopeGenerator {
        EnvelopeGenerator::new(
            EnvelopePreset {
                levels: [99, 80, 60, 0],
                rates: [70, 60, 60, 65],
            },
            SAMPLE_RATE,
        )
    }

    #[test]
    fn voices_start_idle() {
        let mut env = envelope();
        for voice in 0..VOICE_COUNT {
            assert_eq!(env.stage(voice), EnvelopeStage::Idle);
            assert_eq!(env.amplitude(voice), 0.0);
        }
        // out of range voices are ignored
        env.initialize(VOICE_COUNT);
        assert_eq!(env.amplitude(VOICE_COUNT), 0.0);
        assert_eq!(env.stage(VOICE_COUNT), EnvelopeStage::Idle);
    }

    #[test]
    fn attack_reaches_level_after_attack_samples() {
        let mut env = envelope();
        env.initialize(3);
        assert_eq!(env.stage(3), EnvelopeStage::Attack);
        let attack_samples = env.segment_samples(0);
        assert!(attack_samples > 1);
        for _ in 0..attack_samples - 1 {
            let amplitude = env.amplitude(3);
            assert!(amplitude < env.segment_level(0));
        }
        assert_eq!(env.amplitude(3), env.segment_level(0));
        assert_eq!(env.stage(3), EnvelopeStage::Decay);
        // other voices are untouched
        assert_eq!(env.stage(4), EnvelopeStage::Idle);
    }

    #[test]
    fn segments_are_continuous() {
        let mut env = envelope();
        env.initialize(0);
        let mut last_stage = env.stage(0);
        let mut last_end = env.segment_levels(0).1;
        let mut transitions = 0;
        for _ in 0..10_000 {
            let amplitude = env.amplitude(0);
            let stage = env.stage(0);
            if stage != last_stage {
                transitions += 1;
                assert!((amplitude - last_end).abs() < f64::EPSILON);
                if stage != EnvelopeStage::Hold {
                    assert!((env.segment_levels(0).0 - amplitude).abs() < f64::EPSILON);
                }
                last_stage = stage;
            }
            last_end = env.segment_levels(0).1;
        }
        assert_eq!(env.stage(0), EnvelopeStage::Hold);
        assert_eq!(transitions, 3);
    }

    #[test]
    fn release_segments_are_continuous() {
        let mut env = EnvelopeGenerator::new(
            EnvelopePreset {
                levels: [99, 80, 60, 40],
                rates: [70, 60, 60, 65],
            },
            SAMPLE_RATE,
        );
        let max_step = 1.0 / env.segment_samples(3).min(env.pre_idle_samples()) as f64;
        // release while attacking and while holding
        for release_after in [3, 10_000] {
            env.initialize(0);
            for _ in 0..release_after {
                env.amplitude(0);
            }
            let mut last_amplitude = env.current_amplitude(0);
            env.arm_release(0);
            assert_eq!(env.segment_levels(0).0, last_amplitude);

            let mut last_stage = env.stage(0);
            let mut last_end = env.segment_levels(0).1;
            let mut transitions = Vec::new();
            while env.is_active(0) {
                let amplitude = env.amplitude(0);
                let stage = env.stage(0);
                assert!((amplitude - last_amplitude).abs() <= max_step + 1e-12);
                if stage != last_stage {
                    transitions.push(stage);
                    assert!((amplitude - last_end).abs() < f64::EPSILON);
                    if stage != EnvelopeStage::Idle {
                        assert!((env.segment_levels(0).0 - amplitude).abs() < f64::EPSILON);
                    }
                    last_stage = stage;
                }
                last_end = env.segment_levels(0).1;
                last_amplitude = amplitude;
            }
            assert_eq!(transitions, [EnvelopeStage::PreIdle, EnvelopeStage::Idle]);
            assert_eq!(env.current_amplitude(0), 0.0);
        }
    }

    #[test]
    fn hold_does_not_advance() {
        let mut env = envelope();
        env.initialize(1);
        while env.stage(1) != EnvelopeStage::Hold {
            env.amplitude(1);
        }
        let level = env.current_amplitude(1);
        assert!((level - env.segment_level(2)).abs() < f64::EPSILON);
        for _ in 0..1000 {
            assert_eq!(env.amplitude(1), level);
            assert_eq!(env.stage(1), EnvelopeStage::Hold);
        }
    }

    #[test]
    fn release_runs_into_idle() {
        let mut env = envelope();
        env.initialize(2);
        for _ in 0..5 {
            env.amplitude(2);
        }
        let level = env.current_amplitude(2);
        env.arm_release(2);
        assert_eq!(env.stage(2), EnvelopeStage::Release);
        assert_eq!(env.segment_levels(2), (level, env.segment_level(3)));

        let release_samples = env.segment_samples(3);
        let pre_idle_samples = env.pre_idle_samples();
        assert_eq!(pre_idle_samples, (SAMPLE_RATE / 5) as u64);
        for _ in 0..release_samples {
            env.amplitude(2);
        }
        assert_eq!(env.stage(2), EnvelopeStage::PreIdle);
        for _ in 0..pre_idle_samples - 1 {
            env.amplitude(2);
            assert!(env.is_active(2));
        }
        assert_eq!(env.amplitude(2), 0.0);
        assert_eq!(env.stage(2), EnvelopeStage::Idle);

        // releasing an idle voice does nothing
        env.arm_release(2);
        assert_eq!(env.stage(2), EnvelopeStage::Idle);
    }

    #[test]
    fn retrigger_starts_at_current_amplitude() {
        let mut env = envelope();
        env.initialize(5);
        for _ in 0..env.segment_samples(0) {
            env.amplitude(5);
        }
        env.arm_release(5);
        for _ in 0..3 {
            env.amplitude(5);
        }
        let level = env.current_amplitude(5);
        assert!(level > 0.0);
        env.initialize(5);
        assert_eq!(env.stage(5), EnvelopeStage::Attack);
        assert_eq!(env.segment_levels(5).0, level);
        let next = env.amplitude(5);
        assert!((next - level).abs() < 0.1);
    }

    #[test]
    fn reset_goes_to_idle() {
        let mut env = envelope();
        env.initialize(7);
        env.amplitude(7);
        env.reset(7);
        assert_eq!(env.stage(7), EnvelopeStage::Idle);
        assert_eq!(env.current_amplitude(7), 0.0);
        env.initialize(8);
        env.reset_all();
        assert!(!env.is_active(8));
    }
}
