use std::sync::Arc;

use crossbeam_queue::ArrayQueue;
use four_cc::FourCC;

use crate::{
    algorithm::Algorithm,
    filter::chain::FilterChain,
    parameter::{FloatParameter, FloatParameterValue},
    preset::{AlgorithmTopology, OperatorPreset},
    utils::{note_to_frequency, VOICE_COUNT},
    Error,
};

// -------------------------------------------------------------------------------------------------

mod controller;
pub use controller::InstrumentController;
use controller::ControlEvent;

// -------------------------------------------------------------------------------------------------

/// Output gain of an instrument.
pub const GAIN: FloatParameter = FloatParameter::new(FourCC(*b"gain"), "Gain", 0.0..=10.0, 1.0);

// -------------------------------------------------------------------------------------------------

/// Configuration of an [`Instrument`].
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Initial output gain in range \[0, 10\].
    pub gain: f64,
    /// Max number of pending events in the [`InstrumentController`] queue.
    pub event_queue_capacity: usize,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            gain: GAIN.default_plain_value(),
            event_queue_capacity: 256,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Polyphonic FM instrument: a voice pool driving an operator [`Algorithm`], followed by a gain
/// stage and a [`FilterChain`].
///
/// Voices are identified by keyboard positions in `0..VOICE_COUNT`. Pressing a key activates its
/// voice, releasing it starts the envelope release. Voices deactivate on their own as soon as
/// all carrier envelopes ran into idle.
///
/// [`Instrument::sample`] is real-time safe: it does not allocate, lock or block. Presets must
/// be loaded outside of the audio path. To drive an instrument which is owned by the audio
/// thread, send events via an [`InstrumentController`].
#[derive(Debug)]
pub struct Instrument {
    sample_rate: u32,
    gain: FloatParameterValue,
    algorithm: Option<Algorithm>,
    filter_chain: FilterChain,
    active_voices: Vec<usize>,
    playing_voices: Box<[bool]>,
    events: Arc<ArrayQueue<ControlEvent>>,
}

impl Instrument {
    /// Create a new, silent instrument without a preset.
    pub fn new(config: InstrumentConfig) -> Self {
        let mut gain = FloatParameterValue::from_description(GAIN);
        gain.set_value_clamped(config.gain);
        Self {
            sample_rate: config.sample_rate.max(1),
            gain,
            algorithm: None,
            filter_chain: FilterChain::new(),
            active_voices: Vec::with_capacity(VOICE_COUNT),
            playing_voices: vec![false; VOICE_COUNT].into_boxed_slice(),
            events: Arc::new(ArrayQueue::new(config.event_queue_capacity.max(1))),
        }
    }

    /// Create a new instrument and load the given preset.
    pub fn with_preset(
        config: InstrumentConfig,
        topology: AlgorithmTopology,
        presets: &[OperatorPreset],
    ) -> Result<Self, Error> {
        let mut instrument = Self::new(config);
        instrument.load_preset(topology, presets)?;
        Ok(instrument)
    }

    /// Output sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn gain(&self) -> f64 {
        self.gain.value()
    }

    /// Set a new output gain. Values are clamped to \[0, 10\].
    pub fn set_gain(&mut self, gain: f64) {
        self.gain.set_value_clamped(gain);
    }

    /// Validate and load a new preset, replacing the current operator graph.
    ///
    /// All playing voices are stopped and the filter chain gets cleared. When the preset is
    /// invalid, an error is returned and the current preset stays active.
    ///
    /// NB: this allocates, so it must not be called in the real-time audio path.
    pub fn load_preset(
        &mut self,
        topology: AlgorithmTopology,
        presets: &[OperatorPreset],
    ) -> Result<(), Error> {
        let algorithm = Algorithm::new(topology, presets, self.sample_rate)?;
        log::info!(
            "Loaded preset with {} operators and {} carriers",
            algorithm.operators().len(),
            algorithm.topology().carriers().len()
        );
        self.algorithm = Some(algorithm);
        for voice in self.active_voices.drain(..) {
            self.playing_voices[voice] = false;
        }
        self.filter_chain.clear();
        Ok(())
    }

    /// The currently loaded operator graph, if any.
    pub fn algorithm(&self) -> Option<&Algorithm> {
        self.algorithm.as_ref()
    }

    pub fn filter_chain(&self) -> &FilterChain {
        &self.filter_chain
    }

    /// Mutable access to the filter chain, to add, remove or reorder filters.
    pub fn filter_chain_mut(&mut self) -> &mut FilterChain {
        &mut self.filter_chain
    }

    /// Create a new controller which sends events to this instrument.
    pub fn controller(&self) -> InstrumentController {
        InstrumentController::new(Arc::clone(&self.events))
    }

    /// Start a note with the given frequency in Hz on the given voice. Pressing an already
    /// playing voice retriggers its envelopes from their current amplitude.
    pub fn press_key(&mut self, voice: usize, frequency: f64) {
        if !check_key(voice, frequency) {
            return;
        }
        if self.algorithm.is_none() {
            log::warn!("Ignoring key press of voice {voice}: no preset loaded");
            return;
        }
        self.start_voice(voice, frequency);
    }

    /// Start a note on the given voice, using the voice's equal tempered keyboard frequency.
    pub fn press_note(&mut self, voice: usize) {
        self.press_key(voice, note_to_frequency(voice as f64));
    }

    /// Release the note of the given voice. The voice stays active until its release and
    /// fade-out finished.
    pub fn release_key(&mut self, voice: usize) {
        if check_voice(voice) {
            self.stop_voice(voice);
        }
    }

    /// Release all voices.
    pub fn release_all_voices(&mut self) {
        if let Some(algorithm) = self.algorithm.as_mut() {
            algorithm.stop_all();
        }
    }

    /// Number of voices which currently produce sound.
    pub fn active_voice_count(&self) -> usize {
        self.active_voices.len()
    }

    /// Currently active voice ids, in no specific order.
    pub fn active_voices(&self) -> &[usize] {
        &self.active_voices
    }

    pub fn is_voice_active(&self, voice: usize) -> bool {
        self.playing_voices.get(voice).copied().unwrap_or(false)
    }

    /// Calculate the next mono output sample.
    ///
    /// Applies pending controller events, sums all active voices, applies the gain and runs the
    /// result through the filter chain. Voices whose carriers all ran into idle get removed.
    pub fn sample(&mut self) -> f64 {
        Self::assert_no_alloc(|| self.process_sample())
    }

    /// Fill the given buffer with consecutive samples.
    pub fn render(&mut self, output: &mut [f64]) {
        Self::assert_no_alloc(|| {
            for sample in output.iter_mut() {
                *sample = self.process_sample();
            }
        })
    }

    fn process_sample(&mut self) -> f64 {
        while let Some(event) = self.events.pop() {
            self.handle_event(event);
        }
        let mut output = 0.0;
        if let Some(algorithm) = self.algorithm.as_mut() {
            let mut index = 0;
            while index < self.active_voices.len() {
                let voice = self.active_voices[index];
                output += algorithm.sample(voice);
                if algorithm.is_voice_active(voice) {
                    index += 1;
                } else {
                    self.active_voices.swap_remove(index);
                    self.playing_voices[voice] = false;
                }
            }
        }
        self.filter_chain.process(output * self.gain.value())
    }

    // events got validated by the controller: apply them without logging
    fn handle_event(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::PressKey { voice, frequency } => self.start_voice(voice, frequency),
            ControlEvent::ReleaseKey { voice } => self.stop_voice(voice),
            ControlEvent::ReleaseAllVoices => self.release_all_voices(),
            ControlEvent::SetGain { gain } => {
                self.gain.set_value_clamped(GAIN.clamp_value(gain));
            }
        }
    }

    fn start_voice(&mut self, voice: usize, frequency: f64) {
        if voice >= VOICE_COUNT || !frequency.is_finite() || frequency < 0.0 {
            return;
        }
        let Some(algorithm) = self.algorithm.as_mut() else {
            return;
        };
        algorithm.start(voice, frequency);
        if !self.playing_voices[voice] {
            self.playing_voices[voice] = true;
            self.active_voices.push(voice);
        }
    }

    fn stop_voice(&mut self, voice: usize) {
        if let Some(algorithm) = self.algorithm.as_mut() {
            algorithm.stop(voice);
        }
    }

    fn assert_no_alloc<T, F: FnOnce() -> T>(func: F) -> T {
        #[cfg(feature = "assert-allocs")]
        return assert_no_alloc::assert_no_alloc::<T, F>(func);

        #[cfg(not(feature = "assert-allocs"))]
        return func();
    }
}

// -------------------------------------------------------------------------------------------------

fn check_voice(voice: usize) -> bool {
    if voice >= VOICE_COUNT {
        log::warn!("Ignoring event for invalid voice {voice}");
        return false;
    }
    true
}

fn check_key(voice: usize, frequency: f64) -> bool {
    if !check_voice(voice) {
        return false;
    }
    if !frequency.is_finite() || frequency < 0.0 {
        log::warn!("Ignoring key press of voice {voice} with invalid frequency {frequency}");
        return false;
    }
    true
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{envelope::EnvelopePreset, filter::distortion::Distortion};

    fn presets(count: usize) -> Vec<OperatorPreset> {
        vec![
            OperatorPreset {
                envelope: EnvelopePreset {
                    levels: [99, 90, 80, 0],
                    rates: [90, 80, 80, 85],
                },
                ..OperatorPreset::default()
            };
            count
        ]
    }

    fn instrument() -> Result<Instrument, Error> {
        Instrument::with_preset(
            InstrumentConfig {
                sample_rate: 8000,
                ..InstrumentConfig::default()
            },
            AlgorithmTopology::new(2).with_carrier(0).with_modulation(1, 0),
            &presets(2),
        )
    }

    #[test]
    fn silent_without_preset() {
        let mut instrument = Instrument::new(InstrumentConfig::default());
        instrument.press_key(10, 440.0);
        assert_eq!(instrument.active_voice_count(), 0);
        for _ in 0..100 {
            assert_eq!(instrument.sample(), 0.0);
        }
    }

    #[test]
    fn invalid_presets_keep_the_current_one() -> Result<(), Error> {
        let mut instrument = instrument()?;
        let result = instrument.load_preset(AlgorithmTopology::new(2).with_carrier(5), &presets(2));
        assert!(matches!(result, Err(Error::InvalidTopology(_))));
        assert_eq!(instrument.algorithm().map(|a| a.operators().len()), Some(2));
        Ok(())
    }

    #[test]
    fn loading_presets_clears_voices_and_filters() -> Result<(), Error> {
        let mut instrument = instrument()?;
        instrument.filter_chain_mut().add_link(Distortion::new(2.0));
        instrument.press_note(60);
        instrument.sample();
        assert_eq!(instrument.active_voices(), &[60]);
        instrument.load_preset(AlgorithmTopology::new(1).with_carrier(0), &presets(1))?;
        assert_eq!(instrument.active_voice_count(), 0);
        assert!(!instrument.is_voice_active(60));
        assert!(instrument.filter_chain().is_empty());
        Ok(())
    }

    #[test]
    fn invalid_keys_are_ignored() -> Result<(), Error> {
        let mut instrument = instrument()?;
        instrument.press_key(VOICE_COUNT, 440.0);
        instrument.press_key(1, f64::NAN);
        instrument.press_key(2, -10.0);
        instrument.release_key(VOICE_COUNT + 10);
        assert_eq!(instrument.active_voice_count(), 0);
        Ok(())
    }

    #[test]
    fn voices_are_tracked() -> Result<(), Error> {
        let mut instrument = instrument()?;
        instrument.press_note(60);
        instrument.press_note(64);
        instrument.press_note(60);
        assert_eq!(instrument.active_voice_count(), 2);
        assert!(instrument.is_voice_active(64));
        for _ in 0..100 {
            instrument.sample();
        }
        instrument.release_all_voices();
        let mut samples = 0;
        while instrument.active_voice_count() > 0 {
            instrument.sample();
            samples += 1;
            assert!(samples < 8000 * 10);
        }
        assert!(!instrument.is_voice_active(60));
        assert_eq!(instrument.sample(), 0.0);
        Ok(())
    }

    #[test]
    fn gain_is_clamped() {
        let mut instrument = Instrument::new(InstrumentConfig {
            gain: 20.0,
            ..InstrumentConfig::default()
        });
        assert_eq!(instrument.gain(), 10.0);
        instrument.set_gain(-1.0);
        assert_eq!(instrument.gain(), 0.0);
        instrument.set_gain(2.5);
        assert_eq!(instrument.gain(), 2.5);
    }

    #[test]
    fn controller_events_are_applied_on_next_sample() -> Result<(), Error> {
        let mut instrument = instrument()?;
        let controller = instrument.controller();
        controller.press_key(69, 440.0)?;
        controller.set_gain(0.5)?;
        assert_eq!(instrument.active_voice_count(), 0);
        instrument.sample();
        assert!(instrument.is_voice_active(69));
        assert_eq!(instrument.gain(), 0.5);
        controller.release_key(69)?;
        instrument.sample();
        let stage = instrument
            .algorithm()
            .and_then(|algorithm| algorithm.operator(0))
            .map(|op| op.stage(69));
        assert_eq!(stage, Some(crate::envelope::EnvelopeStage::Release));
        Ok(())
    }

    #[test]
    fn invalid_controller_events_never_reach_the_audio_path() -> Result<(), Error> {
        let mut instrument = instrument()?;
        let controller = instrument.controller();
        controller.press_key(VOICE_COUNT, 440.0)?;
        controller.press_key(3, f64::INFINITY)?;
        controller.release_key(VOICE_COUNT)?;
        controller.set_gain(-5.0)?;
        assert_eq!(instrument.events.len(), 1);
        instrument.sample();
        assert!(instrument.events.is_empty());
        assert_eq!(instrument.active_voice_count(), 0);
        assert_eq!(instrument.gain(), 0.0);

        // without a preset, queued key presses are dropped
        let mut instrument = Instrument::new(InstrumentConfig::default());
        instrument.controller().press_key(10, 440.0)?;
        assert_eq!(instrument.sample(), 0.0);
        assert_eq!(instrument.active_voice_count(), 0);
        Ok(())
    }

    #[test]
    fn render_fills_buffers() -> Result<(), Error> {
        let mut rendered = instrument()?;
        let mut sampled = instrument()?;
        rendered.press_note(57);
        sampled.press_note(57);
        let mut buffer = vec![0.0; 256];
        rendered.render(&mut buffer);
        for sample in buffer {
            assert_eq!(sample, sampled.sample());
        }
        Ok(())
    }
}
