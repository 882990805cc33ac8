use std::sync::Arc;

use crossbeam_queue::ArrayQueue;

use super::{check_key, check_voice, GAIN};
use crate::Error;

// -------------------------------------------------------------------------------------------------

/// Note and gain events, sent from control threads to an [`Instrument`](super::Instrument).
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ControlEvent {
    PressKey { voice: usize, frequency: f64 },
    ReleaseKey { voice: usize },
    ReleaseAllVoices,
    SetGain { gain: f64 },
}

// -------------------------------------------------------------------------------------------------

/// Sends note events to an [`Instrument`](super::Instrument) from other threads.
///
/// Events are pushed into a bounded lock-free queue and get applied at the start of the
/// instrument's next [`sample`](super::Instrument::sample) call, so a MIDI dispatcher thread can
/// drive an instrument that is owned by the audio thread. Controllers are cheap to clone.
#[derive(Debug, Clone)]
pub struct InstrumentController {
    events: Arc<ArrayQueue<ControlEvent>>,
}

impl InstrumentController {
    pub(crate) fn new(events: Arc<ArrayQueue<ControlEvent>>) -> Self {
        Self { events }
    }

    /// Start a note with the given frequency on the given voice.
    ///
    /// Invalid voices or frequencies are ignored with a warning and never reach the instrument.
    pub fn press_key(&self, voice: usize, frequency: f64) -> Result<(), Error> {
        if !check_key(voice, frequency) {
            return Ok(());
        }
        self.send(ControlEvent::PressKey { voice, frequency })
    }

    /// Release the note of the given voice. Invalid voices are ignored with a warning.
    pub fn release_key(&self, voice: usize) -> Result<(), Error> {
        if !check_voice(voice) {
            return Ok(());
        }
        self.send(ControlEvent::ReleaseKey { voice })
    }

    /// Release all playing voices.
    pub fn release_all_voices(&self) -> Result<(), Error> {
        self.send(ControlEvent::ReleaseAllVoices)
    }

    /// Change the instrument's output gain. Values are clamped to \[0, 10\].
    pub fn set_gain(&self, gain: f64) -> Result<(), Error> {
        let clamped = GAIN.clamp_value(gain);
        if clamped != gain {
            log::warn!("Gain {gain} is out of range, clamped to {clamped}");
        }
        self.send(ControlEvent::SetGain { gain: clamped })
    }

    fn send(&self, event: ControlEvent) -> Result<(), Error> {
        self.events.push(event).map_err(|event| {
            Error::SendError(format!(
                "Event queue is full (capacity {}), dropping {event:?}",
                self.events.capacity()
            ))
        })
    }
}

// -------------------------------------------------------------------------------------------------
