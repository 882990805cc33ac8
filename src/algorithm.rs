//! Evaluation of an operator modulation graph for all voices of an instrument.

use crate::{
    operator::Operator,
    preset::{self, AlgorithmTopology, OperatorPreset},
    utils::VOICE_COUNT,
    Error,
};

// -------------------------------------------------------------------------------------------------

/// Owns the operators of a loaded preset and evaluates them as a modulation DAG.
///
/// Each call to [`Algorithm::sample`] evaluates the carriers of one voice. Modulators are
/// evaluated recursively, depth first, and averaged per target. Modulators which feed more than
/// one target are only evaluated once per sample, so their envelopes advance exactly once.
#[derive(Debug, Clone)]
pub struct Algorithm {
    topology: AlgorithmTopology,
    operators: Vec<Operator>,
    times: Box<[u64]>,
    evaluation: u64,
}

impl Algorithm {
    /// Validates the topology and presets and builds the operator graph.
    pub fn new(
        topology: AlgorithmTopology,
        presets: &[OperatorPreset],
        sample_rate: u32,
    ) -> Result<Self, Error> {
        preset::validate(&topology, presets)?;
        let feedback_source = topology.feedback().source;
        let operators = presets
            .iter()
            .enumerate()
            .map(|(index, preset)| {
                Operator::new(
                    index,
                    preset,
                    index == feedback_source,
                    topology.modulators_of(index).collect(),
                    sample_rate,
                )
            })
            .collect();
        Ok(Self {
            topology,
            operators,
            times: vec![0; VOICE_COUNT].into_boxed_slice(),
            evaluation: 0,
        })
    }

    pub fn topology(&self) -> &AlgorithmTopology {
        &self.topology
    }

    /// Access to a single operator of the graph.
    pub fn operator(&self, index: usize) -> Option<&Operator> {
        self.operators.get(index)
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    /// Elapsed samples of the given voice since its last cold start.
    pub fn voice_time(&self, voice: usize) -> u64 {
        self.times.get(voice).copied().unwrap_or(0)
    }

    /// True while at least one carrier of the given voice has a non-idle envelope.
    #[inline]
    pub fn is_voice_active(&self, voice: usize) -> bool {
        self.topology
            .carriers()
            .iter()
            .any(|carrier| self.operators[*carrier].is_active(voice))
    }

    /// Start a note with the given frequency on a voice, cascading into all modulators.
    ///
    /// The voice's time is reset when none of its carriers were active, so reused voices
    /// always start at phase zero. Retriggered voices keep running their time.
    pub fn start(&mut self, voice: usize, frequency: f64) {
        if voice >= VOICE_COUNT {
            return;
        }
        if !self.is_voice_active(voice) {
            self.times[voice] = 0;
        }
        let mut visited = 0_u64;
        for carrier in self.topology.carriers() {
            Self::start_operator(&mut self.operators, *carrier, voice, frequency, &mut visited);
        }
    }

    /// Release a voice, cascading into all modulators.
    pub fn stop(&mut self, voice: usize) {
        if voice >= VOICE_COUNT {
            return;
        }
        let mut visited = 0_u64;
        for carrier in self.topology.carriers() {
            Self::stop_operator(&mut self.operators, *carrier, voice, &mut visited);
        }
    }

    /// Release all voices.
    pub fn stop_all(&mut self) {
        for voice in 0..VOICE_COUNT {
            self.stop(voice);
        }
    }

    /// Immediately silence all voices and reset their time.
    pub fn reset_all(&mut self) {
        for operator in &mut self.operators {
            operator.reset_all();
        }
        self.times.fill(0);
    }

    /// Calculate the next sample of the given voice: the average of all carrier frames.
    pub fn sample(&mut self, voice: usize) -> f64 {
        if voice >= VOICE_COUNT {
            return 0.0;
        }
        self.evaluation += 1;
        let time = self.times[voice];
        let carriers = self.topology.carriers();
        let mut output = 0.0;
        for carrier in carriers {
            output += Self::evaluate(&mut self.operators, *carrier, voice, time, self.evaluation);
        }
        self.times[voice] += 1;
        output / carriers.len() as f64
    }

    fn evaluate(
        operators: &mut [Operator],
        index: usize,
        voice: usize,
        time: u64,
        evaluation: u64,
    ) -> f64 {
        if let Some(frame) = operators[index].cached_frame(voice, evaluation) {
            return frame;
        }
        let modulator_count = operators[index].modulators().len();
        let mut modulation = 0.0;
        for modulator_index in 0..modulator_count {
            let modulator = operators[index].modulators()[modulator_index];
            modulation += Self::evaluate(operators, modulator, voice, time, evaluation);
        }
        if modulator_count > 0 {
            modulation /= modulator_count as f64;
        }
        operators[index].frame(voice, modulation, 0.0, time, evaluation)
    }

    fn start_operator(
        operators: &mut [Operator],
        index: usize,
        voice: usize,
        frequency: f64,
        visited: &mut u64,
    ) {
        if *visited & (1 << index) != 0 {
            return;
        }
        *visited |= 1 << index;
        operators[index].start(voice, frequency);
        for modulator_index in 0..operators[index].modulators().len() {
            let modulator = operators[index].modulators()[modulator_index];
            Self::start_operator(operators, modulator, voice, frequency, visited);
        }
    }

    fn stop_operator(operators: &mut [Operator], index: usize, voice: usize, visited: &mut u64) {
        if *visited & (1 << index) != 0 {
            return;
        }
        *visited |= 1 << index;
        for modulator_index in 0..operators[index].modulators().len() {
            let modulator = operators[index].modulators()[modulator_index];
            Self::stop_operator(operators, modulator, voice, visited);
        }
        operators[index].stop(voice);
    }
}

// -------------------------------------------------------------------------------------------------
