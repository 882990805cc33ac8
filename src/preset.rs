//! Instrument presets: operator modulation topologies and per-operator settings.

use four_cc::FourCC;

use crate::{
    breakpoint::BreakpointPreset,
    envelope::EnvelopePreset,
    parameter::{FloatParameter, IntegerParameter},
    waveform::Waveform,
    Error,
};

mod dx7;

// -------------------------------------------------------------------------------------------------

/// Maximum number of operators in a topology.
pub const MAX_OPERATORS: usize = 36;

// -------------------------------------------------------------------------------------------------

pub const OUTPUT_LEVEL: IntegerParameter =
    IntegerParameter::new(FourCC(*b"olvl"), "Output Level", 0..=99, 99);
pub const FEEDBACK: IntegerParameter =
    IntegerParameter::new(FourCC(*b"fdbk"), "Feedback", -7..=7, 0);
pub const ENVELOPE_LEVEL: IntegerParameter =
    IntegerParameter::new(FourCC(*b"elvl"), "Envelope Level", 0..=99, 99);
pub const ENVELOPE_RATE: IntegerParameter =
    IntegerParameter::new(FourCC(*b"erat"), "Envelope Rate", 0..=99, 99);
pub const FREQUENCY_RATIO: FloatParameter =
    FloatParameter::new(FourCC(*b"frat"), "Frequency Ratio", 0.0..=32.0, 1.0);

// -------------------------------------------------------------------------------------------------

/// A modulation connection: the `modulator` operator's output phase-modulates `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModulationEdge {
    pub modulator: usize,
    pub target: usize,
}

/// The feedback connection of a topology. May be self-referential.
///
/// Operators don't evaluate feedback recursively: the `source` operator instead adds an
/// additive harmonic approximation of its own feedback.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackEdge {
    pub source: usize,
    pub target: usize,
}

// -------------------------------------------------------------------------------------------------

/// Operator modulation graph of an instrument: carriers, modulation edges and one feedback edge.
///
/// Topologies are built with the `with_` builder functions and get validated when they are
/// loaded into an [`Instrument`](crate::Instrument).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmTopology {
    operator_count: usize,
    carriers: Vec<usize>,
    feedback: FeedbackEdge,
    modulations: Vec<ModulationEdge>,
}

impl AlgorithmTopology {
    /// Create a new topology for the given number of operators without carriers and modulation
    /// edges, and a self feedback on the first operator.
    pub fn new(operator_count: usize) -> Self {
        Self {
            operator_count,
            carriers: Vec::new(),
            feedback: FeedbackEdge::default(),
            modulations: Vec::new(),
        }
    }

    /// Create one of the 32 classic 6-operator DX7 algorithms. `number` is 1-based, as printed
    /// on the DX7. Operator 1 of the DX7 is operator index 0 here.
    pub fn dx7(number: u8) -> Result<Self, Error> {
        dx7::algorithm(number)
    }

    /// Add a carrier operator.
    pub fn with_carrier(mut self, operator: usize) -> Self {
        self.carriers.push(operator);
        self
    }

    /// Add multiple carrier operators.
    pub fn with_carriers(mut self, operators: impl IntoIterator<Item = usize>) -> Self {
        self.carriers.extend(operators);
        self
    }

    /// Set the feedback edge.
    pub fn with_feedback(mut self, source: usize, target: usize) -> Self {
        self.feedback = FeedbackEdge { source, target };
        self
    }

    /// Add a modulation edge from `modulator` to `target`.
    pub fn with_modulation(mut self, modulator: usize, target: usize) -> Self {
        self.modulations.push(ModulationEdge { modulator, target });
        self
    }

    pub fn operator_count(&self) -> usize {
        self.operator_count
    }

    pub fn carriers(&self) -> &[usize] {
        &self.carriers
    }

    pub fn feedback(&self) -> FeedbackEdge {
        self.feedback
    }

    pub fn modulations(&self) -> &[ModulationEdge] {
        &self.modulations
    }

    /// Modulators of the given target operator, in edge order.
    pub fn modulators_of(&self, target: usize) -> impl Iterator<Item = usize> + '_ {
        self.modulations
            .iter()
            .filter(move |edge| edge.target == target)
            .map(|edge| edge.modulator)
    }

    /// Check that the topology can be evaluated: operator indices must be in range, carriers
    /// unique, and modulation edges must form a DAG. The only allowed cycle is the feedback edge.
    pub fn validate(&self) -> Result<(), Error> {
        if self.operator_count == 0 || self.operator_count > MAX_OPERATORS {
            return Err(Error::InvalidTopology(format!(
                "Operator count must be in range [1, {MAX_OPERATORS}], but is {}",
                self.operator_count
            )));
        }
        if self.carriers.is_empty() {
            return Err(Error::InvalidTopology("No carrier operators".to_string()));
        }
        for (index, carrier) in self.carriers.iter().enumerate() {
            self.check_index("Carrier", *carrier)?;
            if self.carriers[..index].contains(carrier) {
                return Err(Error::InvalidTopology(format!(
                    "Carrier operator {carrier} is listed twice"
                )));
            }
        }
        self.check_index("Feedback source", self.feedback.source)?;
        self.check_index("Feedback target", self.feedback.target)?;
        for (index, edge) in self.modulations.iter().enumerate() {
            self.check_index("Modulator", edge.modulator)?;
            self.check_index("Modulation target", edge.target)?;
            if edge.modulator == edge.target {
                return Err(Error::InvalidTopology(format!(
                    "Operator {} modulates itself: use the feedback edge instead",
                    edge.modulator
                )));
            }
            if self.modulations[..index].contains(edge) {
                return Err(Error::InvalidTopology(format!(
                    "Modulation edge {} -> {} is listed twice",
                    edge.modulator, edge.target
                )));
            }
        }
        self.check_acyclic()
    }

    fn check_index(&self, what: &str, operator: usize) -> Result<(), Error> {
        if operator >= self.operator_count {
            Err(Error::InvalidTopology(format!(
                "{what} index {operator} is out of range (operator count is {})",
                self.operator_count
            )))
        } else {
            Ok(())
        }
    }

    fn check_acyclic(&self) -> Result<(), Error> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            Visiting,
            Done,
        }
        fn visit(
            topology: &AlgorithmTopology,
            operator: usize,
            marks: &mut [Mark],
        ) -> Result<(), Error> {
            match marks[operator] {
                Mark::Done => return Ok(()),
                Mark::Visiting => {
                    return Err(Error::InvalidTopology(format!(
                        "Modulation edges form a cycle through operator {operator}"
                    )))
                }
                Mark::Unvisited => {}
            }
            marks[operator] = Mark::Visiting;
            for modulator in topology.modulators_of(operator) {
                visit(topology, modulator, marks)?;
            }
            marks[operator] = Mark::Done;
            Ok(())
        }
        let mut marks = vec![Mark::Unvisited; self.operator_count];
        for operator in 0..self.operator_count {
            visit(self, operator, &mut marks)?;
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

/// Settings of a single operator.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorPreset {
    pub waveform: Waveform,
    /// Output level index in range 0-99.
    pub output_level: u8,
    /// Feedback depth in range -7..=7. Only used on the topology's feedback source operator.
    pub feedback: i8,
    /// Multiplier of the played note frequency in range \[0, 32\].
    pub frequency_ratio: f64,
    pub envelope: EnvelopePreset,
    pub breakpoint: BreakpointPreset,
}

impl OperatorPreset {
    /// Returns a copy with all values clamped into their valid ranges.
    pub fn clamped(&self) -> Self {
        let clamp_index = |parameter: &IntegerParameter, value: u8| {
            parameter.clamp_value_logged(value as i32) as u8
        };
        Self {
            waveform: self.waveform,
            output_level: clamp_index(&OUTPUT_LEVEL, self.output_level),
            feedback: FEEDBACK.clamp_value_logged(self.feedback as i32) as i8,
            frequency_ratio: {
                let ratio = FREQUENCY_RATIO.clamp_value(self.frequency_ratio);
                if ratio != self.frequency_ratio {
                    log::warn!(
                        "Frequency ratio {} is out of range, clamped to {ratio}",
                        self.frequency_ratio
                    );
                }
                ratio
            },
            envelope: EnvelopePreset {
                levels: self
                    .envelope
                    .levels
                    .map(|level| clamp_index(&ENVELOPE_LEVEL, level)),
                rates: self
                    .envelope
                    .rates
                    .map(|rate| clamp_index(&ENVELOPE_RATE, rate)),
            },
            breakpoint: self.breakpoint,
        }
    }
}

impl Default for OperatorPreset {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            output_level: OUTPUT_LEVEL.default_plain_value() as u8,
            feedback: FEEDBACK.default_plain_value() as i8,
            frequency_ratio: FREQUENCY_RATIO.default_plain_value(),
            envelope: EnvelopePreset::default(),
            breakpoint: BreakpointPreset::default(),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Validates a topology together with its operator presets.
pub(crate) fn validate(
    topology: &AlgorithmTopology,
    presets: &[OperatorPreset],
) -> Result<(), Error> {
    topology.validate()?;
    if presets.len() != topology.operator_count() {
        return Err(Error::InvalidPreset(format!(
            "Topology has {} operators, but {} operator presets are given",
            topology.operator_count(),
            presets.len()
        )));
    }
    Ok(())
}

// -------------------------------------------------------------------------------------------------
