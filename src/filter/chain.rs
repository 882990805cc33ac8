use four_cc::FourCC;
use strum::Display;

use crate::{
    filter::{Filter, FilterId},
    Error,
};

// -------------------------------------------------------------------------------------------------

/// How a filter stage contributes to the output of a [`FilterChain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FilterMode {
    /// Filters the chain's input and adds the result to the output (parallel routing).
    Sum,
    /// Filters the output of all previous stages and replaces it (serial routing).
    Link,
}

// -------------------------------------------------------------------------------------------------

/// Ordered set of filter stages, applied to the mixed output of an instrument.
///
/// An empty chain passes samples through unchanged. [`FilterMode::Sum`] stages run in parallel
/// on the chain's input, [`FilterMode::Link`] stages process everything accumulated before them.
/// A link stage with nothing accumulated before it processes the chain's input.
///
/// Filter instances are identified by their [`FilterId`] and can be added only once.
#[derive(Debug, Default)]
pub struct FilterChain {
    stages: Vec<(FilterMode, Box<dyn Filter>)>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Iterate over all stages in processing order.
    pub fn iter(&self) -> impl Iterator<Item = (FilterMode, &dyn Filter)> + '_ {
        self.stages
            .iter()
            .map(|(mode, filter)| (*mode, filter.as_ref()))
    }

    /// True when a filter with the given id is part of the chain.
    pub fn contains(&self, filter_id: FilterId) -> bool {
        self.position(filter_id).is_some()
    }

    /// Access a filter in the chain.
    pub fn filter(&self, filter_id: FilterId) -> Option<&dyn Filter> {
        self.position(filter_id)
            .map(|index| self.stages[index].1.as_ref())
    }

    /// Append a filter in [`FilterMode::Sum`] mode. Returns the filter's id.
    pub fn add_sum(&mut self, filter: impl Filter) -> FilterId {
        self.add(FilterMode::Sum, Box::new(filter))
    }

    /// Append a filter in [`FilterMode::Link`] mode. Returns the filter's id.
    pub fn add_link(&mut self, filter: impl Filter) -> FilterId {
        self.add(FilterMode::Link, Box::new(filter))
    }

    /// Append a boxed filter with the given mode. Does nothing when a filter with the same id
    /// already is part of the chain. Returns the filter's id.
    pub fn add(&mut self, mode: FilterMode, filter: Box<dyn Filter>) -> FilterId {
        let filter_id = filter.id();
        if self.contains(filter_id) {
            log::warn!(
                "Filter '{}' with id {filter_id} already is part of the chain, ignoring it",
                filter.name()
            );
        } else {
            log::debug!(
                "Adding filter '{}' with id {filter_id} in {mode} mode",
                filter.name()
            );
            self.stages.push((mode, filter));
        }
        filter_id
    }

    /// Remove a filter from the chain and return it.
    pub fn remove(&mut self, filter_id: FilterId) -> Result<Box<dyn Filter>, Error> {
        let index = self
            .position(filter_id)
            .ok_or(Error::FilterNotFound(filter_id))?;
        let (_, filter) = self.stages.remove(index);
        log::debug!("Removed filter '{}' with id {filter_id}", filter.name());
        Ok(filter)
    }

    /// Exchange the positions of two filters in the chain. Modes stay with their filters.
    pub fn swap(&mut self, filter_a: FilterId, filter_b: FilterId) -> Result<(), Error> {
        let index_a = self
            .position(filter_a)
            .ok_or(Error::FilterNotFound(filter_a))?;
        let index_b = self
            .position(filter_b)
            .ok_or(Error::FilterNotFound(filter_b))?;
        self.stages.swap(index_a, index_b);
        log::debug!("Swapped filters with ids {filter_a} and {filter_b}");
        Ok(())
    }

    /// Remove all filters.
    pub fn clear(&mut self) {
        if !self.stages.is_empty() {
            log::debug!("Clearing {} filters", self.stages.len());
        }
        self.stages.clear();
    }

    /// Set a parameter value of a filter in the chain.
    pub fn set_parameter(
        &mut self,
        filter_id: FilterId,
        parameter_id: FourCC,
        value: f64,
    ) -> Result<(), Error> {
        let index = self
            .position(filter_id)
            .ok_or(Error::FilterNotFound(filter_id))?;
        self.stages[index].1.set_parameter(parameter_id, value)
    }

    /// Reset the history of all filters.
    pub fn reset(&mut self) {
        for (_, filter) in &mut self.stages {
            filter.reset();
        }
    }

    /// Run a single sample through all stages.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        if self.stages.is_empty() {
            return input;
        }
        let mut output = 0.0;
        let mut has_output = false;
        for (mode, filter) in &mut self.stages {
            match mode {
                FilterMode::Sum => output += filter.apply(input),
                FilterMode::Link => {
                    let source = if has_output { output } else { input };
                    output = filter.apply(source);
                }
            }
            has_output = true;
        }
        output
    }

    fn position(&self, filter_id: FilterId) -> Option<usize> {
        self.stages
            .iter()
            .position(|(_, filter)| filter.id() == filter_id)
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        filter::{biquad::BiquadFilter, distortion::Distortion},
        parameter::Parameter,
    };

    /// Multiplies by a constant factor.
    #[derive(Debug)]
    struct Scale {
        id: FilterId,
        factor: f64,
    }

    impl Filter for Scale {
        fn name(&self) -> &'static str {
            "Scale"
        }
        fn id(&self) -> FilterId {
            self.id
        }
        fn parameters(&self) -> Vec<&dyn Parameter> {
            Vec::new()
        }
        fn set_parameter(&mut self, _id: FourCC, value: f64) -> Result<(), Error> {
            self.factor = value;
            Ok(())
        }
        fn apply(&mut self, sample: f64) -> f64 {
            sample * self.factor
        }
    }

    fn scale(id: FilterId, factor: f64) -> Scale {
        Scale { id, factor }
    }

    #[test]
    fn empty_chain_passes_through() {
        let mut chain = FilterChain::new();
        for input in [0.0, 1.0, -0.5, 0.123] {
            assert_eq!(chain.process(input), input);
        }
    }

    #[test]
    fn neutral_link_passes_through() {
        let mut chain = FilterChain::new();
        chain.add_link(BiquadFilter::neutral(44100));
        for input in [0.0, 1.0, -0.5, 0.123] {
            assert_eq!(chain.process(input), input);
        }
    }

    #[test]
    fn sum_and_link_routing() {
        let mut chain = FilterChain::new();
        chain.add_sum(scale(1, 2.0));
        chain.add_sum(scale(2, 3.0));
        assert_eq!(chain.process(1.0), 5.0);
        chain.add_link(scale(3, 0.5));
        assert_eq!(chain.process(1.0), 2.5);

        let mut chain = FilterChain::new();
        chain.add_link(scale(1, 2.0));
        chain.add_link(scale(2, 3.0));
        chain.add_sum(scale(3, 10.0));
        assert_eq!(chain.process(1.0), 16.0);
    }

    #[test]
    fn filters_are_a_set() {
        let mut chain = FilterChain::new();
        assert_eq!(chain.add_sum(scale(7, 2.0)), 7);
        chain.add_link(scale(7, 3.0));
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.process(1.0), 2.0);
    }

    #[test]
    fn remove_swap_and_clear() -> Result<(), Error> {
        let mut chain = FilterChain::new();
        chain.add_link(scale(1, 2.0));
        chain.add_sum(scale(2, 3.0));
        assert_eq!(chain.process(1.0), 5.0);
        chain.swap(1, 2)?;
        let order = chain.iter().map(|(mode, f)| (mode, f.id())).collect::<Vec<_>>();
        assert_eq!(order, vec![(FilterMode::Sum, 2), (FilterMode::Link, 1)]);
        assert_eq!(chain.process(1.0), 6.0);
        assert!(matches!(chain.swap(1, 9), Err(Error::FilterNotFound(9))));

        let removed = chain.remove(2)?;
        assert_eq!(removed.id(), 2);
        assert!(!chain.contains(2));
        assert!(chain.remove(2).is_err());
        assert_eq!(chain.process(1.0), 2.0);

        chain.clear();
        assert!(chain.is_empty());
        assert_eq!(chain.process(0.7), 0.7);
        Ok(())
    }

    #[test]
    fn parameters_are_routed() -> Result<(), Error> {
        let mut chain = FilterChain::new();
        let distortion = chain.add_link(Distortion::new(1.0));
        chain.set_parameter(distortion, Distortion::LEVEL_ID, 10.0)?;
        let parameter_count = chain
            .filter(distortion)
            .map(|filter| filter.parameters().len());
        assert_eq!(parameter_count, Some(2));
        assert!(matches!(
            chain.set_parameter(distortion + 1000, Distortion::LEVEL_ID, 1.0),
            Err(Error::FilterNotFound(_))
        ));
        assert!(matches!(
            chain.set_parameter(distortion, FourCC(*b"????"), 1.0),
            Err(Error::ParameterError(_))
        ));
        Ok(())
    }
}
