//! Common, shared DSP tools for filters.

pub mod filters;
