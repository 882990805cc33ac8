//! Filter coefficient math and filter state implementations.

pub mod biquad;
