//! Computational units run by the workflows between stage transitions.
//!
//! Each task works on immutable, shared inputs and returns its results by value,
//! so independent units can be spread over the rayon pool when the `parallel`
//! feature is enabled.

pub mod design_scan;
pub mod scoring;
