//! # Workflows Module
//!
//! End-to-end procedures built on the [`Pipeline`](pipeline::Pipeline) state
//! machine.
//!
//! - [`validate`] - retrospective: graft, score and rank the experimentally
//!   characterized mutation sets, then compare the ranking with their labels.
//!   Optionally scans the binding site with the design model and checks which
//!   predictions were observed experimentally.
//! - [`predict`] - prospective: enumerate novel candidates around fixed
//!   substitutions, score and rank them, and keep the best.

pub mod pipeline;
pub mod predict;
pub mod validate;
