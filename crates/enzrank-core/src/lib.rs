//! # EnzRank Core Library
//!
//! Ligand grafting and reproducible ensemble ranking of enzyme mutation sets.
//!
//! Mutation sets are scored by two opaque predictive models (a sequence-level
//! fitness scorer and a position-level design scorer evaluated against a grafted
//! ligand), their replicate scores are aggregated into a deterministic ranking,
//! and the ranking is checked against experimental labels.
//!
//! ## Architecture
//!
//! - **[`core`]** - stateless data models (sequences, substitutions, complexes),
//!   geometry utilities, the scorer interfaces and score bookkeeping.
//!
//! - **[`engine`]** - stage logic: grafting, parallel scoring, ensemble ranking,
//!   validation, candidate enumeration, configuration and the stage machine.
//!
//! - **[`workflows`]** - the public entry points that run complete procedures.

pub mod core;
pub mod engine;
pub mod workflows;
