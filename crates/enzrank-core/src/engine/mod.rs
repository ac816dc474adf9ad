//! # Engine Module
//!
//! This module implements the stage logic of an EnzRank run: placing the ligand,
//! scoring mutation sets through the model interfaces, aggregating replicate
//! scores into a ranking, and checking that ranking against experimental labels.
//!
//! ## Overview
//!
//! Every function in the engine is synchronous and free of I/O. Scorers are
//! reached only through the traits in [`crate::core::scoring`], and all results
//! are returned as owned values or appended to stage-scoped ledgers, so nothing
//! here depends on the order in which concurrent work completes.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Tie epsilon, proximity radius, graft tolerance and objective
//! - **Grafting** ([`grafting`]) - Anchor-based superposition of a ligand template
//! - **Ensemble Ranking** ([`ensemble`]) - Mean, dispersion and tie-broken ranks
//! - **Validation** ([`validation`]) - Ordering comparison and mutation recovery
//! - **Candidate Enumeration** ([`enumeration`]) - Seeded generation of novel mutation sets
//! - **Tasks** ([`tasks`]) - Parallel scoring of mutation sets and design-site scans
//! - **Stage Tracking** ([`state`]) - The run state machine
//! - **Progress Monitoring** ([`progress`]) - Progress reporting callbacks
//! - **Error Handling** ([`error`]) - The engine error taxonomy and exclusion records

pub mod config;
pub mod enumeration;
pub mod ensemble;
pub mod error;
pub mod grafting;
pub mod progress;
pub mod state;
pub mod tasks;
pub mod validation;
