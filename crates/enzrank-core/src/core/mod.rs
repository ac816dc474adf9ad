//! # Core Module
//!
//! This module provides the stateless building blocks of EnzRank: the data models
//! describing a run's inputs, the contracts of the external predictive models, and
//! the numerical geometry shared by the engine.
//!
//! ## Overview
//!
//! Nothing in this layer holds run state. Every type is either an immutable input
//! (the reference sequence, the prepared structure, mutation sets) or a pure
//! function over such inputs (validation, superposition, score checks).
//!
//! ## Architecture
//!
//! - **Input Representation** ([`models`]) - Amino acids, sequences, mutation sets and
//!   binding-site geometry
//! - **Model Contracts** ([`scoring`]) - The fitness and design scorer traits, their
//!   checked invocation, and the score records a run accumulates
//! - **Geometry** ([`utils`]) - Least-squares superposition and substituent placement

pub mod models;
pub mod scoring;
pub mod utils;
