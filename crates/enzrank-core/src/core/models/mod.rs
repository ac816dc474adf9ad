//! # Core Models Module
//!
//! This module contains the plain data structures that describe the inputs of a run:
//! the reference protein, its prepared binding-site geometry, the ligand template to
//! graft, and the mutation sets to be scored.
//!
//! ## Key Components
//!
//! - [`residue`] - The twenty canonical amino acids and their one/three-letter codes
//! - [`sequence`] - The reference sequence, sequence validation and residue numbering
//! - [`mutation`] - Point substitutions (`W192H` notation) and named mutation sets
//! - [`complex`] - Reference anchor geometry, ligand templates and grafted ligands
//!
//! ## Usage
//!
//! ```ignore
//! use enzrank::core::models::{mutation::MutationSet, sequence::ReferenceSequence};
//!
//! let reference = ReferenceSequence::new("MWAVGT")?;
//! let set = MutationSet::from_notation("mutant_1", &["W2H", "V4G"], Some(86.0))?;
//! let mutant = reference.apply(&set)?;
//! ```
//!
//! All models are immutable once handed to the engine; they are shared by reference
//! across scoring tasks without synchronization.

pub mod complex;
pub mod mutation;
pub mod residue;
pub mod sequence;
