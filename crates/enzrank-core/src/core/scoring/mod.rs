//! # Scoring Module
//!
//! The fixed interface between the engine and the two upstream predictive models:
//! a sequence-level fitness model and a ligand-aware, position-level design model.
//!
//! ## Overview
//!
//! The engine never computes these scores from first principles. It only relies on
//! their contracts:
//!
//! - **[`FitnessScorer`]** - a pure, deterministic, total function from a full
//!   mutant sequence to one scalar; higher is more plausible. Sequences are
//!   validated by the engine before a scorer ever sees them.
//! - **[`DesignScorer`]** - a pure function from a grafted complex and a batch of
//!   substitutions to one bounded score (0.0 to 1.0) per substitution. Positions
//!   outside the modeled region are an error, never a default score.
//!
//! ## Key Components
//!
//! - [`fitness`] - Fitness evaluation of a mutation set against the reference
//! - [`design`] - Binding-site proximity checks and checked design-score batches
//! - [`tables`] - Table-backed reference implementations of both scorers
//! - [`records`] - Append-only score records produced during a run

pub mod design;
pub mod fitness;
pub mod records;
pub mod tables;

use crate::core::models::complex::GraftedComplex;
use crate::core::models::mutation::ResidueSubstitution;
use crate::core::models::sequence::SequenceValidationError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnsupportedReason {
    OutsideSequence { length: usize },
    NoCoordinates,
    OutsideBindingSite { radius: f64 },
}

impl fmt::Display for UnsupportedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsupportedReason::OutsideSequence { length } => {
                write!(f, "outside the reference sequence (length {})", length)
            }
            UnsupportedReason::NoCoordinates => {
                write!(f, "no coordinates in the prepared structure")
            }
            UnsupportedReason::OutsideBindingSite { radius } => {
                write!(f, "farther than {:.2} A from the grafted ligand", radius)
            }
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Sequence validation failed: {0}")]
    SequenceValidation(#[from] SequenceValidationError),

    #[error("Unsupported position {position}: {reason}")]
    UnsupportedPosition {
        position: u32,
        reason: UnsupportedReason,
    },

    #[error("No design score is tabulated for substitution {substitution}")]
    MissingEntry { substitution: String },

    #[error("Scorer returned a non-finite value for '{context}'")]
    NonFinite { context: String },

    #[error("Design score {value} for {substitution} is outside [0, 1]")]
    OutOfRange { substitution: String, value: f64 },

    #[error("Design scorer returned {found} scores for {expected} substitutions")]
    BatchLengthMismatch { expected: usize, found: usize },
}

/// A sequence-level model that scores the plausibility of a full protein sequence.
///
/// Implementations must be pure and deterministic: identical input always yields
/// the identical value, and no call may fail on a well-formed canonical sequence.
pub trait FitnessScorer: Sync {
    /// Scores a complete, already validated amino-acid sequence.
    ///
    /// # Arguments
    ///
    /// * `sequence` - One-letter sequence with all substitutions applied.
    ///
    /// # Return
    ///
    /// A scalar where higher means more plausible.
    fn score(&self, sequence: &str) -> f64;
}

impl<F> FitnessScorer for F
where
    F: Fn(&str) -> f64 + Sync,
{
    fn score(&self, sequence: &str) -> f64 {
        self(sequence)
    }
}

/// A ligand-aware model scoring the compatibility of individual substitutions
/// with the grafted ligand geometry.
pub trait DesignScorer: Sync {
    /// Scores a batch of substitutions against a grafted complex.
    ///
    /// # Arguments
    ///
    /// * `complex` - The ligand placed in the reference frame.
    /// * `substitutions` - Substitutions to score; the result order follows this slice.
    ///
    /// # Return
    ///
    /// One score per substitution, conventionally in 0.0 to 1.0 (higher is better).
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::UnsupportedPosition`] or [`ScoringError::MissingEntry`]
    /// rather than a default value for anything the model does not cover.
    fn score_batch(
        &self,
        complex: &GraftedComplex,
        substitutions: &[ResidueSubstitution],
    ) -> Result<Vec<f64>, ScoringError>;
}

impl<F> DesignScorer for F
where
    F: Fn(&GraftedComplex, &ResidueSubstitution) -> Result<f64, ScoringError> + Sync,
{
    fn score_batch(
        &self,
        complex: &GraftedComplex,
        substitutions: &[ResidueSubstitution],
    ) -> Result<Vec<f64>, ScoringError> {
        substitutions.iter().map(|s| self(complex, s)).collect()
    }
}
