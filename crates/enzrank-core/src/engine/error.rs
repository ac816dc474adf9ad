use thiserror::Error;

use super::config::ConfigError;
use super::grafting::GraftError;
use super::state::PipelineStage;
use crate::core::models::mutation::MutationError;
use crate::core::models::sequence::SequenceValidationError;
use crate::core::scoring::ScoringError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid mutation input: {0}")]
    Mutation(#[from] MutationError),

    #[error("Sequence validation failed: {0}")]
    SequenceValidation(#[from] SequenceValidationError),

    #[error("Grafting failed: {0}")]
    Graft(#[from] GraftError),

    #[error("Scoring of '{mutation_set_id}' failed: {source}")]
    Scoring {
        mutation_set_id: String,
        #[source]
        source: ScoringError,
    },

    #[error("Mutation set identifier '{mutation_set_id}' appears more than once")]
    DuplicateIdentifier { mutation_set_id: String },

    #[error("No replicate scores available for '{mutation_set_id}'")]
    InsufficientData { mutation_set_id: String },

    #[error("Replicate scores of '{mutation_set_id}' contain a non-finite value")]
    NonFiniteReplicate { mutation_set_id: String },

    #[error("Ground truth references '{mutation_set_id}', which is absent from the ranked list")]
    OrderingMismatch { mutation_set_id: String },

    #[error("Illegal stage transition from {from} to {to}")]
    IllegalTransition {
        from: PipelineStage,
        to: PipelineStage,
    },

    #[error("No mutation set could be scored: all {count} were excluded")]
    NothingScored { count: usize },
}

impl EngineError {
    pub fn scoring(mutation_set_id: &str, source: ScoringError) -> Self {
        EngineError::Scoring {
            mutation_set_id: mutation_set_id.to_string(),
            source,
        }
    }
}

/// A mutation set removed from a stage's output, with the reason it was removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Exclusion {
    pub mutation_set_id: String,
    pub reason: EngineError,
}

impl Exclusion {
    pub fn new(mutation_set_id: &str, reason: EngineError) -> Self {
        Self {
            mutation_set_id: mutation_set_id.to_string(),
            reason,
        }
    }
}
