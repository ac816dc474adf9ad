use super::pipeline::{Pipeline, PipelineReport};
use crate::core::models::complex::{LigandTemplate, ReferenceComplex};
use crate::core::models::mutation::MutationSet;
use crate::core::models::sequence::ReferenceSequence;
use crate::core::scoring::{DesignScorer, FitnessScorer};
use crate::engine::config::PipelineConfig;
use crate::engine::enumeration::{CandidateEnumerator, EnumerationSettings};
use crate::engine::ensemble::{RankedCandidate, ReplicateSource};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

pub struct PredictionInputs<'a> {
    pub reference: &'a ReferenceSequence,
    pub structure: &'a ReferenceComplex,
    pub template: &'a LigandTemplate,
    pub fitness: &'a dyn FitnessScorer,
    pub design: Option<&'a dyn DesignScorer>,
    pub enumeration: EnumerationSettings,
    pub replicates: ReplicateSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub candidates: Vec<MutationSet>,
    /// The best `top_n` ranked candidates.
    pub top: Vec<RankedCandidate>,
    pub report: PipelineReport,
}

impl PredictionResult {
    pub fn candidate(&self, id: &str) -> Option<&MutationSet> {
        self.candidates.iter().find(|c| c.id() == id)
    }
}

/// Prospective prediction: enumerates novel candidates, scores and ranks them
/// and keeps the `top_n` best.
#[instrument(skip_all, name = "prediction_workflow")]
pub fn run(
    inputs: PredictionInputs,
    config: &PipelineConfig,
    reporter: &ProgressReporter,
) -> Result<PredictionResult, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Enumeration",
    });
    let candidates =
        CandidateEnumerator::new(inputs.reference, &inputs.enumeration)?.generate()?;
    reporter.report(Progress::PhaseFinish);

    let mut pipeline = Pipeline::new(
        config,
        inputs.reference,
        inputs.structure,
        candidates,
        reporter,
    )?;
    pipeline.prepare_structure(inputs.template)?;
    pipeline.score(inputs.fitness, inputs.design, &inputs.replicates)?;
    let top: Vec<RankedCandidate> = pipeline.rank()?.iter().take(config.top_n).cloned().collect();

    info!(
        candidates = pipeline.mutation_sets().len(),
        top = top.len(),
        "Prediction complete."
    );

    let candidates = pipeline.mutation_sets().to_vec();
    Ok(PredictionResult {
        candidates,
        top,
        report: pipeline.into_report(),
    })
}
