use super::pipeline::{Pipeline, PipelineReport};
use crate::core::models::complex::{LigandTemplate, ReferenceComplex};
use crate::core::models::mutation::MutationSet;
use crate::core::models::residue::AminoAcid;
use crate::core::models::sequence::ReferenceSequence;
use crate::core::scoring::{DesignScorer, FitnessScorer};
use crate::engine::config::{ConfigError, PipelineConfig};
use crate::engine::ensemble::ReplicateSource;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::tasks::design_scan::{self, DesignScan};
use crate::engine::validation::{RecoveryReport, ValidationOutcome, mutation_recovery};
use std::collections::BTreeSet;
use tracing::{info, instrument};

/// Design-site scan run after validation, with its recovery check.
#[derive(Clone, Copy)]
pub struct ScanRequest<'a> {
    pub alphabet: &'a [AminoAcid],
    /// Only observed substitutions at these positions count as recoverable.
    pub recovery_positions: Option<&'a BTreeSet<u32>>,
}

pub struct ValidationInputs<'a> {
    pub reference: &'a ReferenceSequence,
    pub structure: &'a ReferenceComplex,
    pub template: &'a LigandTemplate,
    /// Experimental mutation sets; their labels are the ground truth.
    pub mutation_sets: Vec<MutationSet>,
    pub fitness: &'a dyn FitnessScorer,
    pub design: Option<&'a dyn DesignScorer>,
    pub replicates: ReplicateSource,
    pub scan: Option<ScanRequest<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub report: PipelineReport,
    pub scan: Option<DesignScan>,
    pub recovery: Option<RecoveryReport>,
}

impl ValidationResult {
    pub fn outcome(&self) -> Option<&ValidationOutcome> {
        self.report.validation.as_ref()
    }
}

/// Retrospective validation: grafts the ligand, scores and ranks the
/// experimental sets, and checks the ranking against their labels.
#[instrument(skip_all, name = "validation_workflow")]
pub fn run(
    inputs: ValidationInputs,
    config: &PipelineConfig,
    reporter: &ProgressReporter,
) -> Result<ValidationResult, EngineError> {
    if inputs.scan.is_some() && inputs.design.is_none() {
        return Err(ConfigError::MissingParameter("design scorer").into());
    }

    let mut pipeline = Pipeline::new(
        config,
        inputs.reference,
        inputs.structure,
        inputs.mutation_sets,
        reporter,
    )?;
    info!(sets = pipeline.mutation_sets().len(), "Starting validation run.");

    pipeline.prepare_structure(inputs.template)?;
    pipeline.score(inputs.fitness, inputs.design, &inputs.replicates)?;
    pipeline.rank()?;
    let labels = pipeline.labels();
    let matches = pipeline.validate(&labels)?.matches;
    info!(matches, "Ranking validated against experimental labels.");

    let (scan, recovery) = match (
        inputs.scan,
        inputs.design,
        pipeline.binding_site(),
        pipeline.grafted(),
    ) {
        (Some(request), Some(scorer), Some(site), Some(complex)) => {
            reporter.report(Progress::PhaseStart {
                name: "Design scan",
            });
            let scan = design_scan::run(
                scorer,
                site,
                complex,
                inputs.reference,
                request.alphabet,
                config.top_n,
                reporter,
            );
            let recovery = mutation_recovery(
                &scan.predictions,
                pipeline.mutation_sets(),
                request.recovery_positions,
            );
            reporter.report(Progress::PhaseFinish);
            info!(
                recovered = recovery.recovered,
                predictions = recovery.predictions.len(),
                "Design scan recovery computed."
            );
            (Some(scan), Some(recovery))
        }
        _ => (None, None),
    };

    Ok(ValidationResult {
        report: pipeline.into_report(),
        scan,
        recovery,
    })
}
