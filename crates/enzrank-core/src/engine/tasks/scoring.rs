use crate::core::models::complex::GraftedComplex;
use crate::core::models::mutation::MutationSet;
use crate::core::models::sequence::ReferenceSequence;
use crate::core::scoring::design::{BindingSite, score_design_positions};
use crate::core::scoring::fitness::score_mutation_set;
use crate::core::scoring::records::{ScoreLedger, ScoreRecord};
use crate::core::scoring::{DesignScorer, FitnessScorer};
use crate::engine::config::{ConfigError, Objective};
use crate::engine::ensemble::ReplicateSource;
use crate::engine::error::{EngineError, Exclusion};
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Clone, Copy)]
pub struct DesignInputs<'a> {
    pub scorer: &'a dyn DesignScorer,
    pub site: &'a BindingSite,
    pub complex: &'a GraftedComplex,
}

#[derive(Clone, Copy)]
pub struct ScoringInputs<'a> {
    pub reference: &'a ReferenceSequence,
    pub fitness: &'a dyn FitnessScorer,
    pub design: Option<DesignInputs<'a>>,
    pub objective: &'a Objective,
    pub replicates: &'a ReplicateSource,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringOutcome {
    pub ledger: ScoreLedger,
    pub scored: Vec<String>,
    pub excluded: Vec<Exclusion>,
}

/// Scores every mutation set independently and merges the per-set records in
/// input order. A set that fails is excluded without affecting the others.
#[instrument(skip_all, name = "scoring_task", fields(sets = sets.len()))]
pub fn run(
    inputs: &ScoringInputs,
    sets: &[MutationSet],
    reporter: &ProgressReporter,
) -> ScoringOutcome {
    info!("Scoring mutation sets.");
    reporter.report(Progress::TaskStart {
        total_steps: sets.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = sets.iter();

    #[cfg(feature = "parallel")]
    let iterator = sets.par_iter();

    let results: Vec<Result<ScoreLedger, EngineError>> = iterator
        .map(|set| {
            let result = score_set(inputs, set);
            reporter.report(Progress::TaskIncrement);
            result
        })
        .collect();

    reporter.report(Progress::TaskFinish);

    let mut outcome = ScoringOutcome::default();
    for (set, result) in sets.iter().zip(results) {
        match result {
            Ok(ledger) => {
                outcome.ledger.append(ledger);
                outcome.scored.push(set.id().to_string());
            }
            Err(error) => {
                warn!(mutation_set = set.id(), %error, "Mutation set excluded from scoring.");
                reporter.report(Progress::Excluded {
                    mutation_set_id: set.id().to_string(),
                    reason: error.to_string(),
                });
                outcome.excluded.push(Exclusion::new(set.id(), error));
            }
        }
    }

    info!(
        scored = outcome.scored.len(),
        excluded = outcome.excluded.len(),
        records = outcome.ledger.len(),
        "Scoring complete."
    );
    outcome
}

fn score_set(inputs: &ScoringInputs, set: &MutationSet) -> Result<ScoreLedger, EngineError> {
    let id = set.id();
    let mut ledger = ScoreLedger::new();

    let fitness = score_mutation_set(inputs.fitness, inputs.reference, set)
        .map_err(|e| EngineError::scoring(id, e))?;
    ledger.push(ScoreRecord::fitness(id, fitness));

    let mut design_values = Vec::new();
    if inputs.objective.requires_design() {
        let design = inputs
            .design
            .ok_or(EngineError::Config(ConfigError::MissingParameter("design scorer")))?;
        let scores = score_design_positions(
            design.scorer,
            design.site,
            design.complex,
            inputs.reference,
            set,
        )
        .map_err(|e| EngineError::scoring(id, e))?;
        for (position, value) in scores {
            ledger.push(ScoreRecord::design(id, position, value));
            design_values.push(value);
        }
    }

    match inputs.replicates {
        ReplicateSource::Objective => {
            let value = inputs.objective.evaluate(fitness, &design_values, set.len());
            ledger.push(ScoreRecord::replicate(id, 0, value));
        }
        ReplicateSource::External(map) => {
            for (index, &value) in map.get(id).into_iter().flatten().enumerate() {
                ledger.push(ScoreRecord::replicate(id, index, value));
            }
        }
    }

    Ok(ledger)
}
