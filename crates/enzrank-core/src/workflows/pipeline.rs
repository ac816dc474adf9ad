use crate::core::models::complex::{GraftedComplex, LigandTemplate, ReferenceComplex};
use crate::core::models::mutation::MutationSet;
use crate::core::models::sequence::ReferenceSequence;
use crate::core::scoring::design::BindingSite;
use crate::core::scoring::records::{ScoreLedger, ScoreRecord};
use crate::core::scoring::{DesignScorer, FitnessScorer};
use crate::engine::config::PipelineConfig;
use crate::engine::ensemble::{RankedCandidate, ReplicateSource, rank_ensemble};
use crate::engine::error::{EngineError, Exclusion};
use crate::engine::grafting::graft_ligand;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::PipelineStage;
use crate::engine::tasks::scoring::{self, DesignInputs, ScoringInputs};
use crate::engine::validation::{ValidationOutcome, validate_ranking};
use std::collections::{BTreeMap, HashSet};
use tracing::{error, info, instrument};

/// Everything a run produced up to the stage it reached.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub stage: PipelineStage,
    pub failure: Option<EngineError>,
    pub grafted: Option<GraftedComplex>,
    pub ledger: ScoreLedger,
    pub excluded: Vec<Exclusion>,
    pub ranked: Vec<RankedCandidate>,
    pub validation: Option<ValidationOutcome>,
}

/// One run over a fixed collection of mutation sets.
///
/// Each stage method checks that the run is in the stage's required predecessor
/// before doing any work. Calling a stage out of order returns
/// [`EngineError::IllegalTransition`] and leaves the run untouched; a stage that
/// fails moves the run to [`PipelineStage::Failed`] and keeps the error.
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    reference: &'a ReferenceSequence,
    structure: &'a ReferenceComplex,
    sets: Vec<MutationSet>,
    reporter: &'a ProgressReporter<'a>,
    stage: PipelineStage,
    failure: Option<EngineError>,
    grafted: Option<GraftedComplex>,
    site: Option<BindingSite>,
    ledger: ScoreLedger,
    scored: Vec<String>,
    excluded: Vec<Exclusion>,
    ranked: Vec<RankedCandidate>,
    validation: Option<ValidationOutcome>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        reference: &'a ReferenceSequence,
        structure: &'a ReferenceComplex,
        sets: Vec<MutationSet>,
        reporter: &'a ProgressReporter<'a>,
    ) -> Result<Self, EngineError> {
        {
            let mut seen = HashSet::with_capacity(sets.len());
            for set in &sets {
                if !seen.insert(set.id()) {
                    return Err(EngineError::DuplicateIdentifier {
                        mutation_set_id: set.id().to_string(),
                    });
                }
            }
        }

        Ok(Self {
            config,
            reference,
            structure,
            sets,
            reporter,
            stage: PipelineStage::Initialized,
            failure: None,
            grafted: None,
            site: None,
            ledger: ScoreLedger::new(),
            scored: Vec::new(),
            excluded: Vec::new(),
            ranked: Vec::new(),
            validation: None,
        })
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn failure(&self) -> Option<&EngineError> {
        self.failure.as_ref()
    }

    pub fn mutation_sets(&self) -> &[MutationSet] {
        &self.sets
    }

    pub fn grafted(&self) -> Option<&GraftedComplex> {
        self.grafted.as_ref()
    }

    pub fn binding_site(&self) -> Option<&BindingSite> {
        self.site.as_ref()
    }

    pub fn ledger(&self) -> &ScoreLedger {
        &self.ledger
    }

    pub fn excluded(&self) -> &[Exclusion] {
        &self.excluded
    }

    pub fn ranked(&self) -> &[RankedCandidate] {
        &self.ranked
    }

    pub fn validation(&self) -> Option<&ValidationOutcome> {
        self.validation.as_ref()
    }

    /// Grafts `template` into the reference frame and selects the binding site.
    #[instrument(skip_all, name = "stage_structure")]
    pub fn prepare_structure(
        &mut self,
        template: &LigandTemplate,
    ) -> Result<&GraftedComplex, EngineError> {
        self.require(PipelineStage::StructureReady)?;
        self.reporter.report(Progress::PhaseStart { name: "Grafting" });

        let grafted = match graft_ligand(self.structure, template, &self.config.graft) {
            Ok(grafted) => grafted,
            Err(e) => return Err(self.fail(e.into())),
        };
        let site = BindingSite::from_complex(
            self.structure,
            &grafted,
            self.reference.len(),
            self.config.proximity_radius,
        );
        info!(
            rmsd = grafted.anchor_rmsd,
            site_size = site.positions().len(),
            "Structure ready."
        );
        self.site = Some(site);

        self.reporter.report(Progress::PhaseFinish);
        self.enter(PipelineStage::StructureReady);
        let grafted: &GraftedComplex = self.grafted.insert(grafted);
        Ok(grafted)
    }

    /// Scores every mutation set. Sets that fail are excluded and reported; the
    /// stage itself fails only when no set could be scored.
    #[instrument(skip_all, name = "stage_scoring")]
    pub fn score(
        &mut self,
        fitness: &dyn FitnessScorer,
        design: Option<&dyn DesignScorer>,
        replicates: &ReplicateSource,
    ) -> Result<&ScoreLedger, EngineError> {
        self.require(PipelineStage::Scored)?;
        self.reporter.report(Progress::PhaseStart { name: "Scoring" });

        let design_inputs = match (design, self.site.as_ref(), self.grafted.as_ref()) {
            (Some(scorer), Some(site), Some(complex)) => Some(DesignInputs {
                scorer,
                site,
                complex,
            }),
            _ => None,
        };
        let inputs = ScoringInputs {
            reference: self.reference,
            fitness,
            design: design_inputs,
            objective: &self.config.objective,
            replicates,
        };
        let outcome = scoring::run(&inputs, &self.sets, self.reporter);
        self.reporter.report(Progress::PhaseFinish);

        if outcome.scored.is_empty() && !self.sets.is_empty() {
            self.excluded.extend(outcome.excluded);
            return Err(self.fail(EngineError::NothingScored {
                count: self.sets.len(),
            }));
        }

        self.ledger.append(outcome.ledger);
        self.scored = outcome.scored;
        self.excluded.extend(outcome.excluded);
        self.enter(PipelineStage::Scored);
        Ok(&self.ledger)
    }

    /// Aggregates replicate scores into the final ranking and records one
    /// aggregate ensemble score per ranked set.
    #[instrument(skip_all, name = "stage_ranking")]
    pub fn rank(&mut self) -> Result<&[RankedCandidate], EngineError> {
        self.require(PipelineStage::Ranked)?;

        let replicates: Vec<(&str, Vec<f64>)> = self
            .scored
            .iter()
            .map(|id| (id.as_str(), self.ledger.replicates(id)))
            .collect();
        let ranking = rank_ensemble(replicates, self.config.tie_epsilon);

        for exclusion in &ranking.excluded {
            self.reporter.report(Progress::Excluded {
                mutation_set_id: exclusion.mutation_set_id.clone(),
                reason: exclusion.reason.to_string(),
            });
        }
        for candidate in &ranking.ranked {
            self.ledger
                .push(ScoreRecord::ensemble(&candidate.mutation_set_id, candidate.mean_score));
        }
        self.excluded.extend(ranking.excluded);
        self.ranked = ranking.ranked;

        info!(
            ranked = self.ranked.len(),
            excluded = self.excluded.len(),
            "Ranking complete."
        );
        self.enter(PipelineStage::Ranked);
        Ok(&self.ranked)
    }

    /// Compares the ranking with the ordering implied by experimental labels.
    #[instrument(skip_all, name = "stage_validation")]
    pub fn validate(
        &mut self,
        labels: &BTreeMap<String, f64>,
    ) -> Result<&ValidationOutcome, EngineError> {
        self.require(PipelineStage::Validated)?;

        let outcome = validate_ranking(&self.ranked, labels);
        for issue in outcome.issues() {
            self.reporter.report(Progress::Message(issue.to_string()));
        }
        self.enter(PipelineStage::Validated);
        let outcome: &ValidationOutcome = self.validation.insert(outcome);
        Ok(outcome)
    }

    /// Experimental labels of the mutation sets that carry one.
    pub fn labels(&self) -> BTreeMap<String, f64> {
        self.sets
            .iter()
            .filter_map(|set| set.label().map(|label| (set.id().to_string(), label)))
            .collect()
    }

    pub fn into_report(self) -> PipelineReport {
        PipelineReport {
            stage: self.stage,
            failure: self.failure,
            grafted: self.grafted,
            ledger: self.ledger,
            excluded: self.excluded,
            ranked: self.ranked,
            validation: self.validation,
        }
    }

    fn require(&self, next: PipelineStage) -> Result<(), EngineError> {
        if self.stage.can_transition_to(next) {
            Ok(())
        } else {
            Err(EngineError::IllegalTransition {
                from: self.stage,
                to: next,
            })
        }
    }

    fn enter(&mut self, next: PipelineStage) {
        info!(from = %self.stage, to = %next, "Stage transition.");
        self.stage = next;
        self.reporter.report(Progress::StageEntered { stage: next });
    }

    fn fail(&mut self, cause: EngineError) -> EngineError {
        error!(stage = %self.stage, error = %cause, "Stage failed.");
        self.stage = PipelineStage::Failed;
        self.failure = Some(cause.clone());
        self.reporter.report(Progress::StageEntered {
            stage: PipelineStage::Failed,
        });
        cause
    }
}
