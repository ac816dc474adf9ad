use crate::core::models::complex::GraftedComplex;
use crate::core::models::mutation::ResidueSubstitution;
use crate::core::models::residue::AminoAcid;
use crate::core::models::sequence::ReferenceSequence;
use crate::core::scoring::design::{BindingSite, score_substitutions};
use crate::core::scoring::{DesignScorer, ScoringError};
use crate::engine::progress::{Progress, ProgressReporter};
use serde::Serialize;
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DesignPrediction {
    pub substitution: ResidueSubstitution,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesignScan {
    /// Best substitution per site position, highest score first.
    pub predictions: Vec<DesignPrediction>,
    /// Site positions whose batch the design model could not score.
    pub skipped: Vec<(u32, ScoringError)>,
}

/// Scores every `alphabet` residue at every position of `site`, keeps the best
/// substitution per position and returns the `top_n` best positions.
///
/// Equal scores are resolved by residue order at a position and by position
/// across positions.
#[instrument(skip_all, name = "design_scan_task", fields(site = site.positions().len(), top_n = top_n))]
pub fn run(
    scorer: &dyn DesignScorer,
    site: &BindingSite,
    complex: &GraftedComplex,
    reference: &ReferenceSequence,
    alphabet: &[AminoAcid],
    top_n: usize,
    reporter: &ProgressReporter,
) -> DesignScan {
    let batches: Vec<(u32, Vec<ResidueSubstitution>)> = site
        .positions()
        .iter()
        .filter_map(|&position| {
            let wild_type = reference.residue_at(position)?;
            let mut residues: Vec<AminoAcid> = alphabet
                .iter()
                .copied()
                .filter(|&aa| aa != wild_type)
                .collect();
            residues.sort();
            residues.dedup();
            let batch: Vec<ResidueSubstitution> = residues
                .into_iter()
                .filter_map(|aa| ResidueSubstitution::new(position, wild_type, aa).ok())
                .collect();
            (!batch.is_empty()).then_some((position, batch))
        })
        .collect();

    reporter.report(Progress::TaskStart {
        total_steps: batches.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = batches.iter();

    #[cfg(feature = "parallel")]
    let iterator = batches.par_iter();

    let results: Vec<(u32, Result<DesignPrediction, ScoringError>)> = iterator
        .map(|(position, batch)| {
            let result = best_substitution(scorer, site, complex, batch);
            reporter.report(Progress::TaskIncrement);
            (*position, result)
        })
        .collect();

    reporter.report(Progress::TaskFinish);

    let mut scan = DesignScan::default();
    for (position, result) in results {
        match result {
            Ok(prediction) => scan.predictions.push(prediction),
            Err(error) => {
                warn!(position, %error, "Design scan skipped a site position.");
                scan.skipped.push((position, error));
            }
        }
    }

    scan.predictions.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.substitution.position.cmp(&b.substitution.position))
    });
    scan.predictions.truncate(top_n);

    info!(
        predictions = scan.predictions.len(),
        skipped = scan.skipped.len(),
        "Design scan complete."
    );
    scan
}

fn best_substitution(
    scorer: &dyn DesignScorer,
    site: &BindingSite,
    complex: &GraftedComplex,
    batch: &[ResidueSubstitution],
) -> Result<DesignPrediction, ScoringError> {
    let scores = score_substitutions(scorer, site, complex, batch)?;
    let mut best: Option<DesignPrediction> = None;
    for (&substitution, score) in batch.iter().zip(scores) {
        if best.is_none_or(|b| score > b.score) {
            best = Some(DesignPrediction {
                substitution,
                score,
            });
        }
    }
    best.ok_or(ScoringError::BatchLengthMismatch {
        expected: batch.len(),
        found: 0,
    })
}
