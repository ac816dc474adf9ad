use super::error::{EngineError, Exclusion};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// Where the replicate estimates of each mutation set come from.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ReplicateSource {
    /// One replicate per set, equal to the configured objective.
    #[default]
    Objective,
    /// Externally produced replicate scores keyed by mutation set identifier,
    /// e.g. cross-validation folds. Sets absent from the map have no replicates.
    External(BTreeMap<String, Vec<f64>>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub mutation_set_id: String,
    pub mean_score: f64,
    pub dispersion: f64,
    pub rank: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnsembleRanking {
    pub ranked: Vec<RankedCandidate>,
    pub excluded: Vec<Exclusion>,
}

impl EnsembleRanking {
    pub fn ids(&self) -> Vec<&str> {
        self.ranked
            .iter()
            .map(|c| c.mutation_set_id.as_str())
            .collect()
    }
}

/// Mean and sample standard deviation (N-1 denominator) of `replicates`.
///
/// Values are summed in sorted order so the result does not depend on the
/// order replicates arrived in. A single replicate has dispersion 0.
pub fn summarize(replicates: &[f64]) -> Option<(f64, f64)> {
    if replicates.is_empty() {
        return None;
    }
    let mut sorted = replicates.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    if sorted.len() == 1 {
        return Some((mean, 0.0));
    }
    let mut deviations: Vec<f64> = sorted.iter().map(|x| (x - mean).powi(2)).collect();
    deviations.sort_by(f64::total_cmp);
    let variance = deviations.iter().sum::<f64>() / (n - 1.0);
    Some((mean, variance.sqrt()))
}

/// Ranks mutation sets on their replicate scores.
///
/// Sets are ordered by mean score, highest first. Neighbouring means that differ
/// by at most `tie_epsilon` form one tie group, chained through consecutive
/// members; inside a group lower dispersion ranks higher and the identifier
/// decides what remains. Ranks run 1..K without gaps.
///
/// Sets without replicates (or with a non-finite one) are excluded and reported.
/// Identifiers are expected to be unique.
#[instrument(skip_all, name = "rank_ensemble", fields(tie_epsilon = tie_epsilon))]
pub fn rank_ensemble<I, S, V>(replicates: I, tie_epsilon: f64) -> EnsembleRanking
where
    I: IntoIterator<Item = (S, V)>,
    S: AsRef<str>,
    V: AsRef<[f64]>,
{
    let mut summaries: Vec<(String, f64, f64)> = Vec::new();
    let mut excluded: Vec<Exclusion> = Vec::new();

    for (id, values) in replicates {
        let id = id.as_ref();
        let values = values.as_ref();
        if values.iter().any(|v| !v.is_finite()) {
            warn!(mutation_set = id, "Excluded: non-finite replicate score.");
            excluded.push(Exclusion::new(
                id,
                EngineError::NonFiniteReplicate {
                    mutation_set_id: id.to_string(),
                },
            ));
            continue;
        }
        match summarize(values) {
            Some((mean, dispersion)) => summaries.push((id.to_string(), mean, dispersion)),
            None => {
                warn!(mutation_set = id, "Excluded: no replicate scores.");
                excluded.push(Exclusion::new(
                    id,
                    EngineError::InsufficientData {
                        mutation_set_id: id.to_string(),
                    },
                ));
            }
        }
    }

    summaries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut ordered = Vec::with_capacity(summaries.len());
    let mut start = 0;
    while start < summaries.len() {
        let mut end = start + 1;
        while end < summaries.len() && summaries[end - 1].1 - summaries[end].1 <= tie_epsilon {
            end += 1;
        }
        let mut group = summaries[start..end].to_vec();
        group.sort_by(tie_break);
        ordered.extend(group);
        start = end;
    }

    let ranked: Vec<RankedCandidate> = ordered
        .into_iter()
        .enumerate()
        .map(|(index, (mutation_set_id, mean_score, dispersion))| RankedCandidate {
            mutation_set_id,
            mean_score,
            dispersion,
            rank: index + 1,
        })
        .collect();

    excluded.sort_by(|a, b| a.mutation_set_id.cmp(&b.mutation_set_id));
    debug!(
        ranked = ranked.len(),
        excluded = excluded.len(),
        "Ensemble ranking complete."
    );

    EnsembleRanking { ranked, excluded }
}

fn tie_break(a: &(String, f64, f64), b: &(String, f64, f64)) -> Ordering {
    a.2.total_cmp(&b.2).then_with(|| a.0.cmp(&b.0))
}
