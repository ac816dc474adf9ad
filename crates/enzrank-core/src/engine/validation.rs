use super::ensemble::RankedCandidate;
use super::error::EngineError;
use super::tasks::design_scan::DesignPrediction;
use crate::core::models::mutation::{MutationSet, ResidueSubstitution};
use itertools::Itertools;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{info, instrument};

/// A pair the ground truth orders `expected_first` before `expected_second`,
/// adjacent in the expected ordering, which the produced ordering reverses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inversion {
    pub expected_first: String,
    pub expected_second: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationOutcome {
    /// Produced ordering restricted to identifiers present in both inputs.
    pub produced: Vec<String>,
    /// Ground-truth ordering restricted to the same identifiers.
    pub expected: Vec<String>,
    #[serde(rename = "match")]
    pub matches: bool,
    pub inversions: Vec<Inversion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kendall_tau: Option<f64>,
    /// Ground-truth identifiers absent from the produced ordering.
    pub missing_from_ranking: Vec<String>,
    /// Produced identifiers without a ground-truth label.
    pub unlabeled: Vec<String>,
}

impl ValidationOutcome {
    /// Ground-truth entries that could not be checked, as errors.
    pub fn issues(&self) -> Vec<EngineError> {
        self.missing_from_ranking
            .iter()
            .map(|id| EngineError::OrderingMismatch {
                mutation_set_id: id.clone(),
            })
            .collect()
    }
}

/// Identifiers sorted by label, highest first; equal labels by identifier.
pub fn ground_truth_ordering(labels: &BTreeMap<String, f64>) -> Vec<String> {
    let mut entries: Vec<(&String, f64)> = labels.iter().map(|(id, &v)| (id, v)).collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries.into_iter().map(|(id, _)| id.clone()).collect()
}

/// Compares a produced ordering with the ordering implied by `labels`.
///
/// Only the relative order of identifiers is used; score magnitudes never enter
/// the comparison.
#[instrument(skip_all, name = "compare_orderings", fields(produced = produced.len(), labels = labels.len()))]
pub fn compare_orderings<S: AsRef<str>>(
    produced: &[S],
    labels: &BTreeMap<String, f64>,
) -> ValidationOutcome {
    let produced_ids: Vec<&str> = produced.iter().map(AsRef::as_ref).collect();
    let produced_set: BTreeSet<&str> = produced_ids.iter().copied().collect();

    let expected: Vec<String> = ground_truth_ordering(labels)
        .into_iter()
        .filter(|id| produced_set.contains(id.as_str()))
        .collect();
    let produced_shared: Vec<String> = produced_ids
        .iter()
        .filter(|id| labels.contains_key(**id))
        .map(|id| id.to_string())
        .collect();

    let position: HashMap<&str, usize> = produced_shared
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    let inversions: Vec<Inversion> = expected
        .windows(2)
        .filter(|pair| position[pair[1].as_str()] < position[pair[0].as_str()])
        .map(|pair| Inversion {
            expected_first: pair[0].clone(),
            expected_second: pair[1].clone(),
        })
        .collect();

    let kendall_tau = kendall_tau(&expected, &position);
    let missing_from_ranking: Vec<String> = labels
        .keys()
        .filter(|id| !produced_set.contains(id.as_str()))
        .cloned()
        .collect();
    let mut unlabeled: Vec<String> = produced_ids
        .iter()
        .filter(|id| !labels.contains_key(**id))
        .map(|id| id.to_string())
        .collect();
    unlabeled.sort();

    let matches = produced_shared == expected;
    info!(
        matches,
        inversions = inversions.len(),
        missing = missing_from_ranking.len(),
        "Ordering comparison complete."
    );

    ValidationOutcome {
        produced: produced_shared,
        expected,
        matches,
        inversions,
        kendall_tau,
        missing_from_ranking,
        unlabeled,
    }
}

pub fn validate_ranking(
    ranked: &[RankedCandidate],
    labels: &BTreeMap<String, f64>,
) -> ValidationOutcome {
    let ids: Vec<&str> = ranked.iter().map(|c| c.mutation_set_id.as_str()).collect();
    compare_orderings(&ids, labels)
}

fn kendall_tau(expected: &[String], produced_position: &HashMap<&str, usize>) -> Option<f64> {
    let n = expected.len();
    if n < 2 {
        return None;
    }
    let (concordant, discordant) = expected
        .iter()
        .map(|id| produced_position[id.as_str()])
        .tuple_combinations()
        .fold((0i64, 0i64), |(c, d), (a, b)| {
            if a < b { (c + 1, d) } else { (c, d + 1) }
        });
    let pairs = (n * (n - 1) / 2) as f64;
    Some((concordant - discordant) as f64 / pairs)
}

/// One design prediction checked against experimentally observed substitutions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveredPrediction {
    pub substitution: ResidueSubstitution,
    pub score: f64,
    pub observed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveryReport {
    pub predictions: Vec<RecoveredPrediction>,
    pub observed: Vec<ResidueSubstitution>,
    pub recovered: usize,
}

impl RecoveryReport {
    /// Fraction of predictions found among the observed substitutions.
    pub fn precision(&self) -> Option<f64> {
        (!self.predictions.is_empty())
            .then(|| self.recovered as f64 / self.predictions.len() as f64)
    }
}

/// Checks which predicted substitutions occur in the experimental sets, optionally
/// considering only observed substitutions at `positions`.
pub fn mutation_recovery(
    predictions: &[DesignPrediction],
    experimental: &[MutationSet],
    positions: Option<&BTreeSet<u32>>,
) -> RecoveryReport {
    let observed: BTreeSet<ResidueSubstitution> = experimental
        .iter()
        .flat_map(|set| set.substitutions().iter().copied())
        .filter(|s| positions.is_none_or(|p| p.contains(&s.position)))
        .collect();

    let predictions: Vec<RecoveredPrediction> = predictions
        .iter()
        .map(|p| RecoveredPrediction {
            substitution: p.substitution,
            score: p.score,
            observed: observed.contains(&p.substitution),
        })
        .collect();
    let recovered = predictions.iter().filter(|p| p.observed).count();

    RecoveryReport {
        predictions,
        observed: observed.into_iter().collect(),
        recovered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(id, v)| (id.to_string(), *v)).collect()
    }

    #[test]
    fn ground_truth_sorts_by_label_then_identifier() {
        let order = ground_truth_ordering(&labels(&[("b", 50.0), ("a", 50.0), ("c", 90.0)]));
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn identical_orderings_match() {
        let gt = labels(&[("mutant_1", 86.0), ("mutant_3", 83.0), ("mutant_2", 82.0)]);

        let outcome = compare_orderings(&["mutant_1", "mutant_3", "mutant_2"], &gt);

        assert!(outcome.matches);
        assert!(outcome.inversions.is_empty());
        assert_eq!(outcome.kendall_tau, Some(1.0));
        assert_eq!(outcome.produced, vec!["mutant_1", "mutant_3", "mutant_2"]);
    }

    #[test]
    fn swapped_neighbors_are_one_inversion() {
        let gt = labels(&[("mutant_1", 86.0), ("mutant_3", 83.0), ("mutant_2", 82.0)]);

        let outcome = compare_orderings(&["mutant_1", "mutant_2", "mutant_3"], &gt);

        assert!(!outcome.matches);
        assert_eq!(
            outcome.inversions,
            vec![Inversion {
                expected_first: "mutant_3".into(),
                expected_second: "mutant_2".into()
            }]
        );
        assert!((outcome.kendall_tau.unwrap() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn fully_reversed_ordering_lists_every_adjacent_pair() {
        let gt = labels(&[("a", 3.0), ("b", 2.0), ("c", 1.0)]);

        let outcome = compare_orderings(&["c", "b", "a"], &gt);

        assert_eq!(outcome.inversions.len(), 2);
        assert_eq!(outcome.kendall_tau, Some(-1.0));
    }

    #[test]
    fn missing_and_unlabeled_identifiers_are_reported_not_compared() {
        let gt = labels(&[("a", 3.0), ("b", 2.0), ("ghost", 1.0)]);

        let outcome = compare_orderings(&["a", "extra", "b"], &gt);

        assert!(outcome.matches);
        assert_eq!(outcome.missing_from_ranking, vec!["ghost"]);
        assert_eq!(outcome.unlabeled, vec!["extra"]);
        assert_eq!(
            outcome.issues(),
            vec![EngineError::OrderingMismatch {
                mutation_set_id: "ghost".into()
            }]
        );
    }

    #[test]
    fn recovery_counts_predictions_seen_in_experiments() {
        let experimental = vec![
            MutationSet::from_notation("m1", &["W192H", "V215G", "N360A"], Some(86.0)).unwrap(),
            MutationSet::from_notation("m2", &["V215G", "A193G"], Some(80.0)).unwrap(),
        ];
        let prediction = |notation: &str, score: f64| DesignPrediction {
            substitution: notation.parse().unwrap(),
            score,
        };
        let predictions = vec![
            prediction("V215G", 0.99),
            prediction("M217I", 0.80),
            prediction("N360A", 0.30),
        ];
        let active_site = BTreeSet::from([192, 193, 215, 217]);

        let report = mutation_recovery(&predictions, &experimental, Some(&active_site));

        assert_eq!(report.recovered, 1);
        assert_eq!(report.observed.len(), 3);
        assert!(report.predictions[0].observed);
        assert!(!report.predictions[2].observed);
        assert!((report.precision().unwrap() - 1.0 / 3.0).abs() < 1e-12);
    }
}
