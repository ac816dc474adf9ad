use super::{FitnessScorer, ScoringError};
use crate::core::models::mutation::MutationSet;
use crate::core::models::sequence::{ReferenceSequence, validate_sequence};

/// Builds the mutant sequence of `set`, validates it, and scores it.
///
/// Validation happens before the scorer is invoked, so malformed input never
/// reaches the model.
pub fn score_mutation_set<S: FitnessScorer + ?Sized>(
    scorer: &S,
    reference: &ReferenceSequence,
    set: &MutationSet,
) -> Result<f64, ScoringError> {
    let sequence = reference.apply(set)?;
    score_sequence(scorer, &sequence, Some(reference.len()))
}

pub fn score_sequence<S: FitnessScorer + ?Sized>(
    scorer: &S,
    sequence: &str,
    expected_len: Option<usize>,
) -> Result<f64, ScoringError> {
    validate_sequence(sequence, expected_len)?;
    let value = scorer.score(sequence);
    if !value.is_finite() {
        return Err(ScoringError::NonFinite {
            context: format!("fitness of sequence of length {}", sequence.len()),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::sequence::SequenceValidationError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn count_glycines(sequence: &str) -> f64 {
        sequence.chars().filter(|&c| c == 'G').count() as f64
    }

    #[test]
    fn scores_the_mutant_sequence() {
        let reference = ReferenceSequence::new("MWAVGT").unwrap();
        let set = MutationSet::from_notation("m", &["V4G", "A3G"], None).unwrap();

        let score = score_mutation_set(&count_glycines, &reference, &set).unwrap();

        assert_eq!(score, 3.0);
    }

    #[test]
    fn is_deterministic_for_identical_input() {
        let reference = ReferenceSequence::new("MWAVGT").unwrap();
        let set = MutationSet::from_notation("m", &["V4G"], None).unwrap();

        let first = score_mutation_set(&count_glycines, &reference, &set).unwrap();
        let second = score_mutation_set(&count_glycines, &reference, &set).unwrap();

        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn malformed_sequence_fails_before_scoring() {
        let calls = AtomicUsize::new(0);
        let scorer = |_: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            1.0
        };

        let result = score_sequence(&scorer, "MWZVGT", Some(6));

        assert!(matches!(
            result,
            Err(ScoringError::SequenceValidation(
                SequenceValidationError::NonCanonicalSymbol { position: 3, .. }
            ))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn wrong_length_sequence_is_rejected() {
        let result = score_sequence(&count_glycines, "MWAV", Some(6));
        assert!(matches!(
            result,
            Err(ScoringError::SequenceValidation(
                SequenceValidationError::LengthMismatch { .. }
            ))
        ));
    }

    #[test]
    fn wild_type_mismatch_is_a_validation_error() {
        let reference = ReferenceSequence::new("MWAVGT").unwrap();
        let set = MutationSet::from_notation("m", &["L4G"], None).unwrap();

        let result = score_mutation_set(&count_glycines, &reference, &set);

        assert!(matches!(
            result,
            Err(ScoringError::SequenceValidation(
                SequenceValidationError::WildTypeMismatch { position: 4, .. }
            ))
        ));
    }

    #[test]
    fn non_finite_model_output_is_rejected() {
        let scorer = |_: &str| f64::NAN;
        assert!(matches!(
            score_sequence(&scorer, "MWAVGT", None),
            Err(ScoringError::NonFinite { .. })
        ));
    }
}
