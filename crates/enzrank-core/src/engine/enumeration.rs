use super::config::ConfigError;
use super::error::EngineError;
use crate::core::models::mutation::{MutationSet, ResidueSubstitution};
use crate::core::models::residue::AminoAcid;
use crate::core::models::sequence::ReferenceSequence;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// Every canonical residue except proline and cysteine.
pub fn default_alphabet() -> Vec<AminoAcid> {
    AminoAcid::ALL
        .iter()
        .copied()
        .filter(|aa| !matches!(aa, AminoAcid::Proline | AminoAcid::Cysteine))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumerationSettings {
    pub fixed: Vec<ResidueSubstitution>,
    pub active_positions: Vec<u32>,
    pub alphabet: Vec<AminoAcid>,
    pub min_size: usize,
    pub max_size: usize,
    pub draws: usize,
    pub seed: u64,
}

impl Default for EnumerationSettings {
    fn default() -> Self {
        Self {
            fixed: Vec::new(),
            active_positions: Vec::new(),
            alphabet: default_alphabet(),
            min_size: 5,
            max_size: 8,
            draws: 1000,
            seed: 0,
        }
    }
}

/// Seeded generator of novel mutation sets around a set of fixed substitutions.
#[derive(Debug, Clone)]
pub struct CandidateEnumerator {
    fixed: Vec<ResidueSubstitution>,
    choices: Vec<(u32, AminoAcid, Vec<AminoAcid>)>,
    min_size: usize,
    max_size: usize,
    draws: usize,
    seed: u64,
}

impl CandidateEnumerator {
    pub fn new(
        reference: &ReferenceSequence,
        settings: &EnumerationSettings,
    ) -> Result<Self, EngineError> {
        let mut fixed = settings.fixed.clone();
        fixed.sort();
        for substitution in &fixed {
            reference.check_substitution(substitution)?;
        }
        let fixed_positions: HashSet<u32> = fixed.iter().map(|s| s.position).collect();
        if fixed_positions.len() != fixed.len() {
            return Err(invalid("fixed", "two fixed substitutions share a position"));
        }

        let mut positions = settings.active_positions.clone();
        positions.sort_unstable();
        positions.dedup();

        let mut choices = Vec::new();
        for position in positions {
            if fixed_positions.contains(&position) {
                continue;
            }
            let wild_type = reference.residue_at(position).ok_or_else(|| {
                invalid(
                    "active_positions",
                    format!("position {} is outside the reference sequence", position),
                )
            })?;
            let residues: Vec<AminoAcid> = settings
                .alphabet
                .iter()
                .copied()
                .filter(|&aa| aa != wild_type)
                .collect();
            if !residues.is_empty() {
                choices.push((position, wild_type, residues));
            }
        }

        if settings.min_size < fixed.len() || settings.min_size > settings.max_size {
            return Err(invalid(
                "size",
                format!(
                    "size range [{}, {}] must start at or above the {} fixed substitutions",
                    settings.min_size,
                    settings.max_size,
                    fixed.len()
                ),
            ));
        }
        if settings.max_size > fixed.len() + choices.len() {
            return Err(invalid(
                "size",
                format!(
                    "at most {} substitutions are available, {} requested",
                    fixed.len() + choices.len(),
                    settings.max_size
                ),
            ));
        }

        Ok(Self {
            fixed,
            choices,
            min_size: settings.min_size,
            max_size: settings.max_size,
            draws: settings.draws,
            seed: settings.seed,
        })
    }

    /// Draws candidate sets. Identical draws are kept once, so fewer than
    /// `draws` sets may be returned. Identical settings give identical output.
    #[instrument(skip_all, name = "enumerate_candidates", fields(draws = self.draws, seed = self.seed))]
    pub fn generate(&self) -> Result<Vec<MutationSet>, EngineError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut seen: HashSet<Vec<ResidueSubstitution>> = HashSet::new();
        let mut candidates = Vec::new();

        for _ in 0..self.draws {
            let size = rng.gen_range(self.min_size..=self.max_size);
            let extra = size - self.fixed.len();

            let mut substitutions = self.fixed.clone();
            for (position, wild_type, residues) in self.choices.choose_multiple(&mut rng, extra) {
                if let Some(&mutant) = residues.choose(&mut rng) {
                    substitutions.push(ResidueSubstitution::new(*position, *wild_type, mutant)?);
                }
            }
            substitutions.sort();

            if !seen.insert(substitutions.clone()) {
                continue;
            }
            let id = format!("candidate_{}", candidates.len() + 1);
            candidates.push(MutationSet::new(id, substitutions, None)?);
        }

        debug!(duplicates = self.draws - candidates.len(), "Duplicate draws dropped.");
        info!(candidates = candidates.len(), "Candidate enumeration complete.");
        Ok(candidates)
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> EngineError {
    EngineError::Config(ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> ReferenceSequence {
        ReferenceSequence::new("MWAVGTMKLSTA").unwrap()
    }

    fn settings() -> EnumerationSettings {
        EnumerationSettings {
            fixed: vec!["V4G".parse().unwrap()],
            active_positions: vec![2, 3, 4, 6, 7, 9],
            min_size: 2,
            max_size: 4,
            draws: 200,
            seed: 42,
            ..EnumerationSettings::default()
        }
    }

    #[test]
    fn default_alphabet_excludes_proline_and_cysteine() {
        let alphabet = default_alphabet();
        assert_eq!(alphabet.len(), 18);
        assert!(!alphabet.contains(&AminoAcid::Proline));
        assert!(!alphabet.contains(&AminoAcid::Cysteine));
    }

    #[test]
    fn every_candidate_honors_the_constraints() {
        let reference = reference();
        let candidates = CandidateEnumerator::new(&reference, &settings())
            .unwrap()
            .generate()
            .unwrap();

        assert!(!candidates.is_empty());
        let fixed: ResidueSubstitution = "V4G".parse().unwrap();
        for candidate in &candidates {
            assert!((2..=4).contains(&candidate.len()));
            assert!(candidate.substitutions().contains(&fixed));
            for s in candidate.substitutions() {
                assert!(reference.check_substitution(s).is_ok());
                assert_ne!(s.mutant, AminoAcid::Proline);
                assert_ne!(s.mutant, AminoAcid::Cysteine);
                assert!([2, 3, 4, 6, 7, 9].contains(&s.position));
            }
        }
    }

    #[test]
    fn same_seed_gives_same_candidates() {
        let reference = reference();
        let enumerator = CandidateEnumerator::new(&reference, &settings()).unwrap();

        assert_eq!(enumerator.generate().unwrap(), enumerator.generate().unwrap());
    }

    #[test]
    fn candidates_are_unique_and_sequentially_named() {
        let reference = reference();
        let candidates = CandidateEnumerator::new(&reference, &settings())
            .unwrap()
            .generate()
            .unwrap();

        let distinct: HashSet<Vec<ResidueSubstitution>> = candidates
            .iter()
            .map(|c| c.substitutions().to_vec())
            .collect();
        assert_eq!(distinct.len(), candidates.len());
        assert_eq!(candidates[0].id(), "candidate_1");
        assert_eq!(
            candidates.last().unwrap().id(),
            format!("candidate_{}", candidates.len())
        );
    }

    #[test]
    fn rejects_size_range_beyond_available_positions() {
        let reference = reference();
        let too_large = EnumerationSettings {
            max_size: 12,
            ..settings()
        };
        assert!(CandidateEnumerator::new(&reference, &too_large).is_err());

        let below_fixed = EnumerationSettings {
            min_size: 0,
            ..settings()
        };
        assert!(CandidateEnumerator::new(&reference, &below_fixed).is_err());
    }

    #[test]
    fn rejects_fixed_substitution_with_wrong_wild_type() {
        let reference = reference();
        let wrong = EnumerationSettings {
            fixed: vec!["L4G".parse().unwrap()],
            ..settings()
        };
        assert!(matches!(
            CandidateEnumerator::new(&reference, &wrong),
            Err(EngineError::SequenceValidation(_))
        ));
    }
}
