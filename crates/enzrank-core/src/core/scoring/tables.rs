use super::{DesignScorer, FitnessScorer, ScoringError};
use crate::core::models::complex::GraftedComplex;
use crate::core::models::mutation::ResidueSubstitution;
use crate::core::models::residue::AminoAcid;
use crate::core::models::sequence::ReferenceSequence;
use std::collections::HashMap;

/// Additive fitness model: a baseline plus one log-ratio effect per position that
/// differs from the reference. Differences without a tabulated effect contribute
/// `unlisted_effect`.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSpecificFitness {
    reference: Vec<AminoAcid>,
    baseline: f64,
    unlisted_effect: f64,
    effects: HashMap<(u32, AminoAcid), f64>,
}

impl PositionSpecificFitness {
    pub fn new(reference: &ReferenceSequence, baseline: f64) -> Self {
        let reference = (1..=reference.len() as u32)
            .filter_map(|position| reference.residue_at(position))
            .collect();
        Self {
            reference,
            baseline,
            unlisted_effect: 0.0,
            effects: HashMap::new(),
        }
    }

    pub fn with_unlisted_effect(mut self, value: f64) -> Self {
        self.unlisted_effect = value;
        self
    }

    pub fn with_effect(mut self, position: u32, residue: AminoAcid, value: f64) -> Self {
        self.effects.insert((position, residue), value);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = (u32, AminoAcid, f64)>) -> Self {
        for (position, residue, value) in effects {
            self.effects.insert((position, residue), value);
        }
        self
    }
}

impl FitnessScorer for PositionSpecificFitness {
    fn score(&self, sequence: &str) -> f64 {
        let mut total = self.baseline;
        for (index, (symbol, wild_type)) in sequence.chars().zip(self.reference.iter()).enumerate() {
            let residue = AminoAcid::from_one_letter(symbol);
            if residue == Some(*wild_type) {
                continue;
            }
            let effect = residue
                .and_then(|r| self.effects.get(&(index as u32 + 1, r)))
                .copied()
                .unwrap_or(self.unlisted_effect);
            total += effect;
        }
        total
    }
}

/// Design model backed by a position by residue table of precomputed scores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabulatedDesignScorer {
    entries: HashMap<(u32, AminoAcid), f64>,
}

impl TabulatedDesignScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (u32, AminoAcid, f64)>) -> Self {
        let mut table = Self::new();
        for (position, residue, value) in entries {
            table.insert(position, residue, value);
        }
        table
    }

    pub fn insert(&mut self, position: u32, residue: AminoAcid, value: f64) {
        self.entries.insert((position, residue), value);
    }

    pub fn get(&self, position: u32, residue: AminoAcid) -> Option<f64> {
        self.entries.get(&(position, residue)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DesignScorer for TabulatedDesignScorer {
    fn score_batch(
        &self,
        _complex: &GraftedComplex,
        substitutions: &[ResidueSubstitution],
    ) -> Result<Vec<f64>, ScoringError> {
        substitutions
            .iter()
            .map(|s| {
                self.get(s.position, s.mutant)
                    .ok_or_else(|| ScoringError::MissingEntry {
                        substitution: s.to_string(),
                    })
            })
            .collect()
    }
}
