use super::mutation::{MutationSet, ResidueSubstitution};
use super::residue::AminoAcid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceValidationError {
    #[error("Sequence is empty")]
    Empty,

    #[error("Non-canonical residue symbol '{symbol}' at position {position}")]
    NonCanonicalSymbol { position: usize, symbol: char },

    #[error("Sequence length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("Position {position} is outside the reference sequence (length {length})")]
    PositionOutOfRange { position: u32, length: usize },

    #[error(
        "Wild-type mismatch at position {position}: reference has '{reference}', substitution expects '{expected}'"
    )]
    WildTypeMismatch {
        position: u32,
        reference: AminoAcid,
        expected: AminoAcid,
    },
}

/// Checks that `sequence` consists only of the twenty canonical one-letter
/// codes and, when given, has exactly `expected_len` residues.
pub fn validate_sequence(
    sequence: &str,
    expected_len: Option<usize>,
) -> Result<(), SequenceValidationError> {
    if sequence.is_empty() {
        return Err(SequenceValidationError::Empty);
    }
    if let Some((index, symbol)) = sequence
        .chars()
        .enumerate()
        .find(|(_, c)| AminoAcid::from_one_letter(*c).is_none())
    {
        return Err(SequenceValidationError::NonCanonicalSymbol {
            position: index + 1,
            symbol,
        });
    }
    if let Some(expected) = expected_len {
        let found = sequence.chars().count();
        if found != expected {
            return Err(SequenceValidationError::LengthMismatch { expected, found });
        }
    }
    Ok(())
}

/// The wild-type protein sequence. Positions are 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceSequence {
    residues: Vec<AminoAcid>,
}

impl ReferenceSequence {
    pub fn new(sequence: &str) -> Result<Self, SequenceValidationError> {
        validate_sequence(sequence, None)?;
        let residues = sequence
            .chars()
            .filter_map(AminoAcid::from_one_letter)
            .collect();
        Ok(Self { residues })
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub fn residue_at(&self, position: u32) -> Option<AminoAcid> {
        let index = (position as usize).checked_sub(1)?;
        self.residues.get(index).copied()
    }

    pub fn contains_position(&self, position: u32) -> bool {
        self.residue_at(position).is_some()
    }

    pub fn check_substitution(
        &self,
        substitution: &ResidueSubstitution,
    ) -> Result<(), SequenceValidationError> {
        let reference = self.residue_at(substitution.position).ok_or(
            SequenceValidationError::PositionOutOfRange {
                position: substitution.position,
                length: self.len(),
            },
        )?;
        if reference != substitution.wild_type {
            return Err(SequenceValidationError::WildTypeMismatch {
                position: substitution.position,
                reference,
                expected: substitution.wild_type,
            });
        }
        Ok(())
    }

    /// Returns the full mutant sequence with every substitution of `set` applied.
    pub fn apply(&self, set: &MutationSet) -> Result<String, SequenceValidationError> {
        let mut residues = self.residues.clone();
        for substitution in set.substitutions() {
            self.check_substitution(substitution)?;
            residues[substitution.position as usize - 1] = substitution.mutant;
        }
        Ok(residues.iter().map(AminoAcid::to_one_letter).collect())
    }

    pub fn to_sequence_string(&self) -> String {
        self.residues.iter().map(AminoAcid::to_one_letter).collect()
    }
}

/// Maps author residue numbers (as written in the structure and in
/// substitution notation) to 1-indexed sequence positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidueNumbering {
    author_to_sequence: BTreeMap<i32, u32>,
}

impl ResidueNumbering {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (i32, u32)>) -> Self {
        Self {
            author_to_sequence: pairs.into_iter().collect(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.author_to_sequence.is_empty()
    }

    /// Without explicit pairs, author numbers are sequence positions.
    pub fn to_sequence_position(&self, author_number: i32) -> Option<u32> {
        if self.is_identity() {
            return u32::try_from(author_number).ok().filter(|&p| p > 0);
        }
        self.author_to_sequence.get(&author_number).copied()
    }

    pub fn to_author_number(&self, position: u32) -> Option<i32> {
        if self.is_identity() {
            return i32::try_from(position).ok();
        }
        self.author_to_sequence
            .iter()
            .find(|(_, seq)| **seq == position)
            .map(|(author, _)| *author)
    }
}
