use super::residue::AminoAcid;
use super::sequence::ResidueNumbering;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const LABEL_RANGE: (f64, f64) = (0.0, 100.0);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MutationError {
    #[error("Malformed substitution notation '{0}': expected <wild-type><number><mutant>, e.g. 'W192H'")]
    MalformedNotation(String),

    #[error("Residue number {number} in '{notation}' has no sequence position")]
    UnmappedResidueNumber { notation: String, number: i32 },

    #[error("Substitution at position {position} does not change the residue ('{residue}')")]
    SilentSubstitution { position: u32, residue: AminoAcid },

    #[error("Mutation set '{id}' has more than one substitution at position {position}")]
    DuplicatePosition { id: String, position: u32 },

    #[error("Mutation set identifier must not be empty")]
    EmptyIdentifier,

    #[error("Experimental label {label} of '{id}' is outside [0, 100]")]
    LabelOutOfRange { id: String, label: f64 },
}

/// A single point substitution at a 1-indexed sequence position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResidueSubstitution {
    pub position: u32,
    pub wild_type: AminoAcid,
    pub mutant: AminoAcid,
}

impl ResidueSubstitution {
    pub fn new(
        position: u32,
        wild_type: AminoAcid,
        mutant: AminoAcid,
    ) -> Result<Self, MutationError> {
        if wild_type == mutant {
            return Err(MutationError::SilentSubstitution {
                position,
                residue: wild_type,
            });
        }
        Ok(Self {
            position,
            wild_type,
            mutant,
        })
    }

    /// Parses `W192H` notation where the number is an author residue number
    /// resolved through `numbering`.
    pub fn parse_with_numbering(
        notation: &str,
        numbering: &ResidueNumbering,
    ) -> Result<Self, MutationError> {
        let malformed = || MutationError::MalformedNotation(notation.to_string());
        let trimmed = notation.trim();
        let mut chars = trimmed.chars();
        let wild_type = chars
            .next()
            .and_then(AminoAcid::from_one_letter)
            .ok_or_else(malformed)?;
        let mutant = chars
            .next_back()
            .and_then(AminoAcid::from_one_letter)
            .ok_or_else(malformed)?;
        let number: i32 = chars.as_str().parse().map_err(|_| malformed())?;
        let position = numbering.to_sequence_position(number).ok_or_else(|| {
            MutationError::UnmappedResidueNumber {
                notation: notation.to_string(),
                number,
            }
        })?;
        Self::new(position, wild_type, mutant)
    }

    /// Renders the substitution with its author residue number. Positions the
    /// numbering does not cover keep their sequence position.
    pub fn notation_with_numbering(&self, numbering: &ResidueNumbering) -> String {
        match numbering.to_author_number(self.position) {
            Some(number) => format!("{}{}{}", self.wild_type, number, self.mutant),
            None => self.to_string(),
        }
    }
}

impl FromStr for ResidueSubstitution {
    type Err = MutationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_numbering(s, &ResidueNumbering::identity())
    }
}

impl fmt::Display for ResidueSubstitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.wild_type, self.position, self.mutant)
    }
}

/// A named variant: an ordered, position-unique list of substitutions with an
/// optional experimental efficiency label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationSet {
    id: String,
    substitutions: Vec<ResidueSubstitution>,
    label: Option<f64>,
}

impl MutationSet {
    pub fn new(
        id: impl Into<String>,
        substitutions: Vec<ResidueSubstitution>,
        label: Option<f64>,
    ) -> Result<Self, MutationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(MutationError::EmptyIdentifier);
        }
        let mut seen = HashSet::with_capacity(substitutions.len());
        for substitution in &substitutions {
            if !seen.insert(substitution.position) {
                return Err(MutationError::DuplicatePosition {
                    id,
                    position: substitution.position,
                });
            }
        }
        if let Some(value) = label {
            if !(LABEL_RANGE.0..=LABEL_RANGE.1).contains(&value) {
                return Err(MutationError::LabelOutOfRange { id, label: value });
            }
        }
        Ok(Self {
            id,
            substitutions,
            label,
        })
    }

    pub fn from_notation(
        id: impl Into<String>,
        notations: &[&str],
        label: Option<f64>,
    ) -> Result<Self, MutationError> {
        Self::from_notation_with_numbering(id, notations, label, &ResidueNumbering::identity())
    }

    pub fn from_notation_with_numbering<S: AsRef<str>>(
        id: impl Into<String>,
        notations: &[S],
        label: Option<f64>,
        numbering: &ResidueNumbering,
    ) -> Result<Self, MutationError> {
        let substitutions = notations
            .iter()
            .map(|n| ResidueSubstitution::parse_with_numbering(n.as_ref(), numbering))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(id, substitutions, label)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn substitutions(&self) -> &[ResidueSubstitution] {
        &self.substitutions
    }

    pub fn label(&self) -> Option<f64> {
        self.label
    }

    pub fn len(&self) -> usize {
        self.substitutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.substitutions.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = u32> + '_ {
        self.substitutions.iter().map(|s| s.position)
    }

    pub fn notation(&self) -> Vec<String> {
        self.substitutions.iter().map(ToString::to_string).collect()
    }

    pub fn notation_with_numbering(&self, numbering: &ResidueNumbering) -> Vec<String> {
        self.substitutions
            .iter()
            .map(|s| s.notation_with_numbering(numbering))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_notation() {
        let sub: ResidueSubstitution = "W192H".parse().unwrap();
        assert_eq!(sub.position, 192);
        assert_eq!(sub.wild_type, AminoAcid::Tryptophan);
        assert_eq!(sub.mutant, AminoAcid::Histidine);
        assert_eq!(sub.to_string(), "W192H");
    }

    #[test]
    fn parse_rejects_malformed_notation() {
        for bad in ["", "W", "192H", "W192", "WxH", "X192H", "W19.2H"] {
            assert!(
                matches!(
                    bad.parse::<ResidueSubstitution>(),
                    Err(MutationError::MalformedNotation(_))
                ),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn parse_rejects_silent_substitution() {
        assert!(matches!(
            "V215V".parse::<ResidueSubstitution>(),
            Err(MutationError::SilentSubstitution { position: 215, .. })
        ));
    }

    #[test]
    fn parse_resolves_author_numbering() {
        let numbering = ResidueNumbering::from_pairs([(215, 213)]);
        let sub = ResidueSubstitution::parse_with_numbering("V215G", &numbering).unwrap();
        assert_eq!(sub.position, 213);

        let result = ResidueSubstitution::parse_with_numbering("W192H", &numbering);
        assert!(matches!(
            result,
            Err(MutationError::UnmappedResidueNumber { number: 192, .. })
        ));
    }

    #[test]
    fn notation_reports_author_numbers() {
        let numbering = ResidueNumbering::from_pairs([(192, 4), (215, 6)]);
        let set =
            MutationSet::from_notation_with_numbering("m", &["W192H", "V215G"], None, &numbering)
                .unwrap();

        assert_eq!(set.notation(), vec!["W4H", "V6G"]);
        assert_eq!(set.notation_with_numbering(&numbering), vec!["W192H", "V215G"]);
        assert_eq!(
            set.notation_with_numbering(&ResidueNumbering::identity()),
            vec!["W4H", "V6G"]
        );
    }

    #[test]
    fn mutation_set_rejects_duplicate_positions() {
        let result = MutationSet::from_notation("m", &["A193G", "A193L"], None);
        assert!(matches!(
            result,
            Err(MutationError::DuplicatePosition { position: 193, .. })
        ));
    }

    #[test]
    fn mutation_set_rejects_label_outside_range() {
        assert!(matches!(
            MutationSet::from_notation("m", &["A193G"], Some(100.5)),
            Err(MutationError::LabelOutOfRange { .. })
        ));
        assert!(MutationSet::from_notation("m", &["A193G"], Some(0.0)).is_ok());
        assert!(MutationSet::from_notation("m", &["A193G"], Some(100.0)).is_ok());
    }

    #[test]
    fn mutation_set_rejects_blank_identifier() {
        assert_eq!(
            MutationSet::from_notation("  ", &["A193G"], None),
            Err(MutationError::EmptyIdentifier)
        );
    }

    #[test]
    fn mutation_set_preserves_substitution_order() {
        let set = MutationSet::from_notation("m", &["V215G", "W192H"], Some(86.0)).unwrap();
        assert_eq!(set.notation(), vec!["V215G", "W192H"]);
        assert_eq!(set.positions().collect::<Vec<_>>(), vec![215, 192]);
        assert_eq!(set.label(), Some(86.0));
    }
}
