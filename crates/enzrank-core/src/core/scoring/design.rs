use super::{DesignScorer, ScoringError, UnsupportedReason};
use crate::core::models::complex::{GraftedComplex, ReferenceComplex};
use crate::core::models::mutation::{MutationSet, ResidueSubstitution};
use crate::core::models::sequence::ReferenceSequence;
use kiddo::{KdTree, SquaredEuclidean};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

/// The region a design model is allowed to score: residues of the reference
/// sequence whose representative coordinate lies within `radius` of a heavy atom
/// of the grafted ligand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindingSite {
    sequence_length: usize,
    radius: f64,
    nearest_ligand_distance: BTreeMap<u32, f64>,
    positions: BTreeSet<u32>,
}

impl BindingSite {
    #[instrument(level = "debug", skip_all, fields(ligand = %grafted.ligand_name, radius = radius))]
    pub fn from_complex(
        reference: &ReferenceComplex,
        grafted: &GraftedComplex,
        sequence_length: usize,
        radius: f64,
    ) -> Self {
        let ligand_heavy_atom_positions = grafted.heavy_atom_positions();
        let radius_sq = radius * radius;

        let nearest_ligand_distance: BTreeMap<u32, f64> = if ligand_heavy_atom_positions.is_empty()
        {
            reference
                .residue_positions()
                .keys()
                .map(|&position| (position, f64::INFINITY))
                .collect()
        } else {
            let kdtree: KdTree<f64, 3> = (&ligand_heavy_atom_positions).into();
            reference
                .residue_positions()
                .iter()
                .map(|(&position, point)| {
                    let nearest = kdtree.nearest_one::<SquaredEuclidean>(&[point.x, point.y, point.z]);
                    (position, nearest.distance.sqrt())
                })
                .collect()
        };

        let positions: BTreeSet<u32> = nearest_ligand_distance
            .iter()
            .filter(|&(&position, &distance)| {
                position as usize <= sequence_length && distance * distance <= radius_sq
            })
            .map(|(&position, _)| position)
            .collect();

        debug!(
            residues = nearest_ligand_distance.len(),
            site_size = positions.len(),
            "Binding site selected."
        );

        Self {
            sequence_length,
            radius,
            nearest_ligand_distance,
            positions,
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn positions(&self) -> &BTreeSet<u32> {
        &self.positions
    }

    pub fn contains(&self, position: u32) -> bool {
        self.positions.contains(&position)
    }

    pub fn nearest_ligand_distance(&self, position: u32) -> Option<f64> {
        self.nearest_ligand_distance.get(&position).copied()
    }

    pub fn check_position(&self, position: u32) -> Result<(), ScoringError> {
        if position == 0 || position as usize > self.sequence_length {
            return Err(ScoringError::UnsupportedPosition {
                position,
                reason: UnsupportedReason::OutsideSequence {
                    length: self.sequence_length,
                },
            });
        }
        if !self.nearest_ligand_distance.contains_key(&position) {
            return Err(ScoringError::UnsupportedPosition {
                position,
                reason: UnsupportedReason::NoCoordinates,
            });
        }
        if !self.positions.contains(&position) {
            return Err(ScoringError::UnsupportedPosition {
                position,
                reason: UnsupportedReason::OutsideBindingSite {
                    radius: self.radius,
                },
            });
        }
        Ok(())
    }
}

/// Scores a batch of substitutions, rejecting any position outside `site` before
/// the scorer is called and any returned value that is not a finite number in
/// 0.0 to 1.0 afterwards. Scores are returned in the order of `substitutions`.
pub fn score_substitutions<S: DesignScorer + ?Sized>(
    scorer: &S,
    site: &BindingSite,
    complex: &GraftedComplex,
    substitutions: &[ResidueSubstitution],
) -> Result<Vec<f64>, ScoringError> {
    if substitutions.is_empty() {
        return Ok(Vec::new());
    }
    for substitution in substitutions {
        site.check_position(substitution.position)?;
    }

    let scores = scorer.score_batch(complex, substitutions)?;
    if scores.len() != substitutions.len() {
        return Err(ScoringError::BatchLengthMismatch {
            expected: substitutions.len(),
            found: scores.len(),
        });
    }

    for (substitution, &value) in substitutions.iter().zip(scores.iter()) {
        if !value.is_finite() {
            return Err(ScoringError::NonFinite {
                context: substitution.to_string(),
            });
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(ScoringError::OutOfRange {
                substitution: substitution.to_string(),
                value,
            });
        }
    }
    Ok(scores)
}

/// Design scores of every substitution in `set`, keyed by position.
pub fn score_design_positions<S: DesignScorer + ?Sized>(
    scorer: &S,
    site: &BindingSite,
    complex: &GraftedComplex,
    reference: &ReferenceSequence,
    set: &MutationSet,
) -> Result<Vec<(u32, f64)>, ScoringError> {
    for substitution in set.substitutions() {
        reference.check_substitution(substitution)?;
    }
    let scores = score_substitutions(scorer, site, complex, set.substitutions())?;
    Ok(set.positions().zip(scores).collect())
}
