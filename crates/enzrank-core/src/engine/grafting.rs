use crate::core::models::complex::{GraftedComplex, LigandAtom, LigandTemplate, ReferenceComplex};
use crate::core::utils::geometry::{GeometryError, place_tetrahedral_substituent, superpose};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

/// C-C single bond length in angstroms.
pub const SP3_CARBON_BOND_LENGTH: f64 = 1.54;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraftError {
    #[error("Ligand template '{template}' has no atom named '{name}'")]
    MissingTemplateAtom { template: String, name: String },

    #[error("Reference structure provides no anchor atom named '{name}'")]
    MissingReferenceAnchor { name: String },

    #[error("Anchor RMSD {rmsd:.4} A exceeds the tolerance of {tolerance:.4} A")]
    RmsdAboveTolerance { rmsd: f64, tolerance: f64 },

    #[error("Cannot place substituent '{name}' on '{center}': neighbor geometry is planar")]
    DegenerateCompletion { name: String, center: String },

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// A substituent placed after superposition, opposite the three bonds from
/// `center` to `neighbors`. Replaces the atom of the same name when the template
/// already has one, and is appended otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SubstituentCompletion {
    pub name: String,
    pub element: String,
    pub center: String,
    pub neighbors: [String; 3],
    #[serde(default = "default_bond_length")]
    pub bond_length: f64,
}

fn default_bond_length() -> f64 {
    SP3_CARBON_BOND_LENGTH
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraftOptions {
    pub rmsd_tolerance: Option<f64>,
    pub completions: Vec<SubstituentCompletion>,
}

/// Places `template` into the reference frame by least-squares superposition of
/// its anchor atoms onto the reference anchors of the same name.
///
/// # Errors
///
/// Fails on a missing anchor on either side, on degenerate anchor geometry, when
/// the anchor RMSD exceeds `options.rmsd_tolerance`, and when a requested
/// completion cannot be placed.
#[instrument(skip_all, name = "graft_ligand", fields(template = %template.name))]
pub fn graft_ligand(
    reference: &ReferenceComplex,
    template: &LigandTemplate,
    options: &GraftOptions,
) -> Result<GraftedComplex, GraftError> {
    let mut from_points = Vec::with_capacity(template.anchor_names.len());
    let mut to_points = Vec::with_capacity(template.anchor_names.len());
    for name in &template.anchor_names {
        let atom = template
            .atom(name)
            .ok_or_else(|| GraftError::MissingTemplateAtom {
                template: template.name.clone(),
                name: name.clone(),
            })?;
        let anchor = reference
            .anchors()
            .iter()
            .find(|a| &a.name == name)
            .ok_or_else(|| GraftError::MissingReferenceAnchor { name: name.clone() })?;
        from_points.push(atom.position);
        to_points.push(anchor.position);
    }

    let superposition = superpose(&from_points, &to_points)?;
    debug!(rmsd = superposition.rmsd, anchors = from_points.len(), "Anchors superposed.");

    if let Some(tolerance) = options.rmsd_tolerance {
        if superposition.rmsd > tolerance {
            return Err(GraftError::RmsdAboveTolerance {
                rmsd: superposition.rmsd,
                tolerance,
            });
        }
    }

    let mut atoms: Vec<LigandAtom> = template
        .atoms
        .iter()
        .map(|atom| LigandAtom {
            name: atom.name.clone(),
            element: atom.element.clone(),
            position: superposition.transform.apply(&atom.position),
        })
        .collect();

    for completion in &options.completions {
        let position = complete_substituent(&atoms, completion, &template.name)?;
        match atoms.iter_mut().find(|a| a.name == completion.name) {
            Some(existing) => existing.position = position,
            None => atoms.push(LigandAtom::new(&completion.name, &completion.element, position)),
        }
    }

    info!(
        ligand = %template.name,
        atoms = atoms.len(),
        rmsd = superposition.rmsd,
        "Ligand grafted into the reference frame."
    );

    Ok(GraftedComplex {
        ligand_name: template.name.clone(),
        atoms,
        anchor_rmsd: superposition.rmsd,
    })
}

fn complete_substituent(
    atoms: &[LigandAtom],
    completion: &SubstituentCompletion,
    template: &str,
) -> Result<Point3<f64>, GraftError> {
    let lookup = |name: &str| {
        atoms
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.position)
            .ok_or_else(|| GraftError::MissingTemplateAtom {
                template: template.to_string(),
                name: name.to_string(),
            })
    };
    let center = lookup(&completion.center)?;
    let neighbors = [
        lookup(&completion.neighbors[0])?,
        lookup(&completion.neighbors[1])?,
        lookup(&completion.neighbors[2])?,
    ];
    place_tetrahedral_substituent(&center, &neighbors, completion.bond_length).ok_or_else(|| {
        GraftError::DegenerateCompletion {
            name: completion.name.clone(),
            center: completion.center.clone(),
        }
    })
}
