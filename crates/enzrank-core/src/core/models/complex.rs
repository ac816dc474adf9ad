use nalgebra::Point3;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LigandAtom {
    pub name: String,
    pub element: String,
    pub position: Point3<f64>,
}

impl LigandAtom {
    pub fn new(name: &str, element: &str, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            element: element.to_string(),
            position,
        }
    }

    pub fn is_heavy(&self) -> bool {
        !self.element.trim().eq_ignore_ascii_case("H")
    }
}

/// A named anchor atom and its coordinates on the reference structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnchorAtom {
    pub name: String,
    pub position: Point3<f64>,
}

/// The prepared reference structure: anchor atoms of the native substrate at
/// the binding site plus one representative coordinate per protein residue.
/// Read-only once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceComplex {
    anchors: Vec<AnchorAtom>,
    residue_positions: BTreeMap<u32, Point3<f64>>,
}

impl ReferenceComplex {
    pub fn new(anchors: Vec<AnchorAtom>, residue_positions: BTreeMap<u32, Point3<f64>>) -> Self {
        Self {
            anchors,
            residue_positions,
        }
    }

    pub fn anchors(&self) -> &[AnchorAtom] {
        &self.anchors
    }

    pub fn residue_positions(&self) -> &BTreeMap<u32, Point3<f64>> {
        &self.residue_positions
    }

    pub fn residue_position(&self, position: u32) -> Option<&Point3<f64>> {
        self.residue_positions.get(&position)
    }
}

/// A small-molecule model in its own local frame, with the names of the atoms
/// used as correspondence points for superposition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LigandTemplate {
    pub name: String,
    pub atoms: Vec<LigandAtom>,
    pub anchor_names: Vec<String>,
}

impl LigandTemplate {
    pub fn new(name: &str, atoms: Vec<LigandAtom>, anchor_names: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            atoms,
            anchor_names,
        }
    }

    pub fn atom(&self, name: &str) -> Option<&LigandAtom> {
        self.atoms.iter().find(|a| a.name == name)
    }
}

/// A ligand transformed into the reference frame. Owns its coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraftedComplex {
    pub ligand_name: String,
    pub atoms: Vec<LigandAtom>,
    pub anchor_rmsd: f64,
}

impl GraftedComplex {
    pub fn atom(&self, name: &str) -> Option<&LigandAtom> {
        self.atoms.iter().find(|a| a.name == name)
    }

    pub fn heavy_atom_positions(&self) -> Vec<[f64; 3]> {
        self.atoms
            .iter()
            .filter(|a| a.is_heavy())
            .map(|a| [a.position.x, a.position.y, a.position.z])
            .collect()
    }
}
