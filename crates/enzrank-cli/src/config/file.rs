use crate::error::{CliError, Result};
use enzrank::engine::config::CompositeWeights;
use enzrank::engine::grafting::SubstituentCompletion;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// The TOML run file describing one validation or prediction run.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RunFile {
    pub reference: FileReference,
    pub structure: FileStructure,
    pub ligand: FileLigand,
    #[serde(default)]
    pub scoring: FileScoring,
    #[serde(default)]
    pub fitness: FileFitness,
    pub design: Option<FileDesign>,
    /// Externally produced replicate scores per mutation set identifier.
    pub replicates: Option<BTreeMap<String, Vec<f64>>>,
    #[serde(default)]
    pub mutation_sets: Vec<FileMutationSet>,
    pub scan: Option<FileScan>,
    pub enumeration: Option<FileEnumeration>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileReference {
    pub sequence: String,
    /// `[author-number, sequence-position]` pairs. Empty means identity.
    #[serde(default)]
    pub numbering: Vec<(i32, u32)>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileStructure {
    pub anchors: Vec<FileAnchor>,
    #[serde(default)]
    pub residues: Vec<FileResidue>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileAnchor {
    pub name: String,
    pub position: [f64; 3],
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileResidue {
    /// Author residue number, resolved through the reference numbering.
    pub number: i32,
    pub position: [f64; 3],
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileLigand {
    pub name: String,
    pub anchors: Vec<String>,
    pub atoms: Vec<FileLigandAtom>,
    #[serde(default)]
    pub completions: Vec<SubstituentCompletion>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileLigandAtom {
    pub name: String,
    pub element: String,
    pub position: [f64; 3],
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileObjective {
    Fitness,
    Composite,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileScoring {
    pub tie_epsilon: Option<f64>,
    pub proximity_radius: Option<f64>,
    pub rmsd_tolerance: Option<f64>,
    pub top_n: Option<usize>,
    pub objective: Option<FileObjective>,
    pub composite: Option<CompositeWeights>,
}

/// A substitution in `W192H` notation with an associated value.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileEntry {
    pub substitution: String,
    pub value: f64,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileFitness {
    #[serde(default)]
    pub baseline: f64,
    #[serde(default)]
    pub unlisted_effect: f64,
    #[serde(default)]
    pub effects: Vec<FileEntry>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileDesign {
    #[serde(default)]
    pub entries: Vec<FileEntry>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileMutationSet {
    pub id: String,
    pub substitutions: Vec<String>,
    pub label: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileScan {
    pub alphabet: Option<String>,
    /// Author residue numbers; observed substitutions elsewhere are ignored.
    pub recovery_positions: Option<Vec<i32>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileEnumeration {
    #[serde(default)]
    pub fixed: Vec<String>,
    #[serde(default)]
    pub active_positions: Vec<i32>,
    pub alphabet: Option<String>,
    pub min_size: Option<usize>,
    pub max_size: Option<usize>,
    pub draws: Option<usize>,
    pub seed: Option<u64>,
}

impl RunFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading run file from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const MINIMAL: &str = r#"
        [reference]
        sequence = "MWAVGT"

        [structure]
        anchors = [
            { name = "N", position = [0.0, 0.0, 0.0] },
            { name = "CA", position = [1.5, 0.0, 0.0] },
            { name = "C", position = [2.0, 1.4, 0.0] },
        ]

        [ligand]
        name = "probe"
        anchors = ["N", "CA", "C"]
        atoms = [
            { name = "N", element = "N", position = [0.0, 0.0, 0.0] },
            { name = "CA", element = "C", position = [1.5, 0.0, 0.0] },
            { name = "C", element = "C", position = [2.0, 1.4, 0.0] },
        ]
    "#;

    #[test]
    fn minimal_run_file_uses_empty_sections() {
        let file: RunFile = toml::from_str(MINIMAL).unwrap();

        assert_eq!(file.reference.sequence, "MWAVGT");
        assert!(file.reference.numbering.is_empty());
        assert_eq!(file.structure.anchors.len(), 3);
        assert!(file.scoring.tie_epsilon.is_none());
        assert!(file.mutation_sets.is_empty());
        assert!(file.design.is_none());
        assert!(file.replicates.is_none());
    }

    #[test]
    fn reads_full_sections_with_kebab_case_keys() {
        let toml = format!(
            r#"{MINIMAL}
            [scoring]
            tie-epsilon = 1e-6
            objective = "composite"
            composite = {{ size-penalty = 0.5, reference-size = 4 }}

            [[mutation-sets]]
            id = "mutant_1"
            substitutions = ["W2H", "V4G"]
            label = 86.0

            [enumeration]
            fixed = ["V4G"]
            active-positions = [2, 3]
            min-size = 1
            "#
        );
        let file: RunFile = toml::from_str(&toml).unwrap();

        assert_eq!(file.scoring.objective, Some(FileObjective::Composite));
        let weights = file.scoring.composite.unwrap();
        assert_eq!(weights.size_penalty, 0.5);
        assert_eq!(weights.reference_size, 4);
        assert_eq!(weights.fitness, 1.0);
        assert_eq!(file.mutation_sets[0].substitutions, vec!["W2H", "V4G"]);
        assert_eq!(file.enumeration.unwrap().min_size, Some(1));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml = format!("{MINIMAL}\n[scoring]\ntie-epsilom = 0.1\n");
        assert!(toml::from_str::<RunFile>(&toml).is_err());
    }

    #[test]
    fn from_file_reports_the_path_on_parse_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(&path, "[reference]\n").unwrap();

        let result = RunFile::from_file(&path);

        assert!(matches!(result, Err(CliError::FileParsing { path: p, .. }) if p == path));
    }
}
