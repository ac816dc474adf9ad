use enzrank::core::models::complex::{LigandTemplate, ReferenceComplex};
use enzrank::core::models::mutation::MutationSet;
use enzrank::core::models::residue::AminoAcid;
use enzrank::core::models::sequence::{ReferenceSequence, ResidueNumbering};
use enzrank::core::scoring::tables::{PositionSpecificFitness, TabulatedDesignScorer};
use enzrank::engine::config::PipelineConfig;
use enzrank::engine::enumeration::EnumerationSettings;
use enzrank::engine::ensemble::ReplicateSource;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Inputs shared by both commands, resolved from the run file.
pub struct RunInputs {
    pub reference: ReferenceSequence,
    pub numbering: ResidueNumbering,
    pub structure: ReferenceComplex,
    pub template: LigandTemplate,
    pub fitness: PositionSpecificFitness,
    pub design: Option<TabulatedDesignScorer>,
    pub replicates: ReplicateSource,
    pub pipeline: PipelineConfig,
    pub output_dir: PathBuf,
}

pub struct ScanConfig {
    pub alphabet: Vec<AminoAcid>,
    pub recovery_positions: Option<BTreeSet<u32>>,
}

pub struct ValidateConfig {
    pub inputs: RunInputs,
    pub mutation_sets: Vec<MutationSet>,
    pub scan: Option<ScanConfig>,
}

pub struct PredictConfig {
    pub inputs: RunInputs,
    pub enumeration: EnumerationSettings,
}
