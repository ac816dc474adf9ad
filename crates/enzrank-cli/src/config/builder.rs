use super::defaults::DefaultsConfig;
use super::file::{FileEnumeration, FileEntry, FileObjective, FileScan, RunFile};
use super::models::{PredictConfig, RunInputs, ScanConfig, ValidateConfig};
use crate::cli::{PredictArgs, RunArgs, ValidateArgs};
use crate::error::{CliError, Result};
use crate::utils::parser::{self, parse_alphabet};
use enzrank::core::models::complex::{AnchorAtom, LigandAtom, LigandTemplate, ReferenceComplex};
use enzrank::core::models::mutation::{MutationSet, ResidueSubstitution};
use enzrank::core::models::residue::AminoAcid;
use enzrank::core::models::sequence::{ReferenceSequence, ResidueNumbering};
use enzrank::core::scoring::tables::{PositionSpecificFitness, TabulatedDesignScorer};
use enzrank::engine::config::{CompositeWeights, Objective, PipelineConfigBuilder};
use enzrank::engine::enumeration::EnumerationSettings;
use enzrank::engine::ensemble::ReplicateSource;
use enzrank::engine::error::EngineError;
use nalgebra::Point3;
use std::collections::BTreeMap;
use tracing::debug;

pub fn build_validate_config(args: &ValidateArgs) -> Result<ValidateConfig> {
    let file = load_run_file(&args.run)?;
    let inputs = build_inputs(&file, &args.run, FileObjective::Fitness)?;

    if file.mutation_sets.is_empty() {
        return Err(CliError::Config(
            "validation requires at least one [[mutation-sets]] entry".to_string(),
        ));
    }
    let mutation_sets = file
        .mutation_sets
        .iter()
        .map(|set| {
            MutationSet::from_notation_with_numbering(
                set.id.clone(),
                &set.substitutions,
                set.label,
                &inputs.numbering,
            )
            .map_err(EngineError::from)
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let scan = match (&file.scan, args.no_scan) {
        (Some(scan), false) => Some(build_scan(scan, &inputs.numbering)?),
        _ => None,
    };

    Ok(ValidateConfig {
        inputs,
        mutation_sets,
        scan,
    })
}

pub fn build_predict_config(args: &PredictArgs) -> Result<PredictConfig> {
    let file = load_run_file(&args.run)?;
    let inputs = build_inputs(&file, &args.run, FileObjective::Composite)?;
    let section = file.enumeration.as_ref().ok_or_else(|| {
        CliError::Config("prediction requires an [enumeration] section".to_string())
    })?;
    let enumeration = build_enumeration(section, args, &inputs)?;

    Ok(PredictConfig {
        inputs,
        enumeration,
    })
}

fn load_run_file(args: &RunArgs) -> Result<RunFile> {
    let file = RunFile::from_file(&args.config)?;
    apply_set_values(file, &args.set_values)
}

fn build_inputs(file: &RunFile, args: &RunArgs, default_objective: FileObjective) -> Result<RunInputs> {
    let defaults = DefaultsConfig::default();

    let reference = ReferenceSequence::new(&file.reference.sequence).map_err(EngineError::from)?;
    let numbering = ResidueNumbering::from_pairs(file.reference.numbering.iter().copied());

    let anchors = file
        .structure
        .anchors
        .iter()
        .map(|a| AnchorAtom {
            name: a.name.clone(),
            position: Point3::from(a.position),
        })
        .collect();
    let mut residues = BTreeMap::new();
    for residue in &file.structure.residues {
        let position = resolve_number(residue.number, &numbering)?;
        residues.insert(position, Point3::from(residue.position));
    }
    let structure = ReferenceComplex::new(anchors, residues);

    let template = LigandTemplate::new(
        &file.ligand.name,
        file.ligand
            .atoms
            .iter()
            .map(|a| LigandAtom::new(&a.name, &a.element, Point3::from(a.position)))
            .collect(),
        file.ligand.anchors.clone(),
    );

    let fitness = PositionSpecificFitness::new(&reference, file.fitness.baseline)
        .with_unlisted_effect(file.fitness.unlisted_effect)
        .with_effects(resolve_entries(&file.fitness.effects, &numbering, &reference)?);
    let design = match &file.design {
        Some(design) => Some(TabulatedDesignScorer::from_entries(resolve_entries(
            &design.entries,
            &numbering,
            &reference,
        )?)),
        None => None,
    };
    let replicates = match &file.replicates {
        Some(map) => ReplicateSource::External(map.clone()),
        None => ReplicateSource::Objective,
    };

    let scoring = &file.scoring;
    let objective = match scoring.objective.unwrap_or(default_objective) {
        FileObjective::Fitness => Objective::Fitness,
        FileObjective::Composite => {
            Objective::Composite(scoring.composite.unwrap_or_else(CompositeWeights::default))
        }
    };
    let mut builder = PipelineConfigBuilder::new()
        .tie_epsilon(
            args.tie_epsilon
                .or(scoring.tie_epsilon)
                .unwrap_or(defaults.tie_epsilon),
        )
        .proximity_radius(scoring.proximity_radius.unwrap_or(defaults.proximity_radius))
        .top_n(args.top_n.or(scoring.top_n).unwrap_or(defaults.top_n))
        .objective(objective);
    if let Some(tolerance) = args.rmsd_tolerance.or(scoring.rmsd_tolerance) {
        builder = builder.rmsd_tolerance(tolerance);
    }
    for completion in &file.ligand.completions {
        builder = builder.completion(completion.clone());
    }
    let pipeline = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;
    debug!(?pipeline, "Pipeline configuration resolved.");

    Ok(RunInputs {
        reference,
        numbering,
        structure,
        template,
        fitness,
        design,
        replicates,
        pipeline,
        output_dir: args.output.clone(),
    })
}

fn build_scan(scan: &FileScan, numbering: &ResidueNumbering) -> Result<ScanConfig> {
    let defaults = DefaultsConfig::default();
    let alphabet = parse_alphabet(scan.alphabet.as_deref().unwrap_or(&defaults.alphabet))?;
    let recovery_positions = match &scan.recovery_positions {
        Some(numbers) => Some(
            numbers
                .iter()
                .map(|&n| resolve_number(n, numbering))
                .collect::<Result<_>>()?,
        ),
        None => None,
    };
    Ok(ScanConfig {
        alphabet,
        recovery_positions,
    })
}

fn build_enumeration(
    section: &FileEnumeration,
    args: &PredictArgs,
    inputs: &RunInputs,
) -> Result<EnumerationSettings> {
    let defaults = DefaultsConfig::default();
    let fixed = section
        .fixed
        .iter()
        .map(|notation| resolve_substitution(notation, &inputs.numbering, &inputs.reference))
        .collect::<Result<Vec<_>>>()?;
    let active_positions = section
        .active_positions
        .iter()
        .map(|&n| resolve_number(n, &inputs.numbering))
        .collect::<Result<Vec<_>>>()?;
    let alphabet = parse_alphabet(section.alphabet.as_deref().unwrap_or(&defaults.alphabet))?;

    Ok(EnumerationSettings {
        fixed,
        active_positions,
        alphabet,
        min_size: section.min_size.unwrap_or(defaults.min_size),
        max_size: section.max_size.unwrap_or(defaults.max_size),
        draws: args.draws.or(section.draws).unwrap_or(defaults.draws),
        seed: args.seed.or(section.seed).unwrap_or(defaults.seed),
    })
}

fn resolve_number(number: i32, numbering: &ResidueNumbering) -> Result<u32> {
    numbering.to_sequence_position(number).ok_or_else(|| {
        CliError::Config(format!(
            "residue number {} has no position in the reference numbering",
            number
        ))
    })
}

fn resolve_substitution(
    notation: &str,
    numbering: &ResidueNumbering,
    reference: &ReferenceSequence,
) -> Result<ResidueSubstitution> {
    let substitution =
        ResidueSubstitution::parse_with_numbering(notation, numbering).map_err(EngineError::from)?;
    reference
        .check_substitution(&substitution)
        .map_err(EngineError::from)?;
    Ok(substitution)
}

fn resolve_entries(
    entries: &[FileEntry],
    numbering: &ResidueNumbering,
    reference: &ReferenceSequence,
) -> Result<Vec<(u32, AminoAcid, f64)>> {
    entries
        .iter()
        .map(|entry| {
            let s = resolve_substitution(&entry.substitution, numbering, reference)?;
            Ok((s.position, s.mutant, entry.value))
        })
        .collect()
}

fn apply_set_values(mut file: RunFile, set_values: &[String]) -> Result<RunFile> {
    for pair in set_values {
        let (key, value) = parser::split_key_value(pair)?;
        match key {
            "scoring.tie-epsilon" => {
                file.scoring.tie_epsilon = Some(parser::parse_value(key, "float", value)?);
            }
            "scoring.proximity-radius" => {
                file.scoring.proximity_radius = Some(parser::parse_value(key, "float", value)?);
            }
            "scoring.rmsd-tolerance" => {
                file.scoring.rmsd_tolerance = Some(parser::parse_value(key, "float", value)?);
            }
            "scoring.top-n" => {
                file.scoring.top_n = Some(parser::parse_value(key, "integer", value)?);
            }
            "scoring.objective" => {
                file.scoring.objective = Some(match value {
                    "fitness" => FileObjective::Fitness,
                    "composite" => FileObjective::Composite,
                    _ => {
                        return Err(CliError::Config(format!(
                            "Invalid objective '{}': expected 'fitness' or 'composite'",
                            value
                        )));
                    }
                });
            }
            "enumeration.seed" => {
                file.enumeration.get_or_insert_with(Default::default).seed =
                    Some(parser::parse_value(key, "integer", value)?);
            }
            "enumeration.draws" => {
                file.enumeration.get_or_insert_with(Default::default).draws =
                    Some(parser::parse_value(key, "integer", value)?);
            }
            "enumeration.min-size" => {
                file.enumeration.get_or_insert_with(Default::default).min_size =
                    Some(parser::parse_value(key, "integer", value)?);
            }
            "enumeration.max-size" => {
                file.enumeration.get_or_insert_with(Default::default).max_size =
                    Some(parser::parse_value(key, "integer", value)?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::{TempDir, tempdir};

    const RUN_FILE: &str = r#"
        [reference]
        sequence = "MWAVGTMKLS"
        numbering = [[190, 2], [191, 3], [192, 4], [194, 6]]

        [structure]
        anchors = [
            { name = "N", position = [0.0, 0.0, 0.0] },
            { name = "CA", position = [1.5, 0.0, 0.0] },
            { name = "C", position = [2.0, 1.4, 0.0] },
        ]
        residues = [
            { number = 190, position = [1.0, 1.0, 0.0] },
            { number = 192, position = [3.0, 1.0, 0.0] },
        ]

        [ligand]
        name = "probe"
        anchors = ["N", "CA", "C"]
        atoms = [
            { name = "N", element = "N", position = [0.0, 0.0, 0.0] },
            { name = "CA", element = "C", position = [1.5, 0.0, 0.0] },
            { name = "C", element = "C", position = [2.0, 1.4, 0.0] },
        ]
        completions = [
            { name = "CB2", element = "C", center = "CA", neighbors = ["N", "C", "CB"] },
        ]

        [scoring]
        tie-epsilon = 1e-6
        top-n = 4

        [fitness]
        baseline = 1.0
        effects = [{ substitution = "W190H", value = 0.5 }]

        [design]
        entries = [{ substitution = "V192G", value = 0.9 }]

        [[mutation-sets]]
        id = "mutant_1"
        substitutions = ["W190H", "V192G"]
        label = 86.0

        [scan]
        alphabet = "GH"
        recovery-positions = [190, 192]

        [enumeration]
        fixed = ["V192G"]
        active-positions = [190, 191, 194]
        min-size = 1
        max-size = 2
        draws = 40
    "#;

    fn write_run_file(content: &str) -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    fn run_args(config: &Path) -> RunArgs {
        RunArgs {
            config: config.to_path_buf(),
            output: PathBuf::from("out"),
            ..RunArgs::default()
        }
    }

    #[test]
    fn validate_config_resolves_author_numbering() {
        let (_dir, path) = write_run_file(RUN_FILE);
        let args = ValidateArgs {
            run: run_args(&path),
            no_scan: false,
        };

        let config = build_validate_config(&args).unwrap();

        let set = &config.mutation_sets[0];
        assert_eq!(set.positions().collect::<Vec<_>>(), vec![2, 4]);
        assert_eq!(set.label(), Some(86.0));
        assert_eq!(
            config.inputs.structure.residue_positions().keys().copied().collect::<Vec<_>>(),
            vec![2, 4]
        );
        let scan = config.scan.unwrap();
        assert_eq!(scan.alphabet, vec![AminoAcid::Glycine, AminoAcid::Histidine]);
        assert_eq!(
            scan.recovery_positions.unwrap().into_iter().collect::<Vec<_>>(),
            vec![2, 4]
        );
        assert_eq!(config.inputs.pipeline.objective, Objective::Fitness);
        assert_eq!(config.inputs.pipeline.tie_epsilon, 1e-6);
        assert_eq!(config.inputs.pipeline.top_n, 4);
        assert_eq!(config.inputs.pipeline.graft.completions.len(), 1);
        assert_eq!(config.inputs.design.unwrap().get(4, AminoAcid::Glycine), Some(0.9));
    }

    #[test]
    fn cli_overrides_file_values() {
        let (_dir, path) = write_run_file(RUN_FILE);
        let args = ValidateArgs {
            run: RunArgs {
                tie_epsilon: Some(1e-3),
                top_n: Some(2),
                rmsd_tolerance: Some(0.5),
                ..run_args(&path)
            },
            no_scan: true,
        };

        let config = build_validate_config(&args).unwrap();

        assert_eq!(config.inputs.pipeline.tie_epsilon, 1e-3);
        assert_eq!(config.inputs.pipeline.top_n, 2);
        assert_eq!(config.inputs.pipeline.graft.rmsd_tolerance, Some(0.5));
        assert!(config.scan.is_none());
    }

    #[test]
    fn predict_config_defaults_to_composite_objective() {
        let (_dir, path) = write_run_file(RUN_FILE);
        let args = PredictArgs {
            run: run_args(&path),
            seed: Some(11),
            draws: None,
        };

        let config = build_predict_config(&args).unwrap();

        assert_eq!(
            config.inputs.pipeline.objective,
            Objective::Composite(CompositeWeights::default())
        );
        let enumeration = config.enumeration;
        assert_eq!(enumeration.seed, 11);
        assert_eq!(enumeration.draws, 40);
        assert_eq!(enumeration.active_positions, vec![2, 3, 6]);
        assert_eq!(enumeration.fixed[0].to_string(), "V4G");
        assert_eq!(enumeration.alphabet.len(), 18);
    }

    #[test]
    fn set_values_override() {
        let (_dir, path) = write_run_file(RUN_FILE);
        let args = PredictArgs {
            run: RunArgs {
                set_values: vec![
                    "scoring.proximity-radius=12.5".to_string(),
                    "scoring.objective=fitness".to_string(),
                    "enumeration.seed=99".to_string(),
                    "enumeration.max-size=3".to_string(),
                ],
                ..run_args(&path)
            },
            seed: None,
            draws: None,
        };

        let config = build_predict_config(&args).unwrap();

        assert_eq!(config.inputs.pipeline.proximity_radius, 12.5);
        assert_eq!(config.inputs.pipeline.objective, Objective::Fitness);
        assert_eq!(config.enumeration.seed, 99);
        assert_eq!(config.enumeration.max_size, 3);
    }

    #[test]
    fn unsupported_set_key_is_rejected() {
        let (_dir, path) = write_run_file(RUN_FILE);
        let args = ValidateArgs {
            run: RunArgs {
                set_values: vec!["scoring.unknown=1".to_string()],
                ..run_args(&path)
            },
            no_scan: false,
        };

        assert!(matches!(build_validate_config(&args), Err(CliError::Config(_))));
    }

    #[test]
    fn wild_type_mismatch_in_tables_is_an_error() {
        let content = RUN_FILE.replace(
            r#"substitution = "W190H", value = 0.5"#,
            r#"substitution = "A190H", value = 0.5"#,
        );
        let (_dir, path) = write_run_file(&content);
        let args = ValidateArgs {
            run: run_args(&path),
            no_scan: false,
        };

        assert!(matches!(
            build_validate_config(&args),
            Err(CliError::Engine(EngineError::SequenceValidation(_)))
        ));
    }

    #[test]
    fn prediction_without_enumeration_section_is_rejected() {
        let content = RUN_FILE
            .split("[enumeration]")
            .next()
            .unwrap()
            .to_string();
        let (_dir, path) = write_run_file(&content);
        let args = PredictArgs {
            run: run_args(&path),
            seed: None,
            draws: None,
        };

        assert!(matches!(build_predict_config(&args), Err(CliError::Config(_))));
    }
}
