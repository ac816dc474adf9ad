use enzrank::core::models::complex::{
    AnchorAtom, GraftedComplex, LigandAtom, LigandTemplate, ReferenceComplex,
};
use enzrank::core::models::mutation::{MutationSet, ResidueSubstitution};
use enzrank::core::models::residue::AminoAcid;
use enzrank::core::models::sequence::ReferenceSequence;
use enzrank::core::scoring::ScoringError;
use enzrank::core::scoring::records::ScoreKind;
use enzrank::core::scoring::tables::{PositionSpecificFitness, TabulatedDesignScorer};
use enzrank::core::utils::geometry::GeometryError;
use enzrank::engine::config::{CompositeWeights, Objective, PipelineConfig, PipelineConfigBuilder};
use enzrank::engine::enumeration::EnumerationSettings;
use enzrank::engine::ensemble::ReplicateSource;
use enzrank::engine::error::EngineError;
use enzrank::engine::grafting::GraftError;
use enzrank::engine::progress::{Progress, ProgressReporter};
use enzrank::engine::state::PipelineStage;
use enzrank::workflows::pipeline::Pipeline;
use enzrank::workflows::predict::{self, PredictionInputs};
use enzrank::workflows::validate::{self, ScanRequest, ValidationInputs};
use nalgebra::{Point3, Rotation3, Vector3};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

const SEQUENCE: &str = "MWAVGTMKLSTAHDE";

fn reference() -> ReferenceSequence {
    ReferenceSequence::new(SEQUENCE).unwrap()
}

fn anchor_positions() -> [(&'static str, Point3<f64>); 3] {
    [
        ("N", Point3::new(1.2, 0.4, -0.3)),
        ("CA", Point3::new(2.4, 1.1, 0.2)),
        ("C", Point3::new(3.1, 0.2, 1.4)),
    ]
}

fn structure() -> ReferenceComplex {
    let anchors = anchor_positions()
        .into_iter()
        .map(|(name, position)| AnchorAtom {
            name: name.to_string(),
            position,
        })
        .collect();
    let residues = (1..=SEQUENCE.len() as u32)
        .map(|p| (p, Point3::new(p as f64 * 1.5, 0.0, 0.0)))
        .collect();
    ReferenceComplex::new(anchors, residues)
}

/// Template whose local frame is the reference frame moved by a known rigid
/// transform, so a correct graft puts `C1` back at `(3.0, 1.0, 0.5)`.
fn template() -> LigandTemplate {
    let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), 1.1)
        * Rotation3::from_axis_angle(&Vector3::z_axis(), -0.4);
    let shift = Vector3::new(-7.0, 3.5, 12.0);
    let local = |p: Point3<f64>| rotation * p + shift;

    let mut atoms: Vec<LigandAtom> = anchor_positions()
        .into_iter()
        .map(|(name, position)| LigandAtom::new(name, &name[..1], local(position)))
        .collect();
    atoms.push(LigandAtom::new("C1", "C", local(Point3::new(3.0, 1.0, 0.5))));
    LigandTemplate::new(
        "probe",
        atoms,
        vec!["N".into(), "CA".into(), "C".into()],
    )
}

fn experimental_sets() -> Vec<MutationSet> {
    vec![
        MutationSet::from_notation("mutant_1", &["W2H"], Some(86.0)).unwrap(),
        MutationSet::from_notation("mutant_3", &["A3G"], Some(83.0)).unwrap(),
        MutationSet::from_notation("mutant_2", &["V4G"], Some(82.0)).unwrap(),
    ]
}

fn fitness(mutant_3: f64, mutant_2: f64) -> PositionSpecificFitness {
    PositionSpecificFitness::new(&reference(), 0.0).with_effects([
        (2, AminoAcid::Histidine, 6.10),
        (3, AminoAcid::Glycine, mutant_3),
        (4, AminoAcid::Glycine, mutant_2),
    ])
}

fn validation_inputs<'a>(
    reference: &'a ReferenceSequence,
    structure: &'a ReferenceComplex,
    template: &'a LigandTemplate,
    fitness: &'a PositionSpecificFitness,
    sets: Vec<MutationSet>,
) -> ValidationInputs<'a> {
    ValidationInputs {
        reference,
        structure,
        template,
        mutation_sets: sets,
        fitness,
        design: None,
        replicates: ReplicateSource::Objective,
        scan: None,
    }
}

#[test]
fn graft_recovers_the_known_transform() {
    let config = PipelineConfigBuilder::new()
        .rmsd_tolerance(1e-6)
        .build()
        .unwrap();
    let reference = reference();
    let structure = structure();
    let reporter = ProgressReporter::new();
    let mut pipeline =
        Pipeline::new(&config, &reference, &structure, experimental_sets(), &reporter).unwrap();

    let grafted = pipeline.prepare_structure(&template()).unwrap();

    assert!(grafted.anchor_rmsd < 1e-6);
    let payload = grafted.atom("C1").unwrap().position;
    assert!((payload - Point3::new(3.0, 1.0, 0.5)).norm() < 1e-6);
    for (name, expected) in anchor_positions() {
        assert!((grafted.atom(name).unwrap().position - expected).norm() < 1e-6);
    }
    assert_eq!(pipeline.stage(), PipelineStage::StructureReady);
}

#[test]
fn collinear_anchors_fail_the_run() {
    let config = PipelineConfig::default();
    let reference = reference();
    let anchors = ["N", "CA", "C"]
        .iter()
        .enumerate()
        .map(|(i, name)| AnchorAtom {
            name: name.to_string(),
            position: Point3::new(i as f64, 0.0, 0.0),
        })
        .collect();
    let structure = ReferenceComplex::new(anchors, BTreeMap::new());
    let collinear = LigandTemplate::new(
        "line",
        ["N", "CA", "C"]
            .iter()
            .enumerate()
            .map(|(i, name)| LigandAtom::new(name, "C", Point3::new(0.0, i as f64 * 2.0, 0.0)))
            .collect(),
        vec!["N".into(), "CA".into(), "C".into()],
    );
    let reporter = ProgressReporter::new();
    let mut pipeline =
        Pipeline::new(&config, &reference, &structure, experimental_sets(), &reporter).unwrap();

    let result = pipeline.prepare_structure(&collinear).map(|_| ());

    assert_eq!(
        result,
        Err(EngineError::Graft(GraftError::Geometry(
            GeometryError::DegenerateGeometry { rank: 1 }
        )))
    );
    assert_eq!(pipeline.stage(), PipelineStage::Failed);
}

#[test]
fn fitness_ranking_matches_experimental_order() {
    let config = PipelineConfig::default();
    let (reference, structure, template) = (reference(), structure(), template());
    let fitness = fitness(5.70, 5.60);

    let result = validate::run(
        validation_inputs(&reference, &structure, &template, &fitness, experimental_sets()),
        &config,
        &ProgressReporter::new(),
    )
    .unwrap();

    let outcome = result.outcome().unwrap();
    assert!(outcome.matches);
    assert!(outcome.inversions.is_empty());
    assert_eq!(outcome.produced, vec!["mutant_1", "mutant_3", "mutant_2"]);
    assert_eq!(result.report.stage, PipelineStage::Validated);
}

#[test]
fn swapped_fitness_scores_report_a_single_inversion() {
    let config = PipelineConfig::default();
    let (reference, structure, template) = (reference(), structure(), template());
    let fitness = fitness(5.60, 5.70);

    let result = validate::run(
        validation_inputs(&reference, &structure, &template, &fitness, experimental_sets()),
        &config,
        &ProgressReporter::new(),
    )
    .unwrap();

    let outcome = result.outcome().unwrap();
    assert!(!outcome.matches);
    assert_eq!(outcome.inversions.len(), 1);
    assert_eq!(outcome.inversions[0].expected_first, "mutant_3");
    assert_eq!(outcome.inversions[0].expected_second, "mutant_2");
}

#[test]
fn sets_without_replicates_are_excluded_and_reported() {
    let config = PipelineConfig::default();
    let (reference, structure, template) = (reference(), structure(), template());
    let fitness = fitness(5.70, 5.60);
    let replicates = ReplicateSource::External(BTreeMap::from([
        ("mutant_1".to_string(), vec![0.8, 0.9, 0.85]),
        ("mutant_3".to_string(), Vec::new()),
        ("mutant_2".to_string(), vec![0.6, 0.7]),
    ]));
    let excluded_events = Mutex::new(Vec::new());
    let reporter = ProgressReporter::with_callback(Box::new(|event: Progress| {
        if let Progress::Excluded { mutation_set_id, .. } = event {
            excluded_events.lock().unwrap().push(mutation_set_id);
        }
    }));

    let result = validate::run(
        ValidationInputs {
            replicates,
            ..validation_inputs(&reference, &structure, &template, &fitness, experimental_sets())
        },
        &config,
        &reporter,
    )
    .unwrap();

    let ranked: Vec<&str> = result
        .report
        .ranked
        .iter()
        .map(|c| c.mutation_set_id.as_str())
        .collect();
    assert_eq!(ranked, vec!["mutant_1", "mutant_2"]);
    assert_eq!(result.report.excluded.len(), 1);
    assert_eq!(
        result.report.excluded[0].reason,
        EngineError::InsufficientData {
            mutation_set_id: "mutant_3".into()
        }
    );
    assert_eq!(excluded_events.lock().unwrap().as_slice(), ["mutant_3"]);

    let outcome = result.outcome().unwrap();
    assert!(outcome.matches);
    assert_eq!(outcome.missing_from_ranking, vec!["mutant_3"]);
}

#[test]
fn equal_means_prefer_lower_dispersion_then_identifier() {
    let config = PipelineConfig::default();
    let (reference, structure, template) = (reference(), structure(), template());
    let fitness = fitness(5.70, 5.60);
    let replicates = ReplicateSource::External(BTreeMap::from([
        ("mutant_1".to_string(), vec![0.5, 0.7]),
        ("mutant_3".to_string(), vec![0.6, 0.6]),
        ("mutant_2".to_string(), vec![0.6, 0.6]),
    ]));

    let result = validate::run(
        ValidationInputs {
            replicates,
            ..validation_inputs(&reference, &structure, &template, &fitness, experimental_sets())
        },
        &config,
        &ProgressReporter::new(),
    )
    .unwrap();

    let ranked: Vec<(&str, usize)> = result
        .report
        .ranked
        .iter()
        .map(|c| (c.mutation_set_id.as_str(), c.rank))
        .collect();
    assert_eq!(
        ranked,
        vec![("mutant_2", 1), ("mutant_3", 2), ("mutant_1", 3)]
    );
}

#[test]
fn identical_inputs_give_identical_records_in_any_input_order() {
    let config = PipelineConfig::default();
    let (reference, structure, template) = (reference(), structure(), template());
    let fitness = fitness(5.70, 5.60);
    let run = |sets: Vec<MutationSet>| {
        validate::run(
            validation_inputs(&reference, &structure, &template, &fitness, sets),
            &config,
            &ProgressReporter::new(),
        )
        .unwrap()
    };

    let first = run(experimental_sets());
    let second = run(experimental_sets());
    let mut reversed = experimental_sets();
    reversed.reverse();
    let third = run(reversed);

    assert_eq!(
        format!("{:?}", first.report.ranked),
        format!("{:?}", second.report.ranked)
    );
    assert_eq!(
        format!("{:?}", first.outcome()),
        format!("{:?}", second.outcome())
    );
    assert_eq!(first.report.ranked, third.report.ranked);
    assert_eq!(first.outcome(), third.outcome());
}

#[test]
fn every_ranked_set_has_one_fitness_and_one_aggregate_record() {
    let config = PipelineConfig::default();
    let (reference, structure, template) = (reference(), structure(), template());
    let fitness = fitness(5.70, 5.60);

    let result = validate::run(
        validation_inputs(&reference, &structure, &template, &fitness, experimental_sets()),
        &config,
        &ProgressReporter::new(),
    )
    .unwrap();

    for candidate in &result.report.ranked {
        let id = candidate.mutation_set_id.as_str();
        let records: Vec<_> = result.report.ledger.for_set(id).collect();
        assert_eq!(records.len(), 3);
        for kind in [ScoreKind::Fitness, ScoreKind::Replicate, ScoreKind::Ensemble] {
            assert_eq!(records.iter().filter(|r| r.kind == kind).count(), 1);
        }
        assert!(result.report.ledger.fitness(id).is_some());
        assert_eq!(result.report.ledger.ensemble(id), Some(candidate.mean_score));
    }
}

#[test]
fn design_scan_recovers_observed_substitutions() {
    let config = PipelineConfigBuilder::new().top_n(2).build().unwrap();
    let (reference, structure, template) = (reference(), structure(), template());
    let fitness = fitness(5.70, 5.60);
    let mut design = TabulatedDesignScorer::new();
    for position in 1..=SEQUENCE.len() as u32 {
        for residue in [AminoAcid::Glycine, AminoAcid::Histidine] {
            design.insert(position, residue, 0.1);
        }
    }
    design.insert(2, AminoAcid::Histidine, 0.97);
    design.insert(4, AminoAcid::Histidine, 0.93);
    let alphabet = [AminoAcid::Glycine, AminoAcid::Histidine];
    let active_site = BTreeSet::from([2, 3, 4]);

    let result = validate::run(
        ValidationInputs {
            design: Some(&design),
            scan: Some(ScanRequest {
                alphabet: &alphabet,
                recovery_positions: Some(&active_site),
            }),
            ..validation_inputs(&reference, &structure, &template, &fitness, experimental_sets())
        },
        &config,
        &ProgressReporter::new(),
    )
    .unwrap();

    let scan = result.scan.unwrap();
    let predicted: Vec<String> = scan
        .predictions
        .iter()
        .map(|p| p.substitution.to_string())
        .collect();
    assert_eq!(predicted, vec!["W2H", "V4H"]);
    let recovery = result.recovery.unwrap();
    assert_eq!(recovery.recovered, 1);
    assert!(recovery.predictions[0].observed);
}

#[test]
fn design_scan_without_design_scorer_is_a_configuration_error() {
    let config = PipelineConfig::default();
    let (reference, structure, template) = (reference(), structure(), template());
    let fitness = fitness(5.70, 5.60);

    let result = validate::run(
        ValidationInputs {
            scan: Some(ScanRequest {
                alphabet: &[AminoAcid::Glycine],
                recovery_positions: None,
            }),
            ..validation_inputs(&reference, &structure, &template, &fitness, experimental_sets())
        },
        &config,
        &ProgressReporter::new(),
    );

    assert!(matches!(result, Err(EngineError::Config(_))));
}

#[test]
fn prediction_is_reproducible_and_keeps_top_n() {
    let config = PipelineConfigBuilder::new()
        .objective(Objective::Composite(CompositeWeights {
            reference_size: 2,
            ..CompositeWeights::default()
        }))
        .top_n(3)
        .build()
        .unwrap();
    let (reference, structure, template) = (reference(), structure(), template());
    let fitness = PositionSpecificFitness::new(&reference, 1.0).with_unlisted_effect(-0.1);
    let design = |_: &GraftedComplex, s: &ResidueSubstitution| -> Result<f64, ScoringError> {
        Ok(if s.mutant == AminoAcid::Glycine { 0.9 } else { 0.2 })
    };
    let settings = EnumerationSettings {
        fixed: vec!["V4G".parse().unwrap()],
        active_positions: vec![2, 3, 4, 5, 6],
        alphabet: vec![AminoAcid::Glycine, AminoAcid::Serine, AminoAcid::Leucine],
        min_size: 2,
        max_size: 3,
        draws: 50,
        seed: 7,
    };
    let run = || {
        predict::run(
            PredictionInputs {
                reference: &reference,
                structure: &structure,
                template: &template,
                fitness: &fitness,
                design: Some(&design),
                enumeration: settings.clone(),
                replicates: ReplicateSource::Objective,
            },
            &config,
            &ProgressReporter::new(),
        )
        .unwrap()
    };

    let first = run();
    let second = run();

    assert_eq!(first, second);
    assert_eq!(first.top.len(), 3);
    assert_eq!(first.report.stage, PipelineStage::Ranked);
    let ranks: Vec<usize> = first.top.iter().map(|c| c.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
    for candidate in &first.top {
        let set = first.candidate(&candidate.mutation_set_id).unwrap();
        assert!(set.substitutions().iter().any(|s| s.to_string() == "V4G"));
    }
}
