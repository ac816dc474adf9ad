use super::output;
use crate::cli::ValidateArgs;
use crate::config::{ValidateConfig, build_validate_config};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use enzrank::core::scoring::DesignScorer;
use enzrank::engine::progress::ProgressReporter;
use enzrank::workflows::validate::{self, ScanRequest, ValidationInputs};
use tracing::{info, warn};

pub async fn run(args: ValidateArgs) -> Result<()> {
    info!("Building run configuration from {:?}", &args.run.config);
    let ValidateConfig {
        inputs,
        mutation_sets,
        scan,
    } = build_validate_config(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Validating {} mutation set(s) against their experimental labels...",
        mutation_sets.len()
    );
    let workflow_inputs = ValidationInputs {
        reference: &inputs.reference,
        structure: &inputs.structure,
        template: &inputs.template,
        mutation_sets: mutation_sets.clone(),
        fitness: &inputs.fitness,
        design: inputs.design.as_ref().map(|d| d as &dyn DesignScorer),
        replicates: inputs.replicates.clone(),
        scan: scan.as_ref().map(|s| ScanRequest {
            alphabet: &s.alphabet,
            recovery_positions: s.recovery_positions.as_ref(),
        }),
    };

    info!("Invoking the core validation workflow...");
    let result = tokio::task::block_in_place(|| {
        validate::run(workflow_inputs, &inputs.pipeline, &reporter)
    })?;

    std::fs::create_dir_all(&inputs.output_dir)?;
    let dir = &inputs.output_dir;
    output::write_ranking(
        &dir.join(output::RANKING_FILE),
        &result.report.ranked,
        &mutation_sets,
        &inputs.numbering,
    )?;
    output::write_exclusions(&dir.join(output::EXCLUSIONS_FILE), &result.report.excluded)?;
    if let Some(recovery) = &result.recovery {
        output::write_design_scan(
            &dir.join(output::DESIGN_SCAN_FILE),
            recovery,
            &inputs.numbering,
        )?;
    }

    for exclusion in &result.report.excluded {
        warn!(
            "Mutation set '{}' was excluded: {}",
            exclusion.mutation_set_id, exclusion.reason
        );
    }

    if let Some(outcome) = result.outcome() {
        output::write_validation(
            &dir.join(output::VALIDATION_FILE),
            outcome,
            result.recovery.as_ref(),
        )?;
        if outcome.matches {
            println!(
                "✓ Ranking matches the experimental order over {} labeled set(s).",
                outcome.produced.len()
            );
        } else {
            println!(
                "✗ Ranking disagrees with the experimental order ({} inversion(s)):",
                outcome.inversions.len()
            );
            for inversion in &outcome.inversions {
                println!(
                    "  expected {} before {}",
                    inversion.expected_first, inversion.expected_second
                );
            }
        }
        if let Some(tau) = outcome.kendall_tau {
            println!("  Kendall tau: {:.3}", tau);
        }
    }
    if let Some(recovery) = &result.recovery {
        println!(
            "  Design scan recovered {} of {} prediction(s).",
            recovery.recovered,
            recovery.predictions.len()
        );
    }
    println!("Results written to {}", dir.display());

    Ok(())
}
