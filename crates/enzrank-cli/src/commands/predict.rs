use super::output;
use crate::cli::PredictArgs;
use crate::config::{PredictConfig, build_predict_config};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use enzrank::core::scoring::DesignScorer;
use enzrank::engine::progress::ProgressReporter;
use enzrank::workflows::predict::{self, PredictionInputs};
use tracing::{info, warn};

pub async fn run(args: PredictArgs) -> Result<()> {
    info!("Building run configuration from {:?}", &args.run.config);
    let PredictConfig {
        inputs,
        enumeration,
    } = build_predict_config(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Enumerating up to {} candidate(s) with seed {}...",
        enumeration.draws, enumeration.seed
    );
    let workflow_inputs = PredictionInputs {
        reference: &inputs.reference,
        structure: &inputs.structure,
        template: &inputs.template,
        fitness: &inputs.fitness,
        design: inputs.design.as_ref().map(|d| d as &dyn DesignScorer),
        enumeration,
        replicates: inputs.replicates.clone(),
    };

    info!("Invoking the core prediction workflow...");
    let result = tokio::task::block_in_place(|| {
        predict::run(workflow_inputs, &inputs.pipeline, &reporter)
    })?;

    std::fs::create_dir_all(&inputs.output_dir)?;
    let dir = &inputs.output_dir;
    output::write_ranking(
        &dir.join(output::RANKING_FILE),
        &result.top,
        &result.candidates,
        &inputs.numbering,
    )?;
    output::write_exclusions(&dir.join(output::EXCLUSIONS_FILE), &result.report.excluded)?;

    if !result.report.excluded.is_empty() {
        warn!(
            "{} candidate(s) were excluded; see {}",
            result.report.excluded.len(),
            output::EXCLUSIONS_FILE
        );
    }

    if result.top.is_empty() {
        println!("Warning: no candidate could be ranked.");
    } else {
        println!(
            "Ranked {} candidate(s); top {}:",
            result.report.ranked.len(),
            result.top.len()
        );
        for candidate in &result.top {
            let notation = result
                .candidate(&candidate.mutation_set_id)
                .map(|set| set.notation_with_numbering(&inputs.numbering).join(" "))
                .unwrap_or_default();
            println!(
                "  {:>3}. {:<14} {:>8.4}  {}",
                candidate.rank, candidate.mutation_set_id, candidate.mean_score, notation
            );
        }
    }
    println!("Results written to {}", dir.display());

    Ok(())
}
