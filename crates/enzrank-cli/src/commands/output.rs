use crate::error::{CliError, Result};
use enzrank::core::models::mutation::MutationSet;
use enzrank::core::models::sequence::ResidueNumbering;
use enzrank::engine::ensemble::RankedCandidate;
use enzrank::engine::error::Exclusion;
use enzrank::engine::validation::{RecoveryReport, ValidationOutcome};
use serde::Serialize;
use std::path::Path;
use tracing::info;

pub const RANKING_FILE: &str = "ranking.csv";
pub const EXCLUSIONS_FILE: &str = "exclusions.csv";
pub const DESIGN_SCAN_FILE: &str = "design_scan.csv";
pub const VALIDATION_FILE: &str = "validation.toml";

#[derive(Serialize)]
struct RankingRow<'a> {
    rank: usize,
    mutation_set_id: &'a str,
    mean_score: f64,
    dispersion: f64,
    substitutions: String,
}

#[derive(Serialize)]
struct ExclusionRow<'a> {
    mutation_set_id: &'a str,
    reason: String,
}

#[derive(Serialize)]
struct DesignScanRow {
    residue_number: String,
    wild_type: char,
    mutant: char,
    score: f64,
    observed: bool,
}

#[derive(Serialize)]
struct ValidationReport<'a> {
    outcome: &'a ValidationOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    recovery: Option<RecoverySummary>,
}

#[derive(Serialize)]
struct RecoverySummary {
    predictions: usize,
    recovered: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    precision: Option<f64>,
}

/// Substitutions are written with author residue numbers.
pub fn write_ranking(
    path: &Path,
    ranked: &[RankedCandidate],
    sets: &[MutationSet],
    numbering: &ResidueNumbering,
) -> Result<()> {
    write_csv(
        path,
        ranked.iter().map(|candidate| RankingRow {
            rank: candidate.rank,
            mutation_set_id: &candidate.mutation_set_id,
            mean_score: candidate.mean_score,
            dispersion: candidate.dispersion,
            substitutions: sets
                .iter()
                .find(|set| set.id() == candidate.mutation_set_id)
                .map(|set| set.notation_with_numbering(numbering).join(";"))
                .unwrap_or_default(),
        }),
    )
}

pub fn write_exclusions(path: &Path, excluded: &[Exclusion]) -> Result<()> {
    write_csv(
        path,
        excluded.iter().map(|exclusion| ExclusionRow {
            mutation_set_id: &exclusion.mutation_set_id,
            reason: exclusion.reason.to_string(),
        }),
    )
}

pub fn write_design_scan(
    path: &Path,
    recovery: &RecoveryReport,
    numbering: &ResidueNumbering,
) -> Result<()> {
    write_csv(
        path,
        recovery.predictions.iter().map(|p| DesignScanRow {
            residue_number: numbering
                .to_author_number(p.substitution.position)
                .map_or_else(|| p.substitution.position.to_string(), |n| n.to_string()),
            wild_type: p.substitution.wild_type.to_one_letter(),
            mutant: p.substitution.mutant.to_one_letter(),
            score: p.score,
            observed: p.observed,
        }),
    )
}

pub fn write_validation(
    path: &Path,
    outcome: &ValidationOutcome,
    recovery: Option<&RecoveryReport>,
) -> Result<()> {
    let report = ValidationReport {
        outcome,
        recovery: recovery.map(|r| RecoverySummary {
            predictions: r.predictions.len(),
            recovered: r.recovered,
            precision: r.precision(),
        }),
    };
    let content = toml::to_string_pretty(&report).map_err(|e| CliError::FileWriting {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    std::fs::write(path, content)?;
    info!("Validation outcome written to {:?}", path);
    Ok(())
}

fn write_csv<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let to_error = |e: csv::Error| CliError::FileWriting {
        path: path.to_path_buf(),
        source: e.into(),
    };
    let mut writer = csv::Writer::from_path(path).map_err(to_error)?;
    let mut count = 0usize;
    for row in rows {
        writer.serialize(row).map_err(to_error)?;
        count += 1;
    }
    writer.flush()?;
    info!(rows = count, "Wrote {:?}", path);
    Ok(())
}
