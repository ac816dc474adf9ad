use super::grafting::{GraftOptions, SubstituentCompletion};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_TIE_EPSILON: f64 = 1e-9;
pub const DEFAULT_PROXIMITY_RADIUS: f64 = 8.0;
pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Weights of the combined design and fitness objective.
///
/// `score = fitness * w_fitness + sum(design) * w_design - size_penalty * (n - reference_size)`,
/// raised to `floor` when one is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct CompositeWeights {
    pub fitness: f64,
    pub design: f64,
    pub size_penalty: f64,
    pub reference_size: usize,
    pub floor: Option<f64>,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            fitness: 1.0,
            design: 1.0,
            size_penalty: 0.2,
            reference_size: 6,
            floor: Some(0.0),
        }
    }
}

impl CompositeWeights {
    pub fn combine(&self, fitness: f64, design_scores: &[f64], set_size: usize) -> f64 {
        let mut sorted = design_scores.to_vec();
        sorted.sort_by(f64::total_cmp);
        let design: f64 = sorted.iter().sum();
        let excess = set_size as f64 - self.reference_size as f64;
        let score = fitness * self.fitness + design * self.design - self.size_penalty * excess;
        match self.floor {
            Some(floor) => score.max(floor),
            None => score,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let values = [
            ("composite.fitness", self.fitness),
            ("composite.design", self.design),
            ("composite.size_penalty", self.size_penalty),
        ];
        for (name, value) in values {
            if !value.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    name,
                    reason: format!("{} is not finite", value),
                });
            }
        }
        if let Some(floor) = self.floor {
            if !floor.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    name: "composite.floor",
                    reason: format!("{} is not finite", floor),
                });
            }
        }
        Ok(())
    }
}

/// The score a mutation set is ranked on.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Objective {
    #[default]
    Fitness,
    Composite(CompositeWeights),
}

impl Objective {
    pub fn requires_design(&self) -> bool {
        matches!(self, Objective::Composite(_))
    }

    pub fn evaluate(&self, fitness: f64, design_scores: &[f64], set_size: usize) -> f64 {
        match self {
            Objective::Fitness => fitness,
            Objective::Composite(weights) => weights.combine(fitness, design_scores, set_size),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub tie_epsilon: f64,
    pub proximity_radius: f64,
    pub graft: GraftOptions,
    pub objective: Objective,
    pub top_n: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tie_epsilon: DEFAULT_TIE_EPSILON,
            proximity_radius: DEFAULT_PROXIMITY_RADIUS,
            graft: GraftOptions::default(),
            objective: Objective::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

#[derive(Default)]
pub struct PipelineConfigBuilder {
    tie_epsilon: Option<f64>,
    proximity_radius: Option<f64>,
    rmsd_tolerance: Option<f64>,
    completions: Vec<SubstituentCompletion>,
    objective: Option<Objective>,
    top_n: Option<usize>,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tie_epsilon(mut self, epsilon: f64) -> Self {
        self.tie_epsilon = Some(epsilon);
        self
    }
    pub fn proximity_radius(mut self, radius: f64) -> Self {
        self.proximity_radius = Some(radius);
        self
    }
    pub fn rmsd_tolerance(mut self, tolerance: f64) -> Self {
        self.rmsd_tolerance = Some(tolerance);
        self
    }
    pub fn completion(mut self, completion: SubstituentCompletion) -> Self {
        self.completions.push(completion);
        self
    }
    pub fn objective(mut self, objective: Objective) -> Self {
        self.objective = Some(objective);
        self
    }
    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        let tie_epsilon = self.tie_epsilon.unwrap_or(DEFAULT_TIE_EPSILON);
        if !(tie_epsilon.is_finite() && tie_epsilon > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "tie_epsilon",
                reason: format!("must be a positive finite number, got {}", tie_epsilon),
            });
        }

        let proximity_radius = self.proximity_radius.unwrap_or(DEFAULT_PROXIMITY_RADIUS);
        if !(proximity_radius.is_finite() && proximity_radius > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "proximity_radius",
                reason: format!("must be a positive finite distance, got {}", proximity_radius),
            });
        }

        if let Some(tolerance) = self.rmsd_tolerance {
            if !(tolerance.is_finite() && tolerance >= 0.0) {
                return Err(ConfigError::InvalidParameter {
                    name: "rmsd_tolerance",
                    reason: format!("must be a non-negative finite distance, got {}", tolerance),
                });
            }
        }

        for completion in &self.completions {
            if !(completion.bond_length.is_finite() && completion.bond_length > 0.0) {
                return Err(ConfigError::InvalidParameter {
                    name: "completion.bond_length",
                    reason: format!(
                        "bond length of '{}' must be positive, got {}",
                        completion.name, completion.bond_length
                    ),
                });
            }
        }

        let objective = self.objective.unwrap_or_default();
        if let Objective::Composite(weights) = &objective {
            weights.validate()?;
        }

        let top_n = self.top_n.unwrap_or(DEFAULT_TOP_N);
        if top_n == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "top_n",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(PipelineConfig {
            tie_epsilon,
            proximity_radius,
            graft: GraftOptions {
                rmsd_tolerance: self.rmsd_tolerance,
                completions: self.completions,
            },
            objective,
            top_n,
        })
    }
}
