mod builder;
mod defaults;
mod file;
mod models;

pub use builder::{build_predict_config, build_validate_config};
pub use models::{PredictConfig, ValidateConfig};
