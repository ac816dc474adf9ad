use enzrank::engine::config::{DEFAULT_PROXIMITY_RADIUS, DEFAULT_TIE_EPSILON, DEFAULT_TOP_N};

pub struct DefaultsConfig {
    pub tie_epsilon: f64,
    pub proximity_radius: f64,
    pub top_n: usize,
    pub alphabet: String,
    pub min_size: usize,
    pub max_size: usize,
    pub draws: usize,
    pub seed: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            tie_epsilon: DEFAULT_TIE_EPSILON,
            proximity_radius: DEFAULT_PROXIMITY_RADIUS,
            top_n: DEFAULT_TOP_N,
            alphabet: "ADEFGHIKLMNQRSTVWY".to_string(),
            min_size: 5,
            max_size: 8,
            draws: 5000,
            seed: 0,
        }
    }
}
