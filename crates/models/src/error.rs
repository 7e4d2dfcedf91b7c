use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Invalid odds format: {0}")]
    InvalidOdds(String),

    #[error("Factor weights must sum to 1.0, got {sum:.4}")]
    InvalidWeights { sum: f64 },

    #[error("Team not found: {query}")]
    TeamNotFound { query: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PredictError>;
