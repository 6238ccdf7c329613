use thiserror::Error;

#[derive(Error, Debug)]
pub enum PalcoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown concert field: {0} (expected artist, event, location, substitute or fee)")]
    UnknownField(String),

    #[error("Unknown expense category: {0}")]
    UnknownCategory(String),

    #[error("Unknown agency: {0}")]
    UnknownAgency(String),

    #[error("Unknown config key: {0}")]
    UnknownConfigKey(String),

    #[error("Invalid rate for {key}: {value} (must be between 0 and 100)")]
    InvalidRate { key: String, value: f64 },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PalcoError>;
