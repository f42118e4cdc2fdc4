use thiserror::Error;

#[derive(Error, Debug)]
pub enum GestureError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Parsing Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Data Validation Error: {0}")]
    Validation(String),

    #[error("Model Error: {0}")]
    Model(String),

    #[error("Landmark Source Error: {0}")]
    Source(String),
}

pub type GgResult<T> = Result<T, GestureError>;
