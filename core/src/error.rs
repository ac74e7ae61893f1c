use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Data quality error: no non-null values to impute '{field}' from")]
    DataQuality { field: &'static str },

    #[error("Empty input: no sale records to analyse")]
    EmptyInput,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
