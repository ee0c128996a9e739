use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Missing column '{column}' in {table} input")]
    MissingColumn { table: &'static str, column: String },

    #[error("Invalid date '{value}' in column '{column}' (line {line})")]
    InvalidDate { column: String, value: String, line: u64 },

    #[error("Invalid number '{value}' in column '{column}' (line {line})")]
    InvalidNumber { column: String, value: String, line: u64 },

    #[error("{what} input is empty")]
    EmptyInput { what: &'static str },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
