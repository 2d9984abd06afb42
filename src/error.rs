use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeuristicGenError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Data Validation Error: {0}")]
    Validation(String),

    #[error("Malformed Program: {0}")]
    MalformedProgram(String),

    #[error("Invalid Operation: {0}")]
    InvalidOperation(String),

    #[error("Parse Error on line {line}: {message}")]
    Parse { line: usize, message: String },
}

pub type HgResult<T> = Result<T, HeuristicGenError>;
