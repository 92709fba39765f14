use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("date string '{0}' doesn't match valid date formats")]
    MalformedTimestamp(String),

    #[error("path '{0}' doesn't contain a timestream date")]
    NoTimestampInPath(String),

    #[error("step contract violation: {0}")]
    StepContractViolation(String),

    #[error("failed to start worker pool: {source}")]
    WorkerPool {
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("report writer error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
