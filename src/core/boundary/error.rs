use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("Malformed segment identifier: {identifier}")]
    MalformedIdentifier { identifier: String },
    #[error("Insufficient data: {len} segments, need at least twice the window size {window_size}")]
    InsufficientData { len: usize, window_size: usize },
    #[error("Invalid window size {0}, must be at least 2")]
    InvalidWindowSize(usize),
    #[error("Singular pooled covariance for window starting at {start_index}")]
    SingularCovariance { start_index: usize },
    #[error("Feature length mismatch for {identifier}: expected {expected}, found {found}")]
    DimensionMismatch {
        identifier: String,
        expected: usize,
        found: usize,
    },
    #[error("Empty window identifier list")]
    EmptyWindow,
    #[error("Invalid feature data: {0}")]
    InvalidFeatures(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Scoring run cancelled")]
    Cancelled,
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type BoundaryResult<T> = Result<T, BoundaryError>;
