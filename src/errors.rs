use thiserror::Error; // Import the `Error` derive macro from the `thiserror` crate

// Everything a comparison can fail with. Ordinary inequality is `NotEqual`;
// the other variants are hard failures raised before any report is assembled.
#[derive(Debug, Error)]
pub enum CompareError {
    // The values differ; `message` is the full, formatted report
    #[error("{message}")]
    NotEqual { message: String },

    // A matcher was evaluated against a value it cannot meaningfully judge
    #[error("{matcher} cannot be compared with {actual}: expected {expected}")]
    MatcherType {
        matcher: String,
        expected: String,
        actual: String,
    },

    // Recursion went deeper than the `max_depth` option allows
    #[error("comparison too deep: exceeded depth {depth} at {path}")]
    TooDeep { depth: usize, path: String },

    // Invalid combination of top-level operands
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompareError {
    /// The failure report when this error is an inequality.
    pub fn message(&self) -> Option<&str> {
        match self {
            CompareError::NotEqual { message } => Some(message),
            _ => None,
        }
    }
}

// Type alias for results that use `CompareError` as the error type
pub type Result<T> = std::result::Result<T, CompareError>;
