use thiserror::Error;

/// Unified error type for tagger operations
#[derive(Error, Debug)]
pub enum TaggerError {
    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Version parsing error: {0}")]
    Parse(String),

    #[error("Changelog error: {0}")]
    Traversal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in tagger
pub type Result<T> = std::result::Result<T, TaggerError>;

impl TaggerError {
    /// Create a repository error with context
    pub fn repository(msg: impl Into<String>) -> Self {
        TaggerError::Repository(msg.into())
    }

    /// Create a version parsing error with context
    pub fn parse(msg: impl Into<String>) -> Self {
        TaggerError::Parse(msg.into())
    }

    /// Create a changelog traversal error with context
    pub fn traversal(msg: impl Into<String>) -> Self {
        TaggerError::Traversal(msg.into())
    }

    /// Create a configuration error with context
    pub fn configuration(msg: impl Into<String>) -> Self {
        TaggerError::Configuration(msg.into())
    }

    /// Create an operator input error with context
    pub fn input(msg: impl Into<String>) -> Self {
        TaggerError::Input(msg.into())
    }
}
