use crate::cfg::CfgError;
use thiserror::Error;

/// Result alias for errors emitted by classlint internals.
pub type ClasslintResult<T> = Result<T, ClasslintError>;

/// Structured error type for classlint subsystems.
#[derive(Debug, Error)]
pub enum ClasslintError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corpus failure: {0}")]
    Corpus(String),

    #[error("CFG build failure in {class}.{method}: {source}")]
    Build {
        class: String,
        method: String,
        #[source]
        source: CfgError,
    },

    #[error("{0}")]
    Other(String),
}

impl ClasslintError {
    pub fn corpus(msg: impl Into<String>) -> Self {
        Self::Corpus(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    pub fn build(class: impl Into<String>, method: impl Into<String>, source: CfgError) -> Self {
        Self::Build {
            class: class.into(),
            method: method.into(),
            source,
        }
    }
}
