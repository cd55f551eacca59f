// File: src/error.rs
use thiserror::Error;

pub type LmStateResult<T> = Result<T, LmStateError>;

#[derive(Debug, Error)]
pub enum LmStateError {
    /// A record broke its structural invariants (ordering, reserved symbols,
    /// positivity). Points at a bug upstream, not at bad input.
    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("failure reading {what}: expected {expected} bytes, got {got}")]
    Truncated {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("failure reading {what}: got implausible value {value} (wrong input file?)")]
    Implausible {
        what: &'static str,
        value: i64,
    },

    #[error("failure writing {what} to stream: {source}")]
    Write {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("stream error: {0}")]
    Io(#[from] std::io::Error),

    #[error("accumulator encoding: {0}")]
    Accumulator(#[from] bincode::Error),

    #[error("output requested from an empty builder")]
    EmptyBuilder,

    #[error("config: {0}")]
    Config(String),

    #[error("config parse: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl LmStateError {
    /// True for the failures that mean the byte stream itself cannot be trusted.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            LmStateError::Truncated { .. }
                | LmStateError::Implausible { .. }
                | LmStateError::Write { .. }
                | LmStateError::Io(_)
                | LmStateError::Accumulator(_)
        )
    }
}
