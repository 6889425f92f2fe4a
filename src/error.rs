//! Typed errors for the two fallible boundaries outside the VM hot path.
//!
//! The VM and scheduler core are infallible by construction (see §7 of the
//! design notes): a loop-stack overflow sets `stop`, an invariant violation
//! is a programmer error and panics. Only configuration parsing and the
//! reporting/visualization sinks can fail at runtime, and they do so through
//! these `thiserror`-derived enums, matching this crate's existing
//! `StreamError`/`QuotientError`/`ProveError` convention.

/// Errors raised while parsing CLI configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("flag {flag} expects an integer, got {value:?}")]
    NotAnInteger { flag: &'static str, value: String },

    #[error("flag {flag} must be positive, got {value}")]
    NotPositive { flag: &'static str, value: u64 },

    #[error("pond_depth must be a multiple of 16 (got {0})")]
    DepthNotMultipleOf16(u64),

    #[error("unknown flag {0:?}")]
    UnknownFlag(String),

    #[error("flag {0:?} requires a value")]
    MissingValue(&'static str),
}

/// Errors raised by the CSV and PPM reporting sinks.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write CSV report: {0}")]
    Csv(#[source] std::io::Error),

    #[error("failed to write visualization frame: {0}")]
    Viz(#[source] std::io::Error),
}

impl From<std::io::Error> for ReportError {
    fn from(e: std::io::Error) -> Self {
        ReportError::Csv(e)
    }
}
