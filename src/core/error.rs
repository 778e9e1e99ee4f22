// src/core/error.rs

use thiserror::Error;

/// Errors that abort a whole batch before any domain is probed.
///
/// Per-domain failures never end up here: they are recorded as a
/// [`ProbeOutcome`](crate::core::models::ProbeOutcome) on the domain's result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("no domains to scan")]
    EmptyDomainList,

    #[error("concurrency must be at least 1 (got {0})")]
    InvalidConcurrency(usize),

    #[error("timeout must be a positive number of seconds (got {0})")]
    InvalidTimeout(String),

    #[error("backoff max delay must not be shorter than the base delay")]
    InvalidBackoff,

    #[error("user agent is not a valid header value: {0}")]
    InvalidUserAgent(String),

    #[error("failed to set up TLS client: {0}")]
    Tls(String),
}

/// Failures while writing a report or handing results to a sink.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
