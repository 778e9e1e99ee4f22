// src/core/mod.rs

// The scanning engine. Nothing in here touches the terminal or initializes
// logging; the binary-side modules (`app`, `ui`, `cli`, `logging`) consume it.

/// Data structures shared by every part of the engine: domains, attempts,
/// outcomes, timings, TLS metadata and per-domain results.
pub mod models;

/// Explicit scan configuration and the retry backoff policy.
pub mod config;

pub mod error;

/// Cleans raw domain/URL lines into unique hostnames.
pub mod normalizer;

/// Probe executor, retry/fallback controller and the bounded batch scheduler.
pub mod scanner;

pub mod aggregator;

/// Report and persistence shapes for a finished batch.
pub mod export;

/// Static catalogue of findings with explanations and remediation steps.
pub mod knowledge_base;
