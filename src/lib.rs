// src/lib.rs

//! Concurrent HTTP(S) domain checker: normalizes a list of domains, probes each one
//! over HTTPS with retries and an HTTP fallback, and reports timings, redirects,
//! TLS metadata and security headers per domain plus batch statistics.

pub mod cli;
pub mod core;
pub mod logging;
