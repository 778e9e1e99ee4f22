// src/core/export.rs

//! Flat, serializable views of a finished batch for reports and external sinks.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::aggregator::ScanSummary;
use crate::core::error::ExportError;
use crate::core::models::{DomainResult, Scheme, SecurityHeader};
use crate::core::scanner::ScanOutcome;

/// One domain as a mapping of named fields, the shape a results table or
/// history database stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub domain: String,
    pub status_code: Option<u16>,
    pub response_time_ms: Option<f64>,
    pub dns_time_ms: Option<f64>,
    pub connection_time_ms: Option<f64>,
    pub protocol_used: Scheme,
    pub server_info: Option<String>,
    pub has_ssl: bool,
    pub redirect_count: usize,
    pub error: Option<String>,
    pub final_url: Option<String>,
    pub security_headers: BTreeMap<SecurityHeader, String>,
    pub attempt_count: usize,
    pub timestamp: DateTime<Utc>,
}

impl From<&DomainResult> for ResultRecord {
    fn from(result: &DomainResult) -> Self {
        Self {
            domain: result.domain.to_string(),
            status_code: result.status_code(),
            response_time_ms: result.timings.total_ms,
            dns_time_ms: result.timings.dns_ms,
            connection_time_ms: result.timings.connect_ms,
            protocol_used: result.scheme,
            server_info: result.server().map(str::to_string),
            has_ssl: result.has_tls(),
            redirect_count: result.redirect_count(),
            error: result.error().map(|e| format!("{}: {e}", result.outcome_kind())),
            final_url: result.final_url().map(str::to_string),
            security_headers: result.headers.security.clone(),
            attempt_count: result.attempt_count,
            timestamp: result.timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_domains: usize,
    pub summary: ScanSummary,
}

/// The JSON report: metadata plus one record per domain, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub metadata: ReportMetadata,
    pub results: Vec<ResultRecord>,
}

impl ScanReport {
    pub fn from_outcome(outcome: &ScanOutcome) -> Self {
        Self {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                started_at: outcome.started_at,
                finished_at: outcome.finished_at,
                total_domains: outcome.domains.len(),
                summary: outcome.summary.clone(),
            },
            results: outcome
                .in_input_order()
                .into_iter()
                .map(ResultRecord::from)
                .collect(),
        }
    }
}

/// Writes the pretty-printed JSON report for `outcome` to `path`.
pub fn write_json_report(path: &Path, outcome: &ScanOutcome) -> Result<(), ExportError> {
    let report = ScanReport::from_outcome(outcome);
    let json = serde_json::to_string_pretty(&report)?;
    fs::write(path, json)?;
    info!(path = %path.display(), results = report.results.len(), "JSON report written.");
    Ok(())
}

/// Destination for finished batches, such as a history store. The engine never
/// calls a sink itself; scans behave the same with or without one.
pub trait ResultSink {
    fn persist(&self, outcome: &ScanOutcome) -> Result<(), ExportError>;
}

/// A sink that writes each batch to a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for JsonFileSink {
    fn persist(&self, outcome: &ScanOutcome) -> Result<(), ExportError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        write_json_report(&self.path, outcome)
    }
}
