// src/core/aggregator.rs

//! Pure reduction of a batch of `DomainResult`s into summary statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::models::{DomainResult, OutcomeKind, Scheme, SecurityHeader};

/// Distribution of `total_ms` over the results that reached the request phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingStats {
    pub mean_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    /// Number of results the statistics were computed over.
    pub count: usize,
}

impl TimingStats {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let sum: f64 = samples.iter().sum();
        Some(Self {
            mean_ms: sum / samples.len() as f64,
            min_ms: samples.iter().copied().fold(f64::INFINITY, f64::min),
            max_ms: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            count: samples.len(),
        })
    }
}

/// Final status codes grouped by class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusClasses {
    pub informational: usize,
    pub success: usize,
    pub redirection: usize,
    pub client_error: usize,
    pub server_error: usize,
}

impl StatusClasses {
    fn record(&mut self, status_code: u16) {
        match status_code {
            100..=199 => self.informational += 1,
            200..=299 => self.success += 1,
            300..=399 => self.redirection += 1,
            400..=499 => self.client_error += 1,
            _ => self.server_error += 1,
        }
    }
}

/// Summary statistics for one batch. Recomputable at any time from the results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total: usize,
    pub success_count: usize,
    pub error_count: usize,
    /// `success_count / total`, in `0.0..=1.0`; `0.0` for an empty batch.
    pub success_rate: f64,
    /// Results whose winning attempt followed at least one redirect.
    pub redirect_count: usize,
    /// Sum of all redirect hops followed.
    pub redirect_hops: usize,
    pub https_success: usize,
    pub http_fallback: usize,
    /// Successful results that carry TLS metadata.
    pub tls_count: usize,
    pub timing: Option<TimingStats>,
    pub counts_by_kind: BTreeMap<OutcomeKind, usize>,
    pub status_classes: StatusClasses,
    /// Successful results without `Strict-Transport-Security`.
    pub missing_hsts: usize,
    /// Successful results without `Content-Security-Policy`.
    pub missing_csp: usize,
}

impl ScanSummary {
    pub fn from_results(results: &[DomainResult]) -> Self {
        let total = results.len();
        let mut counts_by_kind = BTreeMap::new();
        let mut status_classes = StatusClasses::default();
        let mut samples = Vec::with_capacity(total);

        let mut success_count = 0;
        let mut redirect_count = 0;
        let mut redirect_hops = 0;
        let mut https_success = 0;
        let mut http_fallback = 0;
        let mut tls_count = 0;
        let mut missing_hsts = 0;
        let mut missing_csp = 0;

        for result in results {
            *counts_by_kind.entry(result.outcome_kind()).or_insert(0) += 1;
            if let Some(ms) = result.total_ms() {
                samples.push(ms);
            }
            if !result.is_success() {
                continue;
            }

            success_count += 1;
            if let Some(code) = result.status_code() {
                status_classes.record(code);
            }
            if result.redirect_count() > 0 {
                redirect_count += 1;
                redirect_hops += result.redirect_count();
            }
            match result.scheme {
                Scheme::Https => https_success += 1,
                Scheme::Http if result.https_failed() => http_fallback += 1,
                Scheme::Http => {}
            }
            if result.has_tls() {
                tls_count += 1;
            }
            if !result.has_header(SecurityHeader::StrictTransportSecurity) {
                missing_hsts += 1;
            }
            if !result.has_header(SecurityHeader::ContentSecurityPolicy) {
                missing_csp += 1;
            }
        }

        let success_rate = if total == 0 {
            0.0
        } else {
            success_count as f64 / total as f64
        };

        Self {
            total,
            success_count,
            error_count: total - success_count,
            success_rate,
            redirect_count,
            redirect_hops,
            https_success,
            http_fallback,
            tls_count,
            timing: TimingStats::from_samples(&samples),
            counts_by_kind,
            status_classes,
            missing_hsts,
            missing_csp,
        }
    }

    pub fn success_rate_percent(&self) -> f64 {
        self.success_rate * 100.0
    }

    pub fn count_of(&self, kind: OutcomeKind) -> usize {
        self.counts_by_kind.get(&kind).copied().unwrap_or(0)
    }
}
