// src/core/scanner/mod.rs

// The scanning engine: one probe attempt (`probe`), the per-domain retry and
// fallback policy (`retry`), and the bounded batch scheduler defined below.
pub mod headers;
pub mod probe;
pub mod retry;
pub mod tls;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use self::probe::{HttpProber, Prober};
use self::retry::scan_domain;
use crate::core::aggregator::ScanSummary;
use crate::core::config::ScanConfig;
use crate::core::error::ConfigError;
use crate::core::models::{Domain, DomainResult, ProgressEvent};
use crate::core::normalizer::normalize_all;

/// Everything one batch produced.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Normalized domains in input order.
    pub domains: Vec<Domain>,
    /// One result per domain, in completion order.
    pub results: Vec<DomainResult>,
    pub summary: ScanSummary,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ScanOutcome {
    /// The results re-associated with the input order of their domains.
    pub fn in_input_order(&self) -> Vec<&DomainResult> {
        self.domains
            .iter()
            .filter_map(|domain| self.results.iter().find(|r| &r.domain == domain))
            .collect()
    }
}

/// Runs the retry/fallback policy over a batch with at most `config.concurrency`
/// domains in flight.
pub struct Scanner<P = HttpProber> {
    config: ScanConfig,
    prober: P,
}

impl Scanner<HttpProber> {
    /// Validates `config` and builds a scanner backed by the network prober.
    pub fn new(config: ScanConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let prober = HttpProber::new(&config)?;
        Ok(Self { config, prober })
    }
}

impl<P: Prober> Scanner<P> {
    /// Builds a scanner around any prober.
    pub fn with_prober(config: ScanConfig, prober: P) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, prober })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Normalizes raw input lines and scans every resulting domain.
    ///
    /// # Arguments
    /// * `raw` - Domain names or URLs, one per item.
    /// * `progress` - Receives one event per completed domain; a closed channel is ignored.
    ///
    /// # Returns
    /// `ConfigError::EmptyDomainList` when nothing usable is left after normalization.
    pub async fn scan<I, S>(
        &self,
        raw: I,
        progress: Option<UnboundedSender<ProgressEvent>>,
    ) -> Result<ScanOutcome, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = normalize_all(raw);
        self.scan_domains(domains, progress).await
    }

    /// Scans already-normalized domains.
    pub async fn scan_domains(
        &self,
        domains: Vec<Domain>,
        progress: Option<UnboundedSender<ProgressEvent>>,
    ) -> Result<ScanOutcome, ConfigError> {
        if domains.is_empty() {
            return Err(ConfigError::EmptyDomainList);
        }

        let total = domains.len();
        let started_at = Utc::now();
        info!(total, concurrency = self.config.concurrency, "Starting batch scan.");

        // Items are owned: the batch future must stay `Send` under `tokio::spawn`.
        let mut in_flight = stream::iter(domains.clone())
            .map(|domain| async move { scan_domain(&self.prober, &domain, &self.config).await })
            .buffer_unordered(self.config.concurrency);

        let mut results = Vec::with_capacity(total);
        while let Some(result) = in_flight.next().await {
            let event = ProgressEvent::from_result(&result, results.len() + 1, total);
            debug!(completed = event.completed, total, domain = %event.domain, "Domain completed.");
            if let Some(sender) = &progress {
                let _ = sender.send(event);
            }
            results.push(result);
        }

        let summary = ScanSummary::from_results(&results);
        info!(
            total = summary.total,
            success = summary.success_count,
            errors = summary.error_count,
            "Batch scan finished."
        );

        Ok(ScanOutcome {
            domains,
            results,
            summary,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
