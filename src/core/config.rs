// src/core/config.rs

use std::time::Duration;

use hyper::header::HeaderValue;
use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;
use crate::core::models::Scheme;

pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_MAX_REDIRECTS: usize = 10;
pub const DEFAULT_USER_AGENT: &str =
    "VanguardHttpCheck/0.1 (+https://github.com/pankaspe/vanguard-rs)";

/// Exponent cap for the backoff multiplier.
const MAX_BACKOFF_EXPONENT: u32 = 20;

/// Exponential backoff between retries on the same scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl BackoffPolicy {
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self { base_delay, max_delay }
    }

    /// A policy that never waits, handy for tests and local targets.
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Delay before retry number `retry_index` (0 for the first retry):
    /// `base_delay * 2^retry_index`, capped at `max_delay`.
    pub fn delay_for_retry(&self, retry_index: u32) -> Duration {
        let factor = 1u32 << retry_index.min(MAX_BACKOFF_EXPONENT);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Everything the engine needs to run a batch. Passed in explicitly; nothing is global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Maximum number of domains scanned at the same time.
    pub concurrency: usize,
    /// Single deadline covering every phase of one attempt.
    pub timeout: Duration,
    /// Extra attempts per scheme beyond the first one.
    pub max_retries: u32,
    pub verify_tls: bool,
    pub user_agent: String,
    pub max_redirects: usize,
    pub backoff: BackoffPolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            verify_tls: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl ScanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the per-attempt deadline from fractional seconds, rejecting
    /// negative, zero and non-finite values.
    pub fn with_timeout_secs(self, secs: f64) -> Result<Self, ConfigError> {
        match Duration::try_from_secs_f64(secs) {
            Ok(timeout) if !timeout.is_zero() => Ok(self.with_timeout(timeout)),
            _ => Err(ConfigError::InvalidTimeout(secs.to_string())),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Upper bound on attempts for one domain: `(1 + max_retries)` per scheme.
    pub fn max_attempts(&self) -> usize {
        Scheme::FALLBACK_ORDER.len() * (1 + self.max_retries as usize)
    }

    /// Checks the configuration before any scanning starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(self.concurrency));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(format!("{:?}", self.timeout)));
        }
        if self.backoff.max_delay < self.backoff.base_delay {
            return Err(ConfigError::InvalidBackoff);
        }
        HeaderValue::from_str(&self.user_agent)
            .map_err(|_| ConfigError::InvalidUserAgent(self.user_agent.clone()))?;
        Ok(())
    }
}
