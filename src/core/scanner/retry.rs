// src/core/scanner/retry.rs

//! HTTPS-first retry and fallback policy: one domain in, one `DomainResult` out.

use tracing::{debug, info};

use super::probe::Prober;
use crate::core::config::ScanConfig;
use crate::core::models::{AttemptSummary, Domain, DomainResult, Scheme};

/// The ordered `(scheme, retry_index)` pairs a domain may go through:
/// every retry of https before the first http attempt.
pub fn attempt_plan(max_retries: u32) -> impl Iterator<Item = (Scheme, u32)> {
    Scheme::FALLBACK_ORDER
        .into_iter()
        .flat_map(move |scheme| (0..=max_retries).map(move |retry| (scheme, retry)))
}

/// Drives `prober` through the attempt plan until one attempt succeeds or the plan
/// is exhausted. Any HTTP status counts as success; only transport-level failures
/// lead to a retry or to the http fallback.
///
/// # Returns
/// The result built from the successful attempt, or from the last failed one.
pub async fn scan_domain<P: Prober>(prober: &P, domain: &Domain, config: &ScanConfig) -> DomainResult {
    let mut history: Vec<AttemptSummary> = Vec::with_capacity(config.max_attempts());
    let mut plan = attempt_plan(config.max_retries);

    let (first_scheme, _) = plan.next().unwrap_or((Scheme::Https, 0));
    let mut last = prober.probe(domain, first_scheme).await;
    history.push(AttemptSummary::from(&last));

    for (scheme, retry) in plan {
        if last.outcome.is_success() {
            break;
        }
        if scheme != last.scheme {
            info!(
                domain = %domain,
                from = %last.scheme,
                to = %scheme,
                reason = %last.outcome.kind(),
                "Falling back to the next scheme."
            );
        } else if retry > 0 {
            let delay = config.backoff.delay_for_retry(retry - 1);
            debug!(domain = %domain, scheme = %scheme, retry, ?delay, "Backing off before retry.");
            tokio::time::sleep(delay).await;
        }

        last = prober.probe(domain, scheme).await;
        history.push(AttemptSummary::from(&last));
    }

    info!(
        domain = %domain,
        scheme = %last.scheme,
        kind = %last.outcome.kind(),
        attempts = history.len(),
        "Domain scan finished."
    );
    DomainResult::assemble(domain.clone(), last, history)
}
