// src/core/normalizer.rs

//! Turns raw domain/URL lines into unique, normalized [`Domain`] values.

use std::collections::HashSet;
use std::net::Ipv6Addr;

use tracing::debug;

use crate::core::models::{Domain, Scheme, split_authority};

/// Normalizes one raw line into a bare `host[:port]`.
///
/// Strips surrounding whitespace, a leading `http://` or `https://` (any case),
/// userinfo, path, query, fragment and trailing slashes, lower-cases the result
/// and drops a port that is the default for the stripped scheme (80/443 for
/// both when no scheme was given).
///
/// # Returns
/// `None` when nothing usable is left, so the caller can skip the line.
pub fn normalize(raw: &str) -> Option<Domain> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (scheme, rest) = strip_scheme(trimmed);

    // Everything after the authority is irrelevant to the probe.
    let authority = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let authority = match authority.rsplit_once('@') {
        Some((_, host)) => host,
        None => authority,
    };
    let authority = authority.trim().to_ascii_lowercase();

    let (host, port) = split_authority(&authority);
    if host.is_empty() || host == "[]" {
        debug!(raw, "Skipping line without a host.");
        return None;
    }

    // IPv6 hosts are kept only as valid bracketed literals.
    let host = if host.starts_with('[') || host.contains(':') {
        let inner = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        match inner.parse::<Ipv6Addr>() {
            Ok(ip) => format!("[{ip}]"),
            Err(_) => {
                debug!(raw, host, "Skipping line with an invalid IPv6 host.");
                return None;
            }
        }
    } else {
        host.to_string()
    };

    let normalized = match port {
        None | Some("") => host,
        Some(port) => match port.parse::<u16>() {
            Ok(port) if is_default_port(scheme, port) => host,
            Ok(port) => format!("{host}:{port}"),
            Err(_) => {
                debug!(raw, port, "Skipping line with an invalid port.");
                return None;
            }
        },
    };

    Some(Domain::from_normalized(normalized))
}

/// Normalizes every line and removes duplicates, keeping first-seen order.
pub fn normalize_all<I, S>(lines: I) -> Vec<Domain>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut domains = Vec::new();
    for line in lines {
        if let Some(domain) = normalize(line.as_ref()) {
            if seen.insert(domain.clone()) {
                domains.push(domain);
            } else {
                debug!(domain = %domain, "Dropping duplicate domain.");
            }
        }
    }
    domains
}

/// Parses the content of a domain list file: one entry per line, `#` starts a comment line.
pub fn parse_domain_list(content: &str) -> Vec<Domain> {
    normalize_all(
        content
            .lines()
            .filter(|line| !line.trim_start().starts_with('#')),
    )
}

fn strip_scheme(input: &str) -> (Option<Scheme>, &str) {
    for scheme in Scheme::FALLBACK_ORDER {
        let prefix_len = scheme.as_ref().len() + "://".len();
        if let Some(prefix) = input.get(..prefix_len) {
            if prefix.eq_ignore_ascii_case(&format!("{scheme}://")) {
                return (Some(scheme), &input[prefix_len..]);
            }
        }
    }
    (None, input)
}

fn is_default_port(scheme: Option<Scheme>, port: u16) -> bool {
    match scheme {
        Some(scheme) => scheme.default_port() == port,
        None => Scheme::FALLBACK_ORDER.iter().any(|s| s.default_port() == port),
    }
}
