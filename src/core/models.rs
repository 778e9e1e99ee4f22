// src/core/models.rs

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

// --- Core Data Models ---

/// Severity level of a finding derived from a scan result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// A single observation about a result, keyed into the knowledge base by `code`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisFinding {
    pub severity: Severity,
    pub code: String,
}

impl AnalysisFinding {
    pub fn new(severity: Severity, code: &str) -> Self {
        Self { severity, code: code.to_string() }
    }
}

/// A normalized hostname, optionally carrying a non-default port (`host[:port]`).
///
/// Values are only produced by the normalizer, so they are always lower-case,
/// non-empty and free of scheme, path, query, fragment and trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    pub(crate) fn from_normalized(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The host part as it appears in a URL (IPv6 literals keep their brackets).
    pub fn host(&self) -> &str {
        split_authority(&self.0).0
    }

    /// The host part suitable for DNS resolution and TLS server names.
    pub fn hostname(&self) -> &str {
        let host = self.host();
        host.strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host)
    }

    /// The explicit port, if the input carried a non-standard one.
    pub fn port(&self) -> Option<u16> {
        split_authority(&self.0).1.and_then(|p| p.parse().ok())
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Splits `host[:port]` into its parts, honouring bracketed IPv6 literals.
pub(crate) fn split_authority(authority: &str) -> (&str, Option<&str>) {
    if authority.starts_with('[') {
        return match authority.find(']') {
            Some(end) => {
                let (host, rest) = authority.split_at(end + 1);
                (host, rest.strip_prefix(':'))
            }
            None => (authority, None),
        };
    }
    match authority.rsplit_once(':') {
        // A bare IPv6 address without brackets has several colons and no port.
        Some((host, port)) if !host.contains(':') => (host, Some(port)),
        _ => (authority, None),
    }
}

/// Protocol scheme used for a probe attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Scheme {
    Https,
    Http,
}

impl Scheme {
    /// Order in which schemes are tried for every domain.
    pub const FALLBACK_ORDER: [Scheme; 2] = [Scheme::Https, Scheme::Http];

    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Https => 443,
            Scheme::Http => 80,
        }
    }
}

// --- Probe Attempt Models ---

/// Response security headers the probe captures, matched by enumerated name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    Display, AsRefStr, EnumIter,
)]
pub enum SecurityHeader {
    #[serde(rename = "Strict-Transport-Security")]
    #[strum(serialize = "Strict-Transport-Security")]
    StrictTransportSecurity,
    #[serde(rename = "Content-Security-Policy")]
    #[strum(serialize = "Content-Security-Policy")]
    ContentSecurityPolicy,
    #[serde(rename = "X-Frame-Options")]
    #[strum(serialize = "X-Frame-Options")]
    XFrameOptions,
    #[serde(rename = "X-Content-Type-Options")]
    #[strum(serialize = "X-Content-Type-Options")]
    XContentTypeOptions,
    #[serde(rename = "X-XSS-Protection")]
    #[strum(serialize = "X-XSS-Protection")]
    XXssProtection,
    #[serde(rename = "Referrer-Policy")]
    #[strum(serialize = "Referrer-Policy")]
    ReferrerPolicy,
    #[serde(rename = "Permissions-Policy")]
    #[strum(serialize = "Permissions-Policy")]
    PermissionsPolicy,
}

impl SecurityHeader {
    /// Lower-case name as it is looked up in a response header map.
    pub fn wire_name(self) -> &'static str {
        match self {
            SecurityHeader::StrictTransportSecurity => "strict-transport-security",
            SecurityHeader::ContentSecurityPolicy => "content-security-policy",
            SecurityHeader::XFrameOptions => "x-frame-options",
            SecurityHeader::XContentTypeOptions => "x-content-type-options",
            SecurityHeader::XXssProtection => "x-xss-protection",
            SecurityHeader::ReferrerPolicy => "referrer-policy",
            SecurityHeader::PermissionsPolicy => "permissions-policy",
        }
    }
}

/// Headers of interest captured from the final response of an attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapturedHeaders {
    pub security: BTreeMap<SecurityHeader, String>,
    /// Value of the `Server` header.
    pub server: Option<String>,
    /// Value of the `X-Powered-By` header.
    pub powered_by: Option<String>,
}

impl CapturedHeaders {
    pub fn has(&self, header: SecurityHeader) -> bool {
        self.security.contains_key(&header)
    }
}

/// Metadata about the response body, taken from headers only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyMeta {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

/// What a successful attempt observed at its final hop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub status_code: u16,
    pub final_url: String,
    pub body: BodyMeta,
}

/// The outcome of a single probe attempt. Every failure path maps to exactly one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Success(ResponseMeta),
    Timeout(String),
    ConnectionError(String),
    TlsError(String),
    DnsError(String),
    HttpError(String),
}

impl ProbeOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            ProbeOutcome::Success(_) => OutcomeKind::Success,
            ProbeOutcome::Timeout(_) => OutcomeKind::Timeout,
            ProbeOutcome::ConnectionError(_) => OutcomeKind::ConnectionError,
            ProbeOutcome::TlsError(_) => OutcomeKind::TlsError,
            ProbeOutcome::DnsError(_) => OutcomeKind::DnsError,
            ProbeOutcome::HttpError(_) => OutcomeKind::HttpError,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success(_))
    }

    /// The human-readable error detail, `None` on success.
    pub fn error_detail(&self) -> Option<&str> {
        match self {
            ProbeOutcome::Success(_) => None,
            ProbeOutcome::Timeout(d)
            | ProbeOutcome::ConnectionError(d)
            | ProbeOutcome::TlsError(d)
            | ProbeOutcome::DnsError(d)
            | ProbeOutcome::HttpError(d) => Some(d),
        }
    }

    pub fn response(&self) -> Option<&ResponseMeta> {
        match self {
            ProbeOutcome::Success(meta) => Some(meta),
            _ => None,
        }
    }
}

/// Outcome classification without payload, used for counting and progress events.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    Timeout,
    ConnectionError,
    TlsError,
    DnsError,
    HttpError,
}

impl OutcomeKind {
    pub fn is_success(self) -> bool {
        self == OutcomeKind::Success
    }
}

/// Per-phase timings in milliseconds. A phase that was never reached stays `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseTimings {
    pub dns_ms: Option<f64>,
    pub connect_ms: Option<f64>,
    pub total_ms: Option<f64>,
}

/// One redirect actually followed: the redirect status and the URL it pointed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectHop {
    pub status_code: u16,
    pub url: String,
}

/// Details extracted from the leaf certificate presented by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateInfo {
    pub subject_name: String,
    pub issuer_name: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub days_until_expiry: i64,
    pub is_valid: bool,
}

/// TLS session metadata negotiated during the handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TlsInfo {
    /// e.g. `TLSv1.3`
    pub protocol: String,
    pub cipher_suite: String,
    pub certificate: Option<CertificateInfo>,
}

/// A single DNS + connect + request cycle against one scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeAttempt {
    pub scheme: Scheme,
    pub outcome: ProbeOutcome,
    pub timings: PhaseTimings,
    pub redirects: Vec<RedirectHop>,
    pub tls: Option<TlsInfo>,
    pub headers: CapturedHeaders,
}

impl ProbeAttempt {
    /// An attempt that ended before any response was observed.
    pub fn failed(scheme: Scheme, outcome: ProbeOutcome, timings: PhaseTimings) -> Self {
        Self {
            scheme,
            outcome,
            timings,
            redirects: Vec::new(),
            tls: None,
            headers: CapturedHeaders::default(),
        }
    }
}

/// Condensed record of every attempt made for a domain, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptSummary {
    pub scheme: Scheme,
    pub kind: OutcomeKind,
    pub detail: Option<String>,
}

impl From<&ProbeAttempt> for AttemptSummary {
    fn from(attempt: &ProbeAttempt) -> Self {
        Self {
            scheme: attempt.scheme,
            kind: attempt.outcome.kind(),
            detail: attempt.outcome.error_detail().map(str::to_string),
        }
    }
}

// --- Domain Result ---

/// The final result for one domain after all retries and the fallback policy ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainResult {
    pub domain: Domain,
    /// Scheme of the winning attempt, or of the last attempt when every attempt failed.
    pub scheme: Scheme,
    pub outcome: ProbeOutcome,
    pub timings: PhaseTimings,
    pub redirects: Vec<RedirectHop>,
    pub tls: Option<TlsInfo>,
    pub headers: CapturedHeaders,
    pub attempt_count: usize,
    pub attempts: Vec<AttemptSummary>,
    pub timestamp: DateTime<Utc>,
}

impl DomainResult {
    /// Builds the result from the attempt that ended the scan and the full attempt history.
    pub fn assemble(domain: Domain, last: ProbeAttempt, attempts: Vec<AttemptSummary>) -> Self {
        Self {
            domain,
            scheme: last.scheme,
            outcome: last.outcome,
            timings: last.timings,
            redirects: last.redirects,
            tls: last.tls,
            headers: last.headers,
            attempt_count: attempts.len(),
            attempts,
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    pub fn outcome_kind(&self) -> OutcomeKind {
        self.outcome.kind()
    }

    pub fn status_code(&self) -> Option<u16> {
        self.outcome.response().map(|r| r.status_code)
    }

    pub fn final_url(&self) -> Option<&str> {
        self.outcome.response().map(|r| r.final_url.as_str())
    }

    pub fn error(&self) -> Option<&str> {
        self.outcome.error_detail()
    }

    pub fn total_ms(&self) -> Option<f64> {
        self.timings.total_ms
    }

    pub fn redirect_count(&self) -> usize {
        self.redirects.len()
    }

    pub fn has_tls(&self) -> bool {
        self.tls.is_some()
    }

    pub fn server(&self) -> Option<&str> {
        self.headers.server.as_deref()
    }

    pub fn has_header(&self, header: SecurityHeader) -> bool {
        self.headers.has(header)
    }

    /// Whether any https attempt failed before this result was produced.
    pub fn https_failed(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| a.scheme == Scheme::Https && !a.kind.is_success())
    }

    /// Successful over http after https had been given up on.
    pub fn is_http_fallback(&self) -> bool {
        self.is_success() && self.scheme == Scheme::Http && self.https_failed()
    }

    /// Enumerated security headers absent from a successful response.
    pub fn missing_security_headers(&self) -> Vec<SecurityHeader> {
        if !self.is_success() {
            return Vec::new();
        }
        use strum::IntoEnumIterator;
        SecurityHeader::iter().filter(|h| !self.has_header(*h)).collect()
    }
}

// --- Progress Events ---

/// Emitted once per completed domain while a batch is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub completed: usize,
    pub total: usize,
    pub domain: Domain,
    pub kind: OutcomeKind,
    pub scheme: Scheme,
    pub status_code: Option<u16>,
    pub total_ms: Option<f64>,
}

impl ProgressEvent {
    pub fn from_result(result: &DomainResult, completed: usize, total: usize) -> Self {
        Self {
            completed,
            total,
            domain: result.domain.clone(),
            kind: result.outcome_kind(),
            scheme: result.scheme,
            status_code: result.status_code(),
            total_ms: result.total_ms(),
        }
    }
}
