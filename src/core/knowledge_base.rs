// src/core/knowledge_base.rs

//! Static, read-only catalogue of everything the detail view can say about a domain result:
//! what each finding means and how to fix it. `analyze_result` turns a `DomainResult`
//! into finding codes that index into this table.

use std::fmt;

use tracing::debug;

use crate::core::models::{AnalysisFinding, DomainResult, OutcomeKind, SecurityHeader, Severity};

/// Days before certificate expiry at which a warning is raised.
pub const EXPIRY_WARNING_DAYS: i64 = 30;

/// High-level grouping of findings in the user interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FindingCategory {
    /// Reachability of the domain: DNS, connect, timeouts, status codes, fallback.
    Transport,
    /// Findings related to the negotiated TLS session and certificate.
    Tls,
    /// Findings related to HTTP security headers.
    Headers,
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingCategory::Transport => write!(f, "Reachability"),
            FindingCategory::Tls => write!(f, "TLS Session"),
            FindingCategory::Headers => write!(f, "HTTP Security Headers"),
        }
    }
}

/// Human-readable information about one finding code.
pub struct FindingDetail {
    /// Machine-readable identifier (e.g. "HEADERS_HSTS_MISSING").
    pub code: &'static str,
    pub title: &'static str,
    pub category: FindingCategory,
    pub severity: Severity,
    /// What the finding means and why it matters.
    pub description: &'static str,
    /// Actionable steps to fix it.
    pub remediation: &'static str,
}

static FINDINGS: &[FindingDetail] = &[
    // --- Transport: Reachability ---
    FindingDetail {
        code: "PROBE_DNS_FAILED",
        title: "Domain Does Not Resolve",
        category: FindingCategory::Transport,
        severity: Severity::Critical,
        description: "No address could be resolved for the domain. Either the name does not exist, the DNS servers are unreachable, or the zone has no A/AAAA records.",
        remediation: "Check that the domain is registered and that its zone publishes A or AAAA records. Verify delegation with 'dig +trace <domain>'."
    },
    FindingDetail {
        code: "PROBE_CONNECTION_FAILED",
        title: "Connection Refused or Unreachable",
        category: FindingCategory::Transport,
        severity: Severity::Critical,
        description: "The domain resolved, but no TCP connection could be opened on port 443 or 80. The web server may be down, or a firewall is dropping the traffic.",
        remediation: "Make sure a web server is listening on the expected ports and that firewalls or security groups allow inbound connections."
    },
    FindingDetail {
        code: "PROBE_TIMEOUT",
        title: "Request Timed Out",
        category: FindingCategory::Transport,
        severity: Severity::Critical,
        description: "The server did not complete DNS, connection, TLS and response within the configured deadline on any attempt.",
        remediation: "Check server load and network latency. If the server is simply slow, rerun the scan with a larger --timeout."
    },
    FindingDetail {
        code: "PROBE_HTTP_ERROR",
        title: "Invalid HTTP Exchange",
        category: FindingCategory::Transport,
        severity: Severity::Critical,
        description: "A connection was made but the HTTP exchange failed: the response was malformed or a redirect pointed to an unusable location.",
        remediation: "Inspect the raw response with 'curl -v' and fix the server or proxy producing it. Redirect targets must be valid absolute or relative URLs."
    },
    FindingDetail {
        code: "TRANSPORT_HTTP_FALLBACK",
        title: "Served Only Over Plain HTTP",
        category: FindingCategory::Transport,
        severity: Severity::Warning,
        description: "HTTPS failed on every attempt and the domain only answered over unencrypted HTTP. Traffic to this site can be read and modified in transit.",
        remediation: "Install a valid certificate and serve the site over HTTPS. Free certificates are available from Let's Encrypt."
    },
    FindingDetail {
        code: "TRANSPORT_SERVER_ERROR",
        title: "Server Error Response",
        category: FindingCategory::Transport,
        severity: Severity::Warning,
        description: "The final response carried a 5xx status code. The site is reachable but the application behind it is failing.",
        remediation: "Check the application and reverse-proxy logs for the failing request."
    },
    FindingDetail {
        code: "TRANSPORT_CLIENT_ERROR",
        title: "Client Error Response",
        category: FindingCategory::Transport,
        severity: Severity::Info,
        description: "The final response carried a 4xx status code for the site root. The site may require authentication or block automated clients.",
        remediation: "Confirm the root path is meant to be public. If automated clients are blocked, allow-list the scanner or change its --user-agent."
    },
    FindingDetail {
        code: "TRANSPORT_REDIRECT_LIMIT",
        title: "Redirect Chain Not Resolved",
        category: FindingCategory::Transport,
        severity: Severity::Info,
        description: "The final response is still a redirect, either because the redirect limit was reached or because the redirect carried no Location header.",
        remediation: "Shorten the redirect chain so that the site root reaches content in a few hops, and make sure every redirect has a Location header."
    },

    // --- TLS: Secure Communication Layer ---
    FindingDetail {
        code: "TLS_HANDSHAKE_FAILED",
        title: "TLS Handshake Failed",
        category: FindingCategory::Tls,
        severity: Severity::Critical,
        description: "The scanner could not establish a secure TLS connection with the server. This can be caused by an invalid or missing certificate, unsupported protocol versions, or other server misconfigurations.",
        remediation: "Ensure a valid, trusted certificate is installed for the correct domain. Use an online tool like SSL Labs to diagnose TLS configuration issues."
    },
    FindingDetail {
        code: "TLS_EXPIRED",
        title: "Certificate Expired",
        category: FindingCategory::Tls,
        severity: Severity::Critical,
        description: "The certificate presented by the server is outside its validity period. Browsers show prominent security warnings or block access entirely.",
        remediation: "Renew the certificate immediately and automate renewals (e.g. with Certbot) to prevent this in the future."
    },
    FindingDetail {
        code: "TLS_EXPIRING_SOON",
        title: "Certificate Expiring Soon",
        category: FindingCategory::Tls,
        severity: Severity::Warning,
        description: "The certificate will expire in less than 30 days. This is an early warning to prevent service disruption.",
        remediation: "Renew the certificate before it expires. If renewals are automated, verify that the job is running."
    },

    // --- HTTP Headers: Hardening the Application Layer ---
    FindingDetail {
        code: "HEADERS_HSTS_MISSING",
        title: "HSTS Header Missing",
        category: FindingCategory::Headers,
        severity: Severity::Warning,
        description: "The HTTP Strict-Transport-Security (HSTS) header instructs browsers to only communicate with your site over HTTPS. It protects against protocol downgrade attacks and cookie hijacking.",
        remediation: "Add the 'Strict-Transport-Security' header to your web server responses. A strong value is 'max-age=31536000; includeSubDomains; preload'."
    },
    FindingDetail {
        code: "HEADERS_CSP_MISSING",
        title: "CSP Header Missing",
        category: FindingCategory::Headers,
        severity: Severity::Warning,
        description: "Content-Security-Policy (CSP) helps prevent Cross-Site Scripting (XSS) and data injection by defining which resources a browser is allowed to load.",
        remediation: "Implement a Content-Security-Policy header that defines trusted sources for scripts, styles and other assets. Start restrictive and open it up as needed."
    },
    FindingDetail {
        code: "HEADERS_X_FRAME_OPTIONS_MISSING",
        title: "X-Frame-Options Missing",
        category: FindingCategory::Headers,
        severity: Severity::Warning,
        description: "This header protects visitors against clickjacking, where an attacker loads your site in an invisible iframe to trick users into clicking on malicious content.",
        remediation: "Add the 'X-Frame-Options' header and set it to 'DENY' or 'SAMEORIGIN'."
    },
    FindingDetail {
        code: "HEADERS_X_CONTENT_TYPE_OPTIONS_MISSING",
        title: "X-Content-Type-Options Missing",
        category: FindingCategory::Headers,
        severity: Severity::Info,
        description: "This header prevents browsers from guessing the content type of a file (MIME sniffing), which mitigates attacks where a disguised file is executed as a script.",
        remediation: "Add the 'X-Content-Type-Options' header with the value 'nosniff'."
    },
    FindingDetail {
        code: "HEADERS_X_XSS_PROTECTION_MISSING",
        title: "X-XSS-Protection Missing",
        category: FindingCategory::Headers,
        severity: Severity::Info,
        description: "Legacy browsers use this header to control their built-in XSS filter. Modern browsers ignore it in favour of CSP.",
        remediation: "Send 'X-XSS-Protection: 0' to explicitly disable the legacy filter, and rely on a Content-Security-Policy instead."
    },
    FindingDetail {
        code: "HEADERS_REFERRER_POLICY_MISSING",
        title: "Referrer-Policy Missing",
        category: FindingCategory::Headers,
        severity: Severity::Info,
        description: "Without a Referrer-Policy, browsers may leak full URLs, including paths and query strings, to third-party sites in the Referer header.",
        remediation: "Add 'Referrer-Policy: strict-origin-when-cross-origin' or a stricter value."
    },
    FindingDetail {
        code: "HEADERS_PERMISSIONS_POLICY_MISSING",
        title: "Permissions-Policy Missing",
        category: FindingCategory::Headers,
        severity: Severity::Info,
        description: "Permissions-Policy restricts which browser features (camera, geolocation, microphone...) the page and embedded frames may use.",
        remediation: "Add a Permissions-Policy header that disables features the site does not need, e.g. 'camera=(), microphone=(), geolocation=()'."
    },
];

/// Retrieves the full detail for a given finding code.
///
/// # Arguments
///
/// * `code` - The machine-readable code for the finding.
///
/// # Returns
///
/// The matching `FindingDetail`, or `None` if the code is unknown.
pub fn get_finding_detail(code: &str) -> Option<&'static FindingDetail> {
    FINDINGS.iter().find(|f| f.code == code)
}

/// Finding code raised when the given security header is absent.
pub fn missing_header_code(header: SecurityHeader) -> &'static str {
    match header {
        SecurityHeader::StrictTransportSecurity => "HEADERS_HSTS_MISSING",
        SecurityHeader::ContentSecurityPolicy => "HEADERS_CSP_MISSING",
        SecurityHeader::XFrameOptions => "HEADERS_X_FRAME_OPTIONS_MISSING",
        SecurityHeader::XContentTypeOptions => "HEADERS_X_CONTENT_TYPE_OPTIONS_MISSING",
        SecurityHeader::XXssProtection => "HEADERS_X_XSS_PROTECTION_MISSING",
        SecurityHeader::ReferrerPolicy => "HEADERS_REFERRER_POLICY_MISSING",
        SecurityHeader::PermissionsPolicy => "HEADERS_PERMISSIONS_POLICY_MISSING",
    }
}

fn finding(code: &str) -> AnalysisFinding {
    let severity = get_finding_detail(code)
        .map(|detail| detail.severity)
        .unwrap_or(Severity::Info);
    AnalysisFinding::new(severity, code)
}

/// Derives the findings for one domain result, most severe first.
pub fn analyze_result(result: &DomainResult) -> Vec<AnalysisFinding> {
    debug!(domain = %result.domain, "Analyzing domain result.");
    let mut findings = Vec::new();

    let failure_code = match result.outcome_kind() {
        OutcomeKind::Success => None,
        OutcomeKind::DnsError => Some("PROBE_DNS_FAILED"),
        OutcomeKind::ConnectionError => Some("PROBE_CONNECTION_FAILED"),
        OutcomeKind::Timeout => Some("PROBE_TIMEOUT"),
        OutcomeKind::TlsError => Some("TLS_HANDSHAKE_FAILED"),
        OutcomeKind::HttpError => Some("PROBE_HTTP_ERROR"),
    };
    if let Some(code) = failure_code {
        findings.push(finding(code));
        return findings;
    }

    if result.is_http_fallback() {
        findings.push(finding("TRANSPORT_HTTP_FALLBACK"));
    }
    match result.status_code() {
        Some(500..=599) => findings.push(finding("TRANSPORT_SERVER_ERROR")),
        Some(400..=499) => findings.push(finding("TRANSPORT_CLIENT_ERROR")),
        Some(300..=399) => findings.push(finding("TRANSPORT_REDIRECT_LIMIT")),
        _ => {}
    }

    if let Some(cert) = result.tls.as_ref().and_then(|tls| tls.certificate.as_ref()) {
        if !cert.is_valid {
            debug!(not_after = %cert.not_after, "Certificate outside validity window.");
            findings.push(finding("TLS_EXPIRED"));
        } else if (0..=EXPIRY_WARNING_DAYS).contains(&cert.days_until_expiry) {
            debug!(days_left = cert.days_until_expiry, "Certificate expiring soon.");
            findings.push(finding("TLS_EXPIRING_SOON"));
        }
    }

    findings.extend(
        result
            .missing_security_headers()
            .into_iter()
            .map(|header| finding(missing_header_code(header))),
    );

    findings.sort_by_key(|f| match f.severity {
        Severity::Critical => 0,
        Severity::Warning => 1,
        Severity::Info => 2,
    });
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{
        AttemptSummary, BodyMeta, CertificateInfo, PhaseTimings, ProbeAttempt, ProbeOutcome,
        ResponseMeta, Scheme, TlsInfo,
    };
    use crate::core::normalizer::normalize;
    use chrono::{Duration, Utc};
    use strum::IntoEnumIterator;

    fn success(scheme: Scheme, status_code: u16) -> ProbeAttempt {
        ProbeAttempt::failed(
            scheme,
            ProbeOutcome::Success(ResponseMeta {
                status_code,
                final_url: format!("{scheme}://example.com/"),
                body: BodyMeta::default(),
            }),
            PhaseTimings::default(),
        )
    }

    fn result(last: ProbeAttempt, history: &[ProbeAttempt]) -> DomainResult {
        let domain = normalize("example.com").unwrap();
        let attempts = history.iter().map(AttemptSummary::from).collect();
        DomainResult::assemble(domain, last, attempts)
    }

    #[test]
    fn test_every_code_has_a_detail() {
        for header in SecurityHeader::iter() {
            assert!(get_finding_detail(missing_header_code(header)).is_some());
        }
        for code in [
            "PROBE_DNS_FAILED",
            "PROBE_CONNECTION_FAILED",
            "PROBE_TIMEOUT",
            "PROBE_HTTP_ERROR",
            "TLS_HANDSHAKE_FAILED",
            "TRANSPORT_HTTP_FALLBACK",
            "TRANSPORT_SERVER_ERROR",
            "TRANSPORT_CLIENT_ERROR",
            "TRANSPORT_REDIRECT_LIMIT",
            "TLS_EXPIRED",
            "TLS_EXPIRING_SOON",
        ] {
            assert!(get_finding_detail(code).is_some(), "missing detail for {code}");
        }
        assert!(get_finding_detail("NOPE").is_none());
    }

    #[test]
    fn test_failed_result_has_single_critical_finding() {
        let failed = ProbeAttempt::failed(
            Scheme::Http,
            ProbeOutcome::DnsError("no record found".into()),
            PhaseTimings::default(),
        );
        let findings = analyze_result(&result(failed.clone(), &[failed]));
        assert_eq!(findings, vec![AnalysisFinding::new(Severity::Critical, "PROBE_DNS_FAILED")]);
    }

    #[test]
    fn test_http_fallback_and_missing_headers() {
        let https = ProbeAttempt::failed(
            Scheme::Https,
            ProbeOutcome::TlsError("invalid peer certificate".into()),
            PhaseTimings::default(),
        );
        let http = success(Scheme::Http, 503);
        let findings = analyze_result(&result(http.clone(), &[https, http]));

        let codes: Vec<&str> = findings.iter().map(|f| f.code.as_str()).collect();
        assert!(codes.contains(&"TRANSPORT_HTTP_FALLBACK"));
        assert!(codes.contains(&"TRANSPORT_SERVER_ERROR"));
        assert!(codes.contains(&"HEADERS_HSTS_MISSING"));
        assert_eq!(codes.len(), 2 + SecurityHeader::iter().count());
        assert!(findings.windows(2).all(|w| {
            let rank = |s: Severity| match s {
                Severity::Critical => 0,
                Severity::Warning => 1,
                Severity::Info => 2,
            };
            rank(w[0].severity) <= rank(w[1].severity)
        }));
    }

    #[test]
    fn test_certificate_expiry_findings() {
        let now = Utc::now();
        let mut attempt = success(Scheme::Https, 200);
        attempt.tls = Some(TlsInfo {
            protocol: "TLSv1.3".into(),
            cipher_suite: "TLS13_AES_128_GCM_SHA256".into(),
            certificate: Some(CertificateInfo {
                subject_name: "CN=example.com".into(),
                issuer_name: "CN=Test CA".into(),
                not_before: now - Duration::days(60),
                not_after: now + Duration::days(10),
                days_until_expiry: 10,
                is_valid: true,
            }),
        });
        let findings = analyze_result(&result(attempt.clone(), &[attempt]));
        assert!(findings.iter().any(|f| f.code == "TLS_EXPIRING_SOON"));
        assert!(findings.iter().all(|f| f.code != "TLS_EXPIRED"));
    }
}
