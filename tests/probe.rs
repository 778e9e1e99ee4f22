// tests/probe.rs

mod common;

use std::time::Duration;

use common::{closed_port, local_domain, plaintext_greeter, response, serve, serve_counted, serve_tls, silent_server};
use vanguard_httpcheck::core::config::ScanConfig;
use vanguard_httpcheck::core::models::{OutcomeKind, ProbeOutcome, Scheme, SecurityHeader};
use vanguard_httpcheck::core::scanner::probe::{HttpProber, Prober};

fn prober(config: ScanConfig) -> HttpProber {
    HttpProber::new(&config).expect("prober builds")
}

#[tokio::test]
async fn test_success_captures_headers() {
    let port = serve(|_| {
        response(
            "200 OK",
            &[
                ("Server", "test-server"),
                ("Content-Type", "text/html"),
                ("Strict-Transport-Security", "max-age=63072000"),
                ("X-Frame-Options", "DENY"),
            ],
        )
    })
    .await;

    let attempt = prober(ScanConfig::default())
        .probe(&local_domain(port), Scheme::Http)
        .await;

    let ProbeOutcome::Success(meta) = &attempt.outcome else {
        panic!("expected success, got {:?}", attempt.outcome);
    };
    assert_eq!(meta.status_code, 200);
    assert_eq!(meta.final_url, format!("http://127.0.0.1:{port}/"));
    assert_eq!(meta.body.content_type.as_deref(), Some("text/html"));
    assert_eq!(attempt.headers.server.as_deref(), Some("test-server"));
    assert!(attempt.headers.has(SecurityHeader::StrictTransportSecurity));
    assert!(attempt.headers.has(SecurityHeader::XFrameOptions));
    assert!(!attempt.headers.has(SecurityHeader::ContentSecurityPolicy));
    assert!(attempt.tls.is_none());
    assert!(attempt.redirects.is_empty());
    assert!(attempt.timings.dns_ms.is_some());
    assert!(attempt.timings.connect_ms.is_some());
    assert!(attempt.timings.total_ms.is_some());
}

#[tokio::test]
async fn test_error_status_is_still_success() {
    let port = serve(|_| response("503 Service Unavailable", &[])).await;

    let attempt = prober(ScanConfig::default())
        .probe(&local_domain(port), Scheme::Http)
        .await;

    assert_eq!(attempt.outcome.kind(), OutcomeKind::Success);
    assert_eq!(attempt.outcome.response().map(|r| r.status_code), Some(503));
}

#[tokio::test]
async fn test_redirects_stop_at_limit() {
    let port = serve(|path| {
        let next = match path {
            "/" => Some(1),
            p => p
                .strip_prefix("/hop/")
                .and_then(|n| n.parse::<u32>().ok())
                .filter(|n| *n < 10)
                .map(|n| n + 1),
        };
        match next {
            Some(n) => {
                let location = format!("/hop/{n}");
                response("302 Found", &[("Location", location.as_str())])
            }
            None => response("200 OK", &[]),
        }
    })
    .await;

    let config = ScanConfig::default().with_max_redirects(5);
    let attempt = prober(config).probe(&local_domain(port), Scheme::Http).await;

    assert_eq!(attempt.redirects.len(), 5);
    assert!(attempt.redirects.iter().all(|hop| hop.status_code == 302));
    assert_eq!(attempt.redirects[0].url, format!("http://127.0.0.1:{port}/hop/1"));
    let meta = attempt.outcome.response().expect("final response");
    assert_eq!(meta.status_code, 302);
    assert_eq!(meta.final_url, format!("http://127.0.0.1:{port}/hop/5"));
}

#[tokio::test]
async fn test_redirect_chain_followed_to_the_end() {
    let port = serve(|path| match path {
        "/" => response("301 Moved Permanently", &[("Location", "/landing")]),
        _ => response("200 OK", &[]),
    })
    .await;

    let attempt = prober(ScanConfig::default())
        .probe(&local_domain(port), Scheme::Http)
        .await;

    assert_eq!(attempt.redirects.len(), 1);
    assert_eq!(attempt.redirects[0].status_code, 301);
    let meta = attempt.outcome.response().expect("final response");
    assert_eq!(meta.status_code, 200);
    assert_eq!(meta.final_url, format!("http://127.0.0.1:{port}/landing"));
}

#[tokio::test]
async fn test_redirect_without_location_is_final() {
    let port = serve(|_| response("302 Found", &[])).await;

    let attempt = prober(ScanConfig::default())
        .probe(&local_domain(port), Scheme::Http)
        .await;

    assert!(attempt.redirects.is_empty());
    assert_eq!(attempt.outcome.response().map(|r| r.status_code), Some(302));
}

#[tokio::test]
async fn test_refused_connection() {
    let port = closed_port().await;

    let attempt = prober(ScanConfig::default())
        .probe(&local_domain(port), Scheme::Http)
        .await;

    assert_eq!(attempt.outcome.kind(), OutcomeKind::ConnectionError);
    assert!(attempt.outcome.error_detail().is_some());
    assert!(attempt.timings.dns_ms.is_some());
    assert!(attempt.timings.total_ms.is_none());
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let port = silent_server().await;
    let config = ScanConfig::default().with_timeout(Duration::from_millis(300));

    let started = std::time::Instant::now();
    let attempt = prober(config).probe(&local_domain(port), Scheme::Http).await;

    assert_eq!(attempt.outcome.kind(), OutcomeKind::Timeout);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_https_against_plaintext_is_tls_error() {
    let port = plaintext_greeter().await;

    let attempt = prober(ScanConfig::default())
        .probe(&local_domain(port), Scheme::Https)
        .await;

    assert_eq!(attempt.outcome.kind(), OutcomeKind::TlsError);
    assert!(attempt.tls.is_none());
}

#[tokio::test]
async fn test_tls_verification_off_still_fails_without_tls() {
    let port = serve(|_| response("200 OK", &[])).await;
    let config = ScanConfig::default().with_verify_tls(false);

    let attempt = prober(config).probe(&local_domain(port), Scheme::Https).await;

    assert_eq!(attempt.outcome.kind(), OutcomeKind::TlsError);
}

#[tokio::test]
async fn test_plain_attempt_uses_one_connection() {
    let server = serve_counted(|_| response("200 OK", &[])).await;

    let attempt = prober(ScanConfig::default())
        .probe(&local_domain(server.port), Scheme::Http)
        .await;

    assert_eq!(attempt.outcome.kind(), OutcomeKind::Success);
    assert_eq!(server.connections(), 1);
}

#[tokio::test]
async fn test_each_redirect_hop_opens_one_connection() {
    let server = serve_counted(|path| match path {
        "/" => response("302 Found", &[("Location", "/a")]),
        "/a" => response("302 Found", &[("Location", "/b")]),
        _ => response("200 OK", &[]),
    })
    .await;

    let attempt = prober(ScanConfig::default())
        .probe(&local_domain(server.port), Scheme::Http)
        .await;

    assert_eq!(attempt.redirects.len(), 2);
    assert_eq!(server.connections(), 3);
}

#[tokio::test]
async fn test_tls_metadata_from_self_signed_server() {
    let server = serve_tls(|_| response("200 OK", &[("Server", "tls-loopback")])).await;
    let config = ScanConfig::default().with_verify_tls(false);

    let attempt = prober(config).probe(&local_domain(server.port), Scheme::Https).await;

    let meta = attempt.outcome.response().expect("https response");
    assert_eq!(meta.status_code, 200);
    assert_eq!(meta.final_url, format!("https://127.0.0.1:{}/", server.port));
    assert_eq!(attempt.headers.server.as_deref(), Some("tls-loopback"));

    let tls = attempt.tls.as_ref().expect("TLS metadata");
    assert!(tls.protocol == "TLSv1.3" || tls.protocol == "TLSv1.2", "protocol {}", tls.protocol);
    assert!(!tls.cipher_suite.is_empty());
    let certificate = tls.certificate.as_ref().expect("leaf certificate");
    assert!(certificate.issuer_name.contains("rcgen"), "issuer {}", certificate.issuer_name);
    assert!(certificate.days_until_expiry > 0);
    assert!(certificate.is_valid);

    // Handshake and request share the connection.
    assert_eq!(server.connections(), 1);
}

#[tokio::test]
async fn test_self_signed_certificate_rejected_when_verifying() {
    let server = serve_tls(|_| response("200 OK", &[])).await;

    let attempt = prober(ScanConfig::default())
        .probe(&local_domain(server.port), Scheme::Https)
        .await;

    assert_eq!(attempt.outcome.kind(), OutcomeKind::TlsError);
    assert!(attempt.tls.is_none());
}

#[tokio::test]
async fn test_redirect_to_https_reports_final_tls() {
    let secure = serve_tls(|_| response("200 OK", &[])).await;
    let target = format!("https://127.0.0.1:{}/secure", secure.port);
    let port = serve(move |_| response("301 Moved Permanently", &[("Location", target.as_str())])).await;
    let config = ScanConfig::default().with_verify_tls(false);

    let attempt = prober(config).probe(&local_domain(port), Scheme::Http).await;

    let meta = attempt.outcome.response().expect("final response");
    assert_eq!(meta.status_code, 200);
    assert_eq!(meta.final_url, format!("https://127.0.0.1:{}/secure", secure.port));
    assert!(attempt.tls.as_ref().is_some_and(|tls| tls.certificate.is_some()));
    assert_eq!(secure.connections(), 1);
}

#[tokio::test]
async fn test_redirect_to_http_drops_tls() {
    let plain = serve(|_| response("200 OK", &[])).await;
    let target = format!("http://127.0.0.1:{plain}/");
    let secure = serve_tls(move |_| response("302 Found", &[("Location", target.as_str())])).await;
    let config = ScanConfig::default().with_verify_tls(false);

    let attempt = prober(config).probe(&local_domain(secure.port), Scheme::Https).await;

    let meta = attempt.outcome.response().expect("final response");
    assert_eq!(meta.final_url, format!("http://127.0.0.1:{plain}/"));
    assert_eq!(attempt.redirects.len(), 1);
    assert!(attempt.tls.is_none());
}

#[tokio::test]
async fn test_huge_timeout_does_not_overflow_deadline() {
    let port = closed_port().await;
    let config = ScanConfig::new().with_timeout_secs(1e19).expect("finite timeout");
    assert!(config.validate().is_ok());

    let attempt = prober(config).probe(&local_domain(port), Scheme::Http).await;

    assert_eq!(attempt.outcome.kind(), OutcomeKind::ConnectionError);
}
