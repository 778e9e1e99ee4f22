// src/core/scanner/probe.rs

use std::error::Error as StdError;
use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::pin::pin;
use std::time::Duration;

use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper::header::{ACCEPT, HOST, HeaderValue, LOCATION, USER_AGENT};
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout_at};
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::{debug, info, warn};
use url::{Position, Url};

use super::headers::{extract_body_meta, extract_headers};
use super::tls;
use crate::core::config::ScanConfig;
use crate::core::error::ConfigError;
use crate::core::models::{
    CapturedHeaders, Domain, PhaseTimings, ProbeAttempt, ProbeOutcome, RedirectHop, ResponseMeta,
    Scheme, TlsInfo,
};

/// Deadline used when `started + timeout` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// One attempt against one scheme. Implementations never fail: every error becomes
/// a [`ProbeOutcome`] variant inside the returned attempt.
pub trait Prober: Send + Sync {
    fn probe(&self, domain: &Domain, scheme: Scheme) -> impl Future<Output = ProbeAttempt> + Send;
}

/// The real network prober: hickory DNS, a timed TCP + rustls handshake, then
/// HTTP/1.1 over that same connection with redirects followed by hand.
pub struct HttpProber {
    timeout: Duration,
    user_agent: String,
    max_redirects: usize,
    resolver: TokioAsyncResolver,
    connector: TlsConnector,
}

/// An established connection to one origin.
enum Transport {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

/// What the request phase observed at the end of the redirect chain.
struct Exchange {
    status: StatusCode,
    redirects: Vec<RedirectHop>,
    headers: CapturedHeaders,
    response: ResponseMeta,
    /// Session of the connection that carried the final request.
    tls: Option<TlsInfo>,
}

impl HttpProber {
    pub fn new(config: &ScanConfig) -> Result<Self, ConfigError> {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read system DNS configuration, using defaults.");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });

        Ok(Self {
            timeout: config.timeout,
            user_agent: config.user_agent.clone(),
            max_redirects: config.max_redirects,
            resolver,
            connector: tls::build_connector(config.verify_tls)?,
        })
    }

    async fn run(&self, domain: &Domain, scheme: Scheme) -> ProbeAttempt {
        let started = Instant::now();
        let deadline = deadline_after(started, self.timeout);
        let mut timings = PhaseTimings::default();
        debug!(domain = %domain, scheme = %scheme, "Starting probe attempt.");

        // --- DNS ---
        let resolved = timeout_at(deadline, self.resolve(domain.hostname())).await;
        timings.dns_ms = Some(elapsed_ms(started));
        let ip = match resolved {
            Ok(Ok(ip)) => ip,
            Ok(Err(detail)) => {
                return self.finish(domain, ProbeAttempt::failed(scheme, ProbeOutcome::DnsError(detail), timings));
            }
            Err(_) => {
                let outcome = ProbeOutcome::Timeout(self.timeout_detail("DNS resolution"));
                return self.finish(domain, ProbeAttempt::failed(scheme, outcome, timings));
            }
        };
        let addr = SocketAddr::new(ip, domain.port().unwrap_or(scheme.default_port()));

        // --- Connect (+ TLS) ---
        let connect_started = Instant::now();
        let connected = timeout_at(deadline, self.connect(domain.hostname(), scheme, addr)).await;
        timings.connect_ms = Some(elapsed_ms(connect_started));
        let connection = match connected {
            Ok(Ok(connection)) => connection,
            Ok(Err(outcome)) => {
                return self.finish(domain, ProbeAttempt::failed(scheme, outcome, timings));
            }
            Err(_) => {
                let outcome = ProbeOutcome::Timeout(self.timeout_detail("connect"));
                return self.finish(domain, ProbeAttempt::failed(scheme, outcome, timings));
            }
        };

        // --- HTTP request and redirects ---
        let exchange = timeout_at(deadline, self.request(domain, scheme, connection)).await;
        timings.total_ms = Some(elapsed_ms(started));
        let exchange = match exchange {
            Ok(Ok(exchange)) => exchange,
            Ok(Err(outcome)) => {
                return self.finish(domain, ProbeAttempt::failed(scheme, outcome, timings));
            }
            Err(_) => {
                let outcome = ProbeOutcome::Timeout(self.timeout_detail("HTTP request"));
                return self.finish(domain, ProbeAttempt::failed(scheme, outcome, timings));
            }
        };

        debug!(status = %exchange.status, hops = exchange.redirects.len(), "Final response received.");
        self.finish(
            domain,
            ProbeAttempt {
                scheme,
                outcome: ProbeOutcome::Success(exchange.response),
                timings,
                redirects: exchange.redirects,
                tls: exchange.tls,
                headers: exchange.headers,
            },
        )
    }

    fn finish(&self, domain: &Domain, attempt: ProbeAttempt) -> ProbeAttempt {
        match &attempt.outcome {
            ProbeOutcome::Success(meta) => info!(
                domain = %domain,
                scheme = %attempt.scheme,
                status = meta.status_code,
                total_ms = attempt.timings.total_ms.unwrap_or_default(),
                "Probe attempt succeeded."
            ),
            failed => info!(
                domain = %domain,
                scheme = %attempt.scheme,
                kind = %failed.kind(),
                detail = failed.error_detail().unwrap_or_default(),
                "Probe attempt failed."
            ),
        }
        attempt
    }

    fn timeout_detail(&self, phase: &str) -> String {
        format!("{phase} timed out after {:.1}s", self.timeout.as_secs_f64())
    }

    /// Resolves a hostname to its first address. IP literals are returned as-is.
    async fn resolve(&self, hostname: &str) -> Result<IpAddr, String> {
        if let Ok(ip) = hostname.parse::<IpAddr>() {
            return Ok(ip);
        }
        debug!(hostname, "Resolving hostname.");
        let lookup = self
            .resolver
            .lookup_ip(hostname)
            .await
            .map_err(|e| e.to_string())?;
        lookup
            .iter()
            .next()
            .ok_or_else(|| format!("no addresses found for {hostname}"))
    }

    /// Opens the TCP connection and, for https, completes the TLS handshake.
    async fn connect(
        &self,
        hostname: &str,
        scheme: Scheme,
        addr: SocketAddr,
    ) -> Result<(Transport, Option<TlsInfo>), ProbeOutcome> {
        debug!(%addr, "Opening TCP connection.");
        let tcp = TcpStream::connect(addr)
            .await
            .map_err(|e| ProbeOutcome::ConnectionError(format!("{addr}: {e}")))?;

        match scheme {
            Scheme::Http => Ok((Transport::Plain(tcp), None)),
            Scheme::Https => {
                let (stream, info) = tls::handshake(&self.connector, hostname, tcp)
                    .await
                    .map_err(ProbeOutcome::TlsError)?;
                Ok((Transport::Tls(Box::new(stream)), Some(info)))
            }
        }
    }

    /// Resolves and connects to the origin of a redirect target.
    async fn open(&self, url: &Url) -> Result<(Transport, Option<TlsInfo>), ProbeOutcome> {
        let scheme = url_scheme(url)?;
        let host = url
            .host_str()
            .ok_or_else(|| ProbeOutcome::HttpError(format!("redirect target {url} has no host")))?;
        let hostname = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        let port = url.port_or_known_default().unwrap_or(scheme.default_port());

        let ip = self.resolve(hostname).await.map_err(ProbeOutcome::DnsError)?;
        self.connect(hostname, scheme, SocketAddr::new(ip, port)).await
    }

    fn build_request(&self, url: &Url) -> Result<Request<String>, ProbeOutcome> {
        let target = &url[Position::BeforePath..Position::AfterQuery];
        let authority = &url[Position::BeforeHost..Position::AfterPort];
        Request::get(target)
            .header(HOST, authority)
            .header(USER_AGENT, self.user_agent.as_str())
            .header(ACCEPT, "*/*")
            .body(String::new())
            .map_err(|e| ProbeOutcome::HttpError(format!("invalid request for {url}: {e}")))
    }

    /// Sends `GET /` over the connection opened by the connect phase and follows
    /// up to `max_redirects` redirects by hand. Every redirect hop gets its own
    /// connection, since the previous response body is never read.
    async fn request(
        &self,
        domain: &Domain,
        scheme: Scheme,
        connection: (Transport, Option<TlsInfo>),
    ) -> Result<Exchange, ProbeOutcome> {
        let mut current = Url::parse(&format!("{scheme}://{domain}/"))
            .map_err(|e| ProbeOutcome::HttpError(format!("invalid URL for {domain}: {e}")))?;
        let mut pending = Some(connection);
        let mut redirects = Vec::new();

        loop {
            let (transport, tls) = match pending.take() {
                Some(connection) => connection,
                None => self.open(&current).await?,
            };
            let request = self.build_request(&current)?;
            debug!(url = %current, "Sending request.");
            let response = match transport {
                Transport::Plain(stream) => send(stream, request).await,
                Transport::Tls(stream) => send(stream, request).await,
            }
            .map_err(|e| classify_http_error(&e))?;
            let status = response.status();

            if is_redirect(status) && redirects.len() < self.max_redirects {
                match response.headers().get(LOCATION) {
                    Some(location) => {
                        let next = resolve_location(&current, location)?;
                        debug!(status = %status, from = %current, to = %next, "Following redirect.");
                        redirects.push(RedirectHop {
                            status_code: status.as_u16(),
                            url: next.to_string(),
                        });
                        current = next;
                        continue;
                    }
                    None => {
                        warn!(status = %status, url = %current, "Redirect status without a Location header.");
                    }
                }
            }

            // TLS metadata only when the final hop itself was https.
            let headers = response.headers();
            return Ok(Exchange {
                headers: extract_headers(headers),
                response: ResponseMeta {
                    status_code: status.as_u16(),
                    final_url: current.to_string(),
                    body: extract_body_meta(headers),
                },
                status,
                redirects,
                tls,
            });
        }
    }
}

impl Prober for HttpProber {
    fn probe(&self, domain: &Domain, scheme: Scheme) -> impl Future<Output = ProbeAttempt> + Send {
        self.run(domain, scheme)
    }
}

// --- Helpers ---

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

/// `started + timeout`, or a far-future deadline when that overflows.
fn deadline_after(started: Instant, timeout: Duration) -> Instant {
    started
        .checked_add(timeout)
        .unwrap_or_else(|| started + FAR_FUTURE)
}

/// Runs one HTTP/1.1 exchange over `io`. The connection is driven alongside the
/// request and dropped once the response head has arrived.
async fn send<S>(io: S, request: Request<String>) -> Result<Response<Incoming>, hyper::Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut sender, connection) = http1::handshake(TokioIo::new(io)).await?;
    let mut connection = pin!(connection);
    let mut response = pin!(sender.send_request(request));

    tokio::select! {
        biased;
        result = &mut response => result,
        closed = &mut connection => match closed {
            Ok(()) => response.await,
            Err(e) => Err(e),
        },
    }
}

fn url_scheme(url: &Url) -> Result<Scheme, ProbeOutcome> {
    Scheme::FALLBACK_ORDER
        .into_iter()
        .find(|scheme| scheme.as_ref() == url.scheme())
        .ok_or_else(|| ProbeOutcome::HttpError(format!("unsupported redirect scheme '{}'", url.scheme())))
}

/// 301, 302, 303, 307 and 308 are followed; other 3xx codes are final.
pub fn is_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

/// Resolves a `Location` value, absolute or relative, against the current URL.
pub fn resolve_location(current: &Url, location: &HeaderValue) -> Result<Url, ProbeOutcome> {
    let location = location
        .to_str()
        .map_err(|_| ProbeOutcome::HttpError("redirect Location is not valid UTF-8".to_string()))?;
    current
        .join(location)
        .map_err(|e| ProbeOutcome::HttpError(format!("invalid redirect Location '{location}': {e}")))
}

/// Maps a failed HTTP exchange onto exactly one outcome. A TLS failure after the
/// handshake keeps its kind; a peer that hangs up mid-exchange is a connection error.
fn classify_http_error(err: &hyper::Error) -> ProbeOutcome {
    let detail = error_chain(err);
    if has_tls_cause(err) {
        ProbeOutcome::TlsError(detail)
    } else if err.is_incomplete_message() || err.is_closed() || has_io_cause(err) {
        ProbeOutcome::ConnectionError(detail)
    } else {
        ProbeOutcome::HttpError(detail)
    }
}

/// Whether a `rustls::Error` appears anywhere in the source chain. `io::Error`
/// does not expose its payload through `source`, so it is unwrapped explicitly.
fn has_tls_cause(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if e.is::<rustls::Error>() {
            return true;
        }
        if let Some(inner) = e.downcast_ref::<io::Error>().and_then(io::Error::get_ref) {
            if inner.is::<rustls::Error>() {
                return true;
            }
        }
        current = e.source();
    }
    false
}

fn has_io_cause(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if e.is::<io::Error>() {
            return true;
        }
        current = e.source();
    }
    false
}

/// The error and its sources joined with `": "`, skipping repeated messages.
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        let message = e.to_string();
        if parts.last() != Some(&message) {
            parts.push(message);
        }
        current = e.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Wrapper(io::Error);

    impl fmt::Display for Wrapper {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("error sending request")
        }
    }

    impl StdError for Wrapper {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_is_redirect() {
        for code in [301, 302, 303, 307, 308] {
            assert!(is_redirect(StatusCode::from_u16(code).unwrap()));
        }
        for code in [200, 300, 304, 305, 404, 500] {
            assert!(!is_redirect(StatusCode::from_u16(code).unwrap()));
        }
    }

    #[test]
    fn test_resolve_location() {
        let base = Url::parse("https://example.com/a/b").unwrap();
        let absolute = resolve_location(&base, &HeaderValue::from_static("https://www.example.com/")).unwrap();
        assert_eq!(absolute.as_str(), "https://www.example.com/");

        let relative = resolve_location(&base, &HeaderValue::from_static("/login")).unwrap();
        assert_eq!(relative.as_str(), "https://example.com/login");

        let sibling = resolve_location(&base, &HeaderValue::from_static("c")).unwrap();
        assert_eq!(sibling.as_str(), "https://example.com/a/c");

        let broken = resolve_location(&base, &HeaderValue::from_static("http://[::1"));
        assert!(matches!(broken, Err(ProbeOutcome::HttpError(_))));
    }

    #[test]
    fn test_tls_cause_found_inside_io_error() {
        let tls = io::Error::new(io::ErrorKind::InvalidData, rustls::Error::General("bad record".into()));
        assert!(has_tls_cause(&Wrapper(tls)));

        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        assert!(!has_tls_cause(&Wrapper(refused)));
    }

    #[test]
    fn test_error_chain_joins_sources() {
        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        assert_eq!(error_chain(&Wrapper(refused)), "error sending request: connection refused");
    }

    #[test]
    fn test_deadline_survives_huge_timeout() {
        let started = Instant::now();
        assert!(deadline_after(started, Duration::MAX) > started);
        assert_eq!(deadline_after(started, Duration::from_secs(5)), started + Duration::from_secs(5));
    }

    #[test]
    fn test_url_scheme() {
        let https = Url::parse("https://example.com/").unwrap();
        assert_eq!(url_scheme(&https), Ok(Scheme::Https));
        let http = Url::parse("http://example.com/").unwrap();
        assert_eq!(url_scheme(&http), Ok(Scheme::Http));
        let ftp = Url::parse("ftp://example.com/").unwrap();
        assert!(matches!(url_scheme(&ftp), Err(ProbeOutcome::HttpError(_))));
    }

    #[tokio::test]
    async fn test_build_request_targets_path_and_authority() {
        let prober = HttpProber::new(&ScanConfig::default()).unwrap();
        let url = Url::parse("http://[::1]:8080/login?next=%2F").unwrap();
        let request = prober.build_request(&url).unwrap();

        assert_eq!(request.uri(), "/login?next=%2F");
        assert_eq!(request.headers()[HOST], "[::1]:8080");
        assert_eq!(request.headers()[USER_AGENT], ScanConfig::default().user_agent.as_str());
        assert!(request.body().is_empty());
    }

    #[tokio::test]
    async fn test_ip_literal_skips_dns() {
        let prober = HttpProber::new(&ScanConfig::default()).unwrap();
        assert_eq!(prober.resolve("127.0.0.1").await, Ok(IpAddr::from([127, 0, 0, 1])));
        assert_eq!(prober.resolve("::1").await, Ok("::1".parse::<IpAddr>().unwrap()));
    }
}
