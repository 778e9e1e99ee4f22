// tests/common/mod.rs

//! Minimal local HTTP servers for exercising the real prober without the network.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rcgen::CertifiedKey;
use rustls::ServerConfig;
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use vanguard_httpcheck::core::models::Domain;
use vanguard_httpcheck::core::normalizer::normalize;

/// First byte of a TLS record carrying a handshake message.
const TLS_HANDSHAKE_RECORD: u8 = 0x16;

pub fn local_domain(port: u16) -> Domain {
    normalize(&format!("127.0.0.1:{port}")).expect("loopback address normalizes")
}

/// A raw HTTP/1.1 response with an empty body and `Connection: close`.
pub fn response(status_line: &str, headers: &[(&str, &str)]) -> String {
    let mut out = format!("HTTP/1.1 {status_line}\r\nContent-Length: 0\r\nConnection: close\r\n");
    for (name, value) in headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str("\r\n");
    out
}

/// A running local server and the number of connections it has accepted.
pub struct TestServer {
    pub port: u16,
    accepted: Arc<AtomicUsize>,
}

impl TestServer {
    pub fn connections(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

/// Serves plain HTTP, answering each request with `handler(path)`. TLS client
/// hellos are dropped by closing the connection.
pub async fn serve<F>(handler: F) -> u16
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    serve_counted(handler).await.port
}

/// Like [`serve`], keeping count of accepted connections.
pub async fn serve_counted<F>(handler: F) -> TestServer
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let port = listener.local_addr().expect("listener address").port();
    let handler = Arc::new(handler);
    let accepted = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&accepted);
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            let handler = Arc::clone(&handler);
            tokio::spawn(async move { handle(socket, handler.as_ref()).await });
        }
    });
    TestServer { port, accepted }
}

/// Serves HTTPS with a freshly generated self-signed certificate for
/// `127.0.0.1` and `localhost`.
pub async fn serve_tls<F>(handler: F) -> TestServer
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    let acceptor = self_signed_acceptor();
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let port = listener.local_addr().expect("listener address").port();
    let handler = Arc::new(handler);
    let accepted = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&accepted);
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            let handler = Arc::clone(&handler);
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                if let Ok(stream) = acceptor.accept(socket).await {
                    handle(stream, handler.as_ref()).await;
                }
            });
        }
    });
    TestServer { port, accepted }
}

fn self_signed_acceptor() -> TlsAcceptor {
    let CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["127.0.0.1".to_string(), "localhost".to_string()])
            .expect("generate self-signed certificate");
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));

    let config = ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()
        .expect("default protocol versions")
        .with_no_client_auth()
        .with_single_cert(vec![cert.der().clone()], key)
        .expect("server certificate");
    TlsAcceptor::from(Arc::new(config))
}

async fn handle<S, F>(mut socket: S, handler: &F)
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: Fn(&str) -> String,
{
    let mut request = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        if request.is_empty() && chunk[0] == TLS_HANDSHAKE_RECORD {
            return;
        }
        request.extend_from_slice(&chunk[..n]);
        if request.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    let request = String::from_utf8_lossy(&request);
    let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
    let _ = socket.write_all(handler(&path).as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Accepts connections and never answers.
pub async fn silent_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let port = listener.local_addr().expect("listener address").port();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    port
}

/// Writes plaintext bytes as soon as a client connects, without reading.
pub async fn plaintext_greeter() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let port = listener.local_addr().expect("listener address").port();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((mut socket, _)) = listener.accept().await {
            let _ = socket.write_all(b"HTTP/1.1 400 Bad Request\r\n\r\n").await;
            held.push(socket);
        }
    });
    port
}

/// A port nothing listens on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let port = listener.local_addr().expect("listener address").port();
    drop(listener);
    port
}
