//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image_proxy::upstream::UpstreamClient;
use image_proxy::{HttpServer, ProxyConfig, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Canned answer for a mock upstream.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub headers: Vec<(&'static str, String)>,
    /// Content-Length to announce instead of the real body length.
    pub declared_length: Option<usize>,
    pub body: Vec<u8>,
}

impl MockReply {
    pub fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: Some(content_type),
            headers: Vec::new(),
            declared_length: None,
            body: body.into(),
        }
    }

    /// An empty-bodied redirect to `location`.
    pub fn redirect(status: u16, location: &str) -> Self {
        Self {
            status,
            content_type: None,
            headers: vec![("Location", location.to_string())],
            declared_length: None,
            body: Vec::new(),
        }
    }

    /// Announce `len` bytes but send only the real body, then close.
    pub fn declaring_length(mut self, len: usize) -> Self {
        self.declared_length = Some(len);
        self
    }
}

/// Request head as received by a mock upstream.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl SeenRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A running mock upstream that records every request it answers.
pub struct MockBackend {
    pub addr: SocketAddr,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl MockBackend {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hits(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

/// Start a mock upstream on an ephemeral port that always answers `reply`.
pub async fn start_backend(reply: MockReply) -> MockBackend {
    start_routed_backend(move |_| reply.clone()).await
}

/// Start a mock upstream whose answer depends on the request path.
pub async fn start_routed_backend<F>(route: F) -> MockBackend
where
    F: Fn(&str) -> MockReply + Send + Sync + 'static,
{
    let route = Arc::new(route);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = seen.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let route = route.clone();
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        answer(socket, route.as_ref(), recorded).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockBackend { addr, seen }
}

async fn answer<F>(mut socket: TcpStream, route: &F, recorded: Arc<Mutex<Vec<SeenRequest>>>)
where
    F: Fn(&str) -> MockReply + ?Sized,
{
    let Some(request) = read_head(&mut socket).await else {
        return;
    };
    let reply = route(&request.path);
    recorded.lock().unwrap().push(request);

    let mut head = format!("HTTP/1.1 {} Mock\r\n", reply.status);
    if let Some(ct) = reply.content_type {
        head.push_str(&format!("Content-Type: {}\r\n", ct));
    }
    for (name, value) in &reply.headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        reply.declared_length.unwrap_or(reply.body.len())
    ));

    let _ = socket.write_all(head.as_bytes()).await;
    let _ = socket.write_all(&reply.body).await;
    let _ = socket.shutdown().await;
}

async fn read_head(socket: &mut TcpStream) -> Option<SeenRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let text = String::from_utf8_lossy(&buf);
    let mut lines = text.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let headers = lines
        .take_while(|l| !l.is_empty())
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    Some(SeenRequest {
        method,
        path,
        headers,
    })
}

/// Start an upstream that accepts connections and never answers.
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(120)).await;
                drop(socket);
            });
        }
    });

    addr
}

/// Upstream that reads each request head and then drops the connection.
pub struct DroppingBackend {
    pub addr: SocketAddr,
    attempts: Arc<AtomicUsize>,
}

impl DroppingBackend {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

/// Start an upstream that fails every request at the transport level.
pub async fn start_dropping_backend() -> DroppingBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let counter = counter.clone();
            tokio::spawn(async move {
                if read_head(&mut socket).await.is_some() {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
                drop(socket);
            });
        }
    });

    DroppingBackend { addr, attempts }
}

/// Upstream serving an endless JPEG in small slow chunks.
pub struct TrickleBackend {
    pub addr: SocketAddr,
    peer_gone: Arc<AtomicBool>,
}

impl TrickleBackend {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Whether a write failed because the reader closed the connection.
    pub fn peer_gone(&self) -> bool {
        self.peer_gone.load(Ordering::SeqCst)
    }
}

pub async fn start_trickle_backend() -> TrickleBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let peer_gone = Arc::new(AtomicBool::new(false));
    let flag = peer_gone.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let flag = flag.clone();
            tokio::spawn(async move {
                if read_head(&mut socket).await.is_none() {
                    return;
                }
                let head = "HTTP/1.1 200 OK\r\nContent-Type: image/jpeg\r\nContent-Length: 100000000\r\n\r\n";
                if socket.write_all(head.as_bytes()).await.is_err() {
                    flag.store(true, Ordering::SeqCst);
                    return;
                }
                let chunk = [0xABu8; 1024];
                for _ in 0..600 {
                    if socket.write_all(&chunk).await.is_err() {
                        flag.store(true, Ordering::SeqCst);
                        return;
                    }
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
            });
        }
    });

    TrickleBackend { addr, peer_gone }
}

/// An address nothing listens on, so connections are refused.
pub fn closed_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// A running proxy under test.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub client: Arc<UpstreamClient>,
    shutdown: Shutdown,
}

impl TestProxy {
    pub fn endpoint(&self) -> String {
        format!("http://{}/", self.addr)
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Default config pointed at `gateway` for fallbacks.
pub fn config_with_gateway(gateway: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.fallback.gateway_base = format!("http://{}", gateway);
    config
}

/// Start the real server on an ephemeral port.
pub async fn start_proxy(config: ProxyConfig) -> TestProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let client = server.upstream_client();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestProxy {
        addr,
        client,
        shutdown,
    }
}

/// Caller-side HTTP client that never goes through a system proxy.
pub fn caller() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
}
