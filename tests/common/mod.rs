//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use failover_router::measurement::RequestLog;
use failover_router::service::{OrderService, ServiceConfig};
use failover_router::state::RouterState;
use failover_router::{HttpServer, RouterConfig, Shutdown};

/// Start a programmable mock backend on an ephemeral port.
///
/// `f` maps the request path to `(status, body)`. Every response closes the
/// connection, so aborting the returned handle makes the port refuse new calls.
pub async fn start_programmable_backend<F>(f: F) -> (SocketAddr, JoinHandle<()>)
where
    F: Fn(&str) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let path = read_request_path(&mut socket).await;
                        let (status, body) = f(&path);
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, handle)
}

async fn read_request_path(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf)
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string()
}

/// A backend that reports healthy but never answers `/orders/*`.
pub async fn start_stalled_backend() -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let path = read_request_path(&mut socket).await;
                if path.starts_with("/orders/") {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    return;
                }
                let body = r#"{"status":"UP"}"#;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, handle)
}

/// A backend that is healthy and serves order 1001 as `name`.
pub fn healthy_backend(name: &'static str) -> impl Fn(&str) -> (u16, String) + Send + Sync + 'static {
    move |path| match path {
        "/health" => (200, r#"{"status":"UP"}"#.to_string()),
        p if p.starts_with("/orders/") => (
            200,
            format!(r#"{{"order_id":1001,"status":"CREATED","amount":59.99,"served_by":"{name}"}}"#),
        ),
        _ => (404, r#"{"detail":"not found"}"#.to_string()),
    }
}

/// Start the simulated order service on an ephemeral port.
pub async fn start_order_service(name: &str) -> (String, OrderService, JoinHandle<()>) {
    let service = OrderService::new(ServiceConfig {
        name: name.to_string(),
        simulated_latency: Duration::ZERO,
    });
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let serving = service.clone();
    let handle = tokio::spawn(async move {
        let _ = serving.serve(listener, std::future::pending()).await;
    });

    (url, service, handle)
}

/// A router running on an ephemeral port.
pub struct TestRouter {
    pub url: String,
    pub state: Arc<RouterState>,
    pub log: Arc<RequestLog>,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<std::io::Result<()>>,
}

impl TestRouter {
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }
}

pub async fn start_router(primary_url: &str, secondary_url: &str, interval_secs: f64) -> TestRouter {
    let mut config = RouterConfig::default();
    config.replicas.primary_url = primary_url.to_string();
    config.replicas.secondary_url = secondary_url.to_string();
    config.health_check.interval_secs = interval_secs;
    config.health_check.request_timeout_secs = 0.5;

    let server = HttpServer::new(config).unwrap();
    let state = server.state().clone();
    let log = server.request_log().clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.clone()));

    TestRouter {
        url,
        state,
        log,
        shutdown,
        handle,
    }
}

/// Poll `cond` every 10ms until it holds; panic after `timeout`.
pub async fn wait_until<F, Fut>(timeout: Duration, mut cond: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while !cond().await {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within {timeout:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub async fn get_json(client: &reqwest::Client, url: &str) -> (u16, serde_json::Value) {
    let response = client.get(url).send().await.unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap_or(serde_json::Value::Null))
}

pub async fn post_json(client: &reqwest::Client, url: &str) -> (u16, serde_json::Value) {
    let response = client.post(url).send().await.unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap_or(serde_json::Value::Null))
}
