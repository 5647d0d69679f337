//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use resilient_fetch::config::RetryConfig;

/// Retry policy with a short backoff so tests run quickly.
#[allow(dead_code)]
pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        backoff_step_ms: 10,
        ..RetryConfig::default()
    }
}

/// Read the request head so closing the socket does not reset the connection.
async fn read_request_head(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn status_line(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        404 => "404 Not Found",
        429 => "429 Too Many Requests",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        504 => "504 Gateway Timeout",
        _ => "418 I'm a teapot",
    }
}

/// Start a backend that writes `response` verbatim to every connection.
#[allow(dead_code)]
pub async fn start_raw_backend(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                read_request_head(&mut socket).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// A programmable backend and the number of requests it has served.
#[allow(dead_code)]
pub struct Backend {
    pub addr: SocketAddr,
    pub calls: Arc<AtomicU32>,
}

#[allow(dead_code)]
impl Backend {
    pub fn url(&self) -> String {
        format!("http://{}/example", self.addr)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Start a backend whose reply is computed from the 0-based call index and
/// the raw request head.
#[allow(dead_code)]
pub async fn start_programmable_backend<F, Fut>(f: F) -> Backend
where
    F: Fn(u32, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(AtomicU32::new(0));
    let f = Arc::new(f);

    let counter = calls.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            let counter = counter.clone();
            tokio::spawn(async move {
                let head = read_request_head(&mut socket).await;
                let index = counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = f(index, head).await;

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line(status),
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
                tokio::time::sleep(Duration::from_millis(10)).await;
            });
        }
    });

    Backend { addr, calls }
}

/// Backend replying with `statuses[i]` for call i, repeating the last one.
#[allow(dead_code)]
pub async fn start_scripted_backend(statuses: Vec<u16>) -> Backend {
    let statuses = Arc::new(statuses);
    start_programmable_backend(move |index, _| {
        let statuses = statuses.clone();
        async move {
            let last = statuses.len().saturating_sub(1);
            let status = statuses[(index as usize).min(last)];
            let body = if status == 200 { "Success" } else { "Failure" };
            (status, body.to_string())
        }
    })
    .await
}

/// An address with nothing listening on it.
#[allow(dead_code)]
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
