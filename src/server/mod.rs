//! Minimal HTTP endpoint exposing the collected report.
//!
//! One route, read-only: `GET /api/org` returns the report file as JSON.
//! The file is read and validated once at startup; restart the server to
//! pick up a new snapshot.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

/// The single route the report is exposed on.
pub const REPORT_ROUTE: &str = "/api/org";

/// Serve the report file on `port` until the process is killed.
pub async fn serve(input: &Path, port: u16) -> Result<()> {
    let body = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read report file: {}", input.display()))?;
    serde_json::from_str::<serde_json::Value>(&body)
        .with_context(|| format!("Report file is not valid JSON: {}", input.display()))?;
    let body = Arc::new(body);

    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;
    info!("Serving report on http://0.0.0.0:{port}{REPORT_ROUTE}");

    loop {
        let (stream, peer) = listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        let body = Arc::clone(&body);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, body.as_str()).await {
                debug!("connection from {peer} failed: {e}");
            }
        });
    }
}

async fn handle_connection(mut stream: TcpStream, body: &str) -> std::io::Result<()> {
    let mut buf = [0u8; 4096];
    let n = stream.read(&mut buf).await?;
    let request = String::from_utf8_lossy(&buf[..n]);

    let response = match parse_request_line(&request) {
        Some(("GET", path)) if path == REPORT_ROUTE => {
            http_response("200 OK", "application/json", body)
        }
        Some(_) => http_response("404 Not Found", "text/plain", "not found\n"),
        None => http_response("400 Bad Request", "text/plain", "bad request\n"),
    };

    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

/// Method and path (query string stripped) from the request line.
fn parse_request_line(request: &str) -> Option<(&str, &str)> {
    let line = request.lines().next()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    let target = parts.next()?;
    let path = target.split('?').next().unwrap_or(target);
    Some((method, path))
}

fn http_response(status: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}
