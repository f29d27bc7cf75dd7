// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Lightweight HTTP server exposing `/metrics` (Prometheus text format) and
//! `/health` (plain "OK"). No framework: a raw Tokio `TcpListener` is enough
//! for two read-only, auth-free endpoints scraped by infrastructure, not
//! browsed by people.

use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::{EngineError, EngineResult};
use crate::metrics::service::MetricsService;

pub struct MetricsEndpoint {
    metrics: Arc<MetricsService>,
    port: u16,
}

impl MetricsEndpoint {
    pub fn new(metrics: Arc<MetricsService>, port: u16) -> Self {
        Self { metrics, port }
    }

    /// Serves until `shutdown` is cancelled.
    pub async fn serve(&self, shutdown: CancellationToken) -> EngineResult<()> {
        let addr = format!("127.0.0.1:{}", self.port);
        let listener = TcpListener::bind(&addr).await.map_err(EngineError::Network)?;
        info!("metrics endpoint listening on http://{}/metrics", addr);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("metrics endpoint shutting down");
                    return Ok(());
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((mut stream, _)) => {
                            let metrics = self.metrics.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_request(&mut stream, metrics).await {
                                    error!("error handling metrics request: {e}");
                                }
                            });
                        }
                        Err(e) => error!("error accepting metrics connection: {e}"),
                    }
                }
            }
        }
    }
}

async fn handle_request(
    stream: &mut tokio::net::TcpStream,
    metrics: Arc<MetricsService>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut buffer = [0u8; 1024];
    let n = stream.read(&mut buffer).await?;
    let request = String::from_utf8_lossy(&buffer[..n]);
    debug!("metrics endpoint request: {}", request.lines().next().unwrap_or(""));

    if request.starts_with("GET /metrics") {
        match metrics.render() {
            Ok(body) => {
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4; charset=utf-8\r\nContent-Length: {}\r\n\r\n{}",
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).await?;
            }
            Err(e) => {
                let body = format!("error rendering metrics: {e}");
                let response = format!(
                    "HTTP/1.1 500 Internal Server Error\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).await?;
            }
        }
    } else if request.starts_with("GET /health") {
        stream
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 2\r\n\r\nOK")
            .await?;
    } else {
        stream
            .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\nContent-Length: 9\r\n\r\nNot Found")
            .await?;
    }

    stream.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn endpoint_constructs_with_a_metrics_service() {
        let metrics = Arc::new(MetricsService::new().unwrap());
        let _endpoint = MetricsEndpoint::new(metrics, 0);
    }
}
