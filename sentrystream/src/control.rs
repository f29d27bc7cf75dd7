// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The control socket: since a `serve` process is the only one holding a
//! live `EngineService`, every other command (`create`, `destroy`, `list`,
//! `start`, `stop`, `attach-filter`, `stats`) reaches it as a client over a
//! Unix domain socket, one newline-delimited JSON request per connection.
//! Matches the raw-Tokio, no-framework style already used for the metrics
//! endpoint; nothing here is persisted, so a `serve` restart drops every
//! stream along with it (§6, "no persisted state beyond rotation").

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use sentrystream_domain::entities::stream_config::{FilterSpec, StreamConfig};
use sentrystream_domain::value_objects::ids::StreamId;
use sentrystream_domain::DomainError;

use crate::application::EngineService;
use crate::error::{EngineError, EngineResult};
use crate::sinks::Format;

/// Resolves the control socket path: `SENTRYSTREAM_SOCKET` if set, else a
/// well-known path under the system temp directory.
pub fn socket_path() -> PathBuf {
    std::env::var_os("SENTRYSTREAM_SOCKET")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("sentrystream.sock"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ControlRequest {
    Create {
        config: StreamConfig,
        sink: String,
        format: String,
    },
    Destroy {
        stream_id: StreamId,
    },
    List,
    Start {
        stream_id: StreamId,
    },
    Stop {
        stream_id: StreamId,
    },
    AttachFilter {
        stream_id: StreamId,
        filter: FilterSpec,
    },
    Stats {
        stream_id: StreamId,
    },
}

/// Serializable projection of `CaptureStats`; the domain entity itself
/// carries a `SystemTime` that has no stable wire format, so timestamps
/// here are Unix epoch seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsDto {
    pub bytes_processed: u64,
    pub events_delivered: u64,
    pub errors: u64,
    pub drops: u64,
    pub last_event_unix_secs: Option<u64>,
}

impl From<sentrystream_domain::entities::stats::CaptureStats> for StatsDto {
    fn from(stats: sentrystream_domain::entities::stats::CaptureStats) -> Self {
        Self {
            bytes_processed: stats.bytes_processed,
            events_delivered: stats.events_delivered,
            errors: stats.errors,
            drops: stats.drops,
            last_event_unix_secs: stats.last_event.and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok()).map(|d| d.as_secs()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ControlResponse {
    Created { stream_id: StreamId },
    Ok,
    List { streams: Vec<StreamId> },
    Stats { stats: StatsDto },
    Error { message: String },
}

impl ControlResponse {
    fn from_domain_result<T>(result: Result<T, DomainError>, ok: impl FnOnce(T) -> ControlResponse) -> ControlResponse {
        match result {
            Ok(value) => ok(value),
            Err(e) => ControlResponse::Error { message: e.to_string() },
        }
    }
}

/// Connects to a running `serve` process's control socket and round-trips a
/// single request.
pub async fn send_request(request: &ControlRequest) -> EngineResult<ControlResponse> {
    let path = socket_path();
    let stream = tokio::time::timeout(Duration::from_secs(5), UnixStream::connect(&path))
        .await
        .map_err(|_| EngineError::Process(format!("connecting to {} timed out; is `sentrystream serve` running?", path.display())))?
        .map_err(|e| EngineError::Process(format!("connecting to {}: {e}", path.display())))?;

    let (read_half, mut write_half) = stream.into_split();
    let mut line = serde_json::to_string(request).map_err(|e| EngineError::Internal(e.to_string()))?;
    line.push('\n');
    write_half.write_all(line.as_bytes()).await?;
    write_half.flush().await?;

    let mut reader = BufReader::new(read_half);
    let mut response_line = String::new();
    reader.read_line(&mut response_line).await?;
    if response_line.is_empty() {
        return Err(EngineError::Process("connection closed before a response arrived".to_string()));
    }

    serde_json::from_str(response_line.trim_end()).map_err(|e| EngineError::Internal(format!("malformed control response: {e}")))
}

/// Owns the control socket listener. Every accepted connection is handled
/// on its own task against the shared `EngineService`.
pub struct ControlServer {
    listener: UnixListener,
    path: PathBuf,
}

impl ControlServer {
    pub fn bind(path: PathBuf) -> EngineResult<Self> {
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| EngineError::Process(format!("removing stale socket {}: {e}", path.display())))?;
        }
        let listener = UnixListener::bind(&path).map_err(|e| EngineError::Process(format!("binding control socket {}: {e}", path.display())))?;
        info!("control socket listening on {}", path.display());
        Ok(Self { listener, path })
    }

    pub async fn serve(self, engine: Arc<EngineService>, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("control socket shutting down");
                    break;
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, _)) => {
                            let engine = engine.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, engine).await {
                                    warn!("control connection error: {e}");
                                }
                            });
                        }
                        Err(e) => error!("error accepting control connection: {e}"),
                    }
                }
            }
        }
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

async fn handle_connection(stream: UnixStream, engine: Arc<EngineService>) -> EngineResult<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();
    reader.read_line(&mut line).await?;
    if line.is_empty() {
        return Ok(());
    }

    let request: ControlRequest = match serde_json::from_str(line.trim_end()) {
        Ok(r) => r,
        Err(e) => {
            let response = ControlResponse::Error { message: format!("malformed request: {e}") };
            write_response(&mut write_half, &response).await?;
            return Ok(());
        }
    };

    let response = dispatch(&engine, request).await;
    write_response(&mut write_half, &response).await
}

async fn dispatch(engine: &EngineService, request: ControlRequest) -> ControlResponse {
    match request {
        ControlRequest::Create { config, sink, format } => {
            let format = match format.parse::<Format>() {
                Ok(f) => f,
                Err(e) => return ControlResponse::Error { message: e.to_string() },
            };
            let result = engine.create_stream(config, &sink, format).await;
            ControlResponse::from_domain_result(result, |stream_id| ControlResponse::Created { stream_id })
        }
        ControlRequest::Destroy { stream_id } => {
            let result = engine.destroy_stream(&stream_id).await;
            ControlResponse::from_domain_result(result, |_| ControlResponse::Ok)
        }
        ControlRequest::List => ControlResponse::List { streams: engine.list() },
        ControlRequest::Start { stream_id } => {
            let result = engine.start_stream(&stream_id).await;
            ControlResponse::from_domain_result(result, |_| ControlResponse::Ok)
        }
        ControlRequest::Stop { stream_id } => {
            let result = engine.stop_stream(&stream_id, Duration::from_secs(10)).await;
            ControlResponse::from_domain_result(result, |_| ControlResponse::Ok)
        }
        ControlRequest::AttachFilter { stream_id, filter } => {
            let result = engine.attach_filter(&stream_id, &filter);
            ControlResponse::from_domain_result(result, |_| ControlResponse::Ok)
        }
        ControlRequest::Stats { stream_id } => {
            let result = engine.stats(&stream_id);
            ControlResponse::from_domain_result(result, |stats| ControlResponse::Stats { stats: stats.into() })
        }
    }
}

async fn write_response(write_half: &mut tokio::net::unix::OwnedWriteHalf, response: &ControlResponse) -> EngineResult<()> {
    let mut line = serde_json::to_string(response).map_err(|e| EngineError::Internal(e.to_string()))?;
    line.push('\n');
    write_half.write_all(line.as_bytes()).await?;
    write_half.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentrystream_domain::services::PatternRegistry;
    use std::sync::Arc;

    fn test_engine() -> Arc<EngineService> {
        let manager = Arc::new(crate::manager::StreamManager::new(1000));
        let registry = Arc::new(PatternRegistry::with_default_patterns().unwrap());
        let metrics = Arc::new(crate::metrics::MetricsService::new().unwrap());
        Arc::new(EngineService::new(manager, registry, metrics, 7.5, true, 1000))
    }

    #[tokio::test]
    async fn list_dispatch_reflects_engine_state() {
        let engine = test_engine();
        let response = dispatch(&engine, ControlRequest::List).await;
        assert!(matches!(response, ControlResponse::List { streams } if streams.is_empty()));
    }

    #[tokio::test]
    async fn create_then_stats_round_trips_through_dispatch() {
        let engine = test_engine();
        let config = StreamConfig::stdio_spawn(vec!["/bin/true".to_string()], 4096);
        let create_response = dispatch(
            &engine,
            ControlRequest::Create {
                config,
                sink: "-".to_string(),
                format: "jsonl".to_string(),
            },
        )
        .await;

        let stream_id = match create_response {
            ControlResponse::Created { stream_id } => stream_id,
            other => panic!("unexpected response: {other:?}"),
        };

        let stats_response = dispatch(&engine, ControlRequest::Stats { stream_id }).await;
        assert!(matches!(stats_response, ControlResponse::Stats { .. }));
    }

    #[tokio::test]
    async fn stats_for_unknown_stream_is_an_error_response() {
        let engine = test_engine();
        let response = dispatch(&engine, ControlRequest::Stats { stream_id: StreamId::new() }).await;
        assert!(matches!(response, ControlResponse::Error { .. }));
    }
}
