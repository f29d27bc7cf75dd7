// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The Stream Manager (§4.5): a registry of live captures keyed by
//! `StreamId`, responsible for construction, lifecycle, and installing the
//! default S1 filter set when a `StreamConfig` names none of its own.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::info;

use sentrystream_domain::entities::stream_config::StreamConfig;
use sentrystream_domain::ports::capture::{Capture, CaptureContext};
use sentrystream_domain::value_objects::ids::StreamId;
use sentrystream_domain::{DomainError, DomainResult};

use crate::capture::StdioCapture;
use crate::filters::{build_filter, default_filter_specs};

pub struct StreamHandle {
    pub capture: Arc<dyn Capture>,
    pub context: CaptureContext,
}

/// Registry of every stream this process is capturing. Construction and
/// destruction are the only operations that take a write lock on the whole
/// map; everything else (filters, subscribers, stats) is interior-mutable
/// on the individual capture.
pub struct StreamManager {
    streams: DashMap<StreamId, StreamHandle>,
    default_rate_limit_per_sec: u32,
}

impl StreamManager {
    pub fn new(default_rate_limit_per_sec: u32) -> Self {
        Self {
            streams: DashMap::new(),
            default_rate_limit_per_sec,
        }
    }

    /// Creates a stream from `config`, installing the default filter set if
    /// `config` names none (§4.5). Does not start capturing — call
    /// `start_stream` separately.
    pub fn create_stream(&self, config: StreamConfig) -> DomainResult<StreamId> {
        let stream_id = StreamId::new();
        let use_defaults = config.has_no_filters();
        let specs = if use_defaults {
            default_filter_specs(self.default_rate_limit_per_sec)
        } else {
            config.filters.clone()
        };

        let capture = Arc::new(StdioCapture::new(stream_id, config));
        for spec in &specs {
            let filter = build_filter(spec)?;
            capture.add_filter(filter);
        }

        self.streams.insert(
            stream_id,
            StreamHandle {
                capture,
                context: CaptureContext::new(),
            },
        );

        info!(
            "created stream {stream_id} with {} filter(s){}",
            specs.len(),
            if use_defaults { " (defaults)" } else { "" }
        );
        Ok(stream_id)
    }

    /// Stops the stream's capture (if running) before removing it, so
    /// deleting a stream always releases its resources deterministically
    /// rather than leaving a background task to wind down on its own.
    pub async fn destroy_stream(&self, id: &StreamId) -> DomainResult<()> {
        let capture = self
            .streams
            .get(id)
            .map(|handle| handle.capture.clone())
            .ok_or_else(|| DomainError::StreamNotFound(id.to_string()))?;
        capture.stop(Duration::from_secs(5)).await?;
        self.streams.remove(id);
        Ok(())
    }

    pub async fn start_stream(&self, id: &StreamId) -> DomainResult<()> {
        let handle = self
            .streams
            .get(id)
            .ok_or_else(|| DomainError::StreamNotFound(id.to_string()))?;
        handle.capture.start(handle.context.clone()).await
    }

    pub async fn stop_stream(&self, id: &StreamId, deadline: Duration) -> DomainResult<()> {
        let handle = self
            .streams
            .get(id)
            .ok_or_else(|| DomainError::StreamNotFound(id.to_string()))?;
        handle.capture.stop(deadline).await
    }

    /// Starts every registered stream, collecting per-stream failures
    /// rather than aborting on the first one.
    pub async fn start_all(&self) -> Vec<(StreamId, DomainError)> {
        let mut errors = Vec::new();
        for id in self.list() {
            if let Err(e) = self.start_stream(&id).await {
                errors.push((id, e));
            }
        }
        errors
    }

    /// Stops every registered stream, collecting per-stream failures
    /// rather than aborting on the first one. Used on SIGINT/SIGTERM to
    /// wind every capture down before the process exits.
    pub async fn stop_all(&self, deadline: Duration) -> Vec<(StreamId, DomainError)> {
        let mut errors = Vec::new();
        for id in self.list() {
            if let Err(e) = self.stop_stream(&id, deadline).await {
                errors.push((id, e));
            }
        }
        errors
    }

    pub fn get(&self, id: &StreamId) -> DomainResult<Arc<dyn Capture>> {
        self.streams
            .get(id)
            .map(|h| h.capture.clone())
            .ok_or_else(|| DomainError::StreamNotFound(id.to_string()))
    }

    pub fn list(&self) -> Vec<StreamId> {
        self.streams.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_stream_installs_default_filters_when_config_has_none() {
        let manager = StreamManager::new(1000);
        let config = StreamConfig::stdio_spawn(vec!["/bin/true".into()], 4096);
        let id = manager.create_stream(config).unwrap();
        assert_eq!(manager.len(), 1);
        assert!(manager.get(&id).is_ok());
    }

    #[tokio::test]
    async fn destroy_stream_fails_for_an_unknown_id() {
        let manager = StreamManager::new(1000);
        let result = manager.destroy_stream(&StreamId::new()).await;
        assert!(matches!(result, Err(DomainError::StreamNotFound(_))));
    }

    #[tokio::test]
    async fn list_reflects_creates_and_destroys() {
        let manager = StreamManager::new(1000);
        let id = manager.create_stream(StreamConfig::stdio_spawn(vec!["/bin/true".into()], 4096)).unwrap();
        assert_eq!(manager.list(), vec![id]);
        manager.destroy_stream(&id).await.unwrap();
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn stop_all_is_a_noop_on_an_empty_manager() {
        let manager = StreamManager::new(1000);
        assert!(manager.stop_all(Duration::from_secs(1)).await.is_empty());
    }
}
