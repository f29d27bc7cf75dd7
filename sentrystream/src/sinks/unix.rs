// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Unix domain socket sink, same buffering/flush contract as the TCP sink
//! (§4.7).

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::UnixStream;
use tokio::sync::Mutex;

use sentrystream_domain::aggregates::alert::Alert;
use sentrystream_domain::aggregates::event::Event;
use sentrystream_domain::ports::Sink;
use sentrystream_domain::DomainError;
use sentrystream_domain::DomainResult;

use super::format::Format;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const BUFFER_CAPACITY: usize = 64 * 1024;

pub struct UnixSink {
    format: Format,
    writer: Mutex<BufWriter<UnixStream>>,
}

impl UnixSink {
    pub async fn connect(path: &str, format: Format) -> DomainResult<Self> {
        let stream = tokio::time::timeout(CONNECT_TIMEOUT, UnixStream::connect(path))
            .await
            .map_err(|_| DomainError::ResourceAcquisition(format!("unix connect to {path} timed out")))??;

        Ok(Self { format, writer: Mutex::new(BufWriter::with_capacity(BUFFER_CAPACITY, stream)) })
    }

    async fn write_line(&self, line: &str, flush: bool) -> DomainResult<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        if flush {
            writer.flush().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Sink for UnixSink {
    async fn write_event(&self, event: &Event) -> DomainResult<()> {
        let line = self.format.encode_event(event)?;
        self.write_line(&line, false).await
    }

    async fn write_alert(&self, alert: &Alert) -> DomainResult<()> {
        let line = self.format.encode_alert(alert)?;
        self.write_line(&line, true).await
    }

    async fn close(&self) -> DomainResult<()> {
        self.writer.lock().await.flush().await?;
        Ok(())
    }
}
