// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Keepalive TCP sink with a buffered writer (§4.7). Events are batched
//! behind the buffer; alerts always flush immediately so a downstream SIEM
//! sees critical findings without waiting on the next periodic flush.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use sentrystream_domain::aggregates::alert::Alert;
use sentrystream_domain::aggregates::event::Event;
use sentrystream_domain::ports::Sink;
use sentrystream_domain::DomainResult;

use super::format::Format;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const BUFFER_CAPACITY: usize = 64 * 1024;

pub struct TcpSink {
    format: Format,
    writer: Mutex<BufWriter<TcpStream>>,
}

impl TcpSink {
    pub async fn connect(host: &str, port: u16, format: Format) -> DomainResult<Self> {
        let stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect((host, port)))
            .await
            .map_err(|_| sentrystream_domain::DomainError::ResourceAcquisition(format!("tcp connect to {host}:{port} timed out")))??;
        stream.set_nodelay(true).ok();

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
impl Sink for TcpSink {
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
