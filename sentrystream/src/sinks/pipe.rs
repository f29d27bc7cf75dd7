// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Named-pipe sink (§4.7 "pipe:name", a writable endpoint with
//! line-delimited JSON). Creates the FIFO if it doesn't already exist;
//! opening it for writing blocks until a reader attaches, same as any FIFO.

use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use sentrystream_domain::aggregates::alert::Alert;
use sentrystream_domain::aggregates::event::Event;
use sentrystream_domain::ports::Sink;
use sentrystream_domain::{DomainError, DomainResult};

use super::format::Format;

pub struct PipeSink {
    format: Format,
    file: Mutex<tokio::fs::File>,
}

impl PipeSink {
    pub fn open(path: &str, format: Format) -> DomainResult<Self> {
        ensure_fifo(Path::new(path))?;

        let file = std::fs::OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| DomainError::ResourceAcquisition(format!("opening pipe '{path}': {e}")))?;

        Ok(Self { format, file: Mutex::new(tokio::fs::File::from_std(file)) })
    }

    async fn write_line(&self, line: &str) -> DomainResult<()> {
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(unix)]
fn ensure_fifo(path: &Path) -> DomainResult<()> {
    use nix::sys::stat::Mode;
    use nix::unistd::mkfifo;

    if path.exists() {
        return Ok(());
    }
    mkfifo(path, Mode::from_bits_truncate(0o644))
        .map_err(|e| DomainError::ResourceAcquisition(format!("mkfifo '{}': {e}", path.display())))
}

#[cfg(not(unix))]
fn ensure_fifo(_path: &Path) -> DomainResult<()> {
    Err(DomainError::ResourceAcquisition("named pipes are only supported on unix".into()))
}

#[async_trait]
impl Sink for PipeSink {
    async fn write_event(&self, event: &Event) -> DomainResult<()> {
        let line = self.format.encode_event(event)?;
        self.write_line(&line).await
    }

    async fn write_alert(&self, alert: &Alert) -> DomainResult<()> {
        let line = self.format.encode_alert(alert)?;
        self.write_line(&line).await
    }

    async fn close(&self) -> DomainResult<()> {
        self.file.lock().await.flush().await?;
        Ok(())
    }
}
