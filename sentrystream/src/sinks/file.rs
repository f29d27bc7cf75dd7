// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Append-only file sink with size-triggered rotation (§4.7, §6 "File sink
//! layout"). The live file is always the configured path; on crossing the
//! size threshold it's renamed with a `.YYYYMMDD-HHMMSS` suffix and a fresh
//! file opened in its place.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use sentrystream_domain::aggregates::alert::Alert;
use sentrystream_domain::aggregates::event::Event;
use sentrystream_domain::ports::Sink;
use sentrystream_domain::{DomainError, DomainResult};

use super::format::Format;

const DEFAULT_MAX_BYTES: u64 = 100 * 1024 * 1024;
const DIR_MODE: u32 = 0o755;
const FILE_MODE: u32 = 0o644;

struct FileState {
    file: tokio::fs::File,
    size: u64,
}

pub struct FileSink {
    path: PathBuf,
    max_bytes: u64,
    format: Format,
    state: Mutex<FileState>,
}

impl FileSink {
    pub fn new(path: impl AsRef<Path>, format: Format) -> DomainResult<Self> {
        Self::with_max_bytes(path, format, DEFAULT_MAX_BYTES)
    }

    pub fn with_max_bytes(path: impl AsRef<Path>, format: Format, max_bytes: u64) -> DomainResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
                set_mode(parent, DIR_MODE);
            }
        }

        let file = open_append(&path)?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            path,
            max_bytes,
            format,
            state: Mutex::new(FileState { file: tokio::fs::File::from_std(file), size }),
        })
    }

    async fn write_line(&self, line: &str) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        if state.size + line.len() as u64 + 1 > self.max_bytes {
            self.rotate(&mut state).await?;
        }
        state.file.write_all(line.as_bytes()).await?;
        state.file.write_all(b"\n").await?;
        state.size += line.len() as u64 + 1;
        Ok(())
    }

    async fn rotate(&self, state: &mut FileState) -> DomainResult<()> {
        state.file.flush().await.ok();
        let suffix = Utc::now().format("%Y%m%d-%H%M%S");
        let rotated = self.path.with_file_name(format!(
            "{}.{}",
            self.path.file_name().and_then(|n| n.to_str()).unwrap_or("sink.log"),
            suffix
        ));
        tokio::fs::rename(&self.path, &rotated).await?;
        let fresh = open_append(&self.path)?;
        state.file = tokio::fs::File::from_std(fresh);
        state.size = 0;
        Ok(())
    }
}

fn open_append(path: &Path) -> DomainResult<std::fs::File> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .mode(FILE_MODE)
            .open(path)
            .map_err(DomainError::from)
    }
    #[cfg(not(unix))]
    {
        std::fs::OpenOptions::new().create(true).append(true).open(path).map_err(DomainError::from)
    }
}

fn set_mode(_path: &Path, _mode: u32) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(meta) = std::fs::metadata(_path) {
            let mut perms = meta.permissions();
            perms.set_mode(_mode);
            let _ = std::fs::set_permissions(_path, perms);
        }
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn write_event(&self, event: &Event) -> DomainResult<()> {
        let line = self.format.encode_event(event)?;
        self.write_line(&line).await
    }

    async fn write_alert(&self, alert: &Alert) -> DomainResult<()> {
        let line = self.format.encode_alert(alert)?;
        self.write_line(&line).await?;
        self.state.lock().await.file.flush().await?;
        Ok(())
    }

    async fn close(&self) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        state.file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentrystream_domain::value_objects::enums::{Direction, EventKind};
    use tempfile::tempdir;

    #[tokio::test]
    async fn writes_and_rotates_on_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.log");
        let sink = FileSink::with_max_bytes(&path, Format::Jsonl, 32).unwrap();

        for _ in 0..5 {
            let event = Event::new(EventKind::Read, Direction::Inbound, 1, "sh", 0, b"hello world");
            sink.write_event(&event).await.unwrap();
        }
        sink.close().await.unwrap();

        let mut entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().filter_map(|e| e.ok()).collect();
        entries.sort_by_key(|e| e.file_name());
        assert!(entries.len() > 1, "expected rotation to produce extra files, got {entries:?}");
    }
}
