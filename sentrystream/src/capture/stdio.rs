// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! STDIO stream capture (§4.4). Two source modes:
//!
//! - `Spawn`: the child is started under a PTY we own (`nix::pty::openpty`);
//!   we read its combined stdout/stderr directly off the master fd.
//! - `Attach`: we never own the target's file descriptors. We zero-signal
//!   probe it for existence/permission, then shell out to `strace` and feed
//!   its trace text through `SyscallTraceParser`.

use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::process::Stdio;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::join_all;
use nix::pty::openpty;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use parking_lot::{Mutex, RwLock};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use sentrystream_domain::entities::stats::CaptureStats;
use sentrystream_domain::entities::stream_config::{SourceDescriptor, StreamConfig};
use sentrystream_domain::entities::stream_data::StreamData;
use sentrystream_domain::ports::capture::{Capture, CaptureContext, SubscriberCallback};
use sentrystream_domain::ports::Filter;
use sentrystream_domain::value_objects::enums::{CaptureStatus, Direction};
use sentrystream_domain::value_objects::ids::{StreamId, SubscriberId};
use sentrystream_domain::{DomainError, DomainResult};

use crate::buffer::SmartBuffer;
use crate::capture::syscall_trace::SyscallTraceParser;

const STATUS_CREATED: u8 = 0;
const STATUS_RUNNING: u8 = 1;
const STATUS_STOPPED: u8 = 2;

/// Depth of each subscriber's mailbox. A subscriber that falls this far
/// behind starts shedding chunks rather than stalling the capture loop.
const SUBSCRIBER_MAILBOX_CAPACITY: usize = 256;

/// Fan-out deadline: `dispatch` hands a chunk to every subscriber's mailbox
/// and waits at most this long for all of them to accept it before moving
/// on, so one wedged subscriber cannot stall the read loop indefinitely.
const FAN_OUT_TIMEOUT: Duration = Duration::from_millis(100);

/// Everything the background read-loop task needs, held behind one `Arc` so
/// `start()` can clone it into a spawned task without requiring callers to
/// hand the Manager an `Arc<StdioCapture>` up front.
struct Shared {
    stream_id: StreamId,
    config: StreamConfig,
    buffer: Arc<SmartBuffer>,
    filters: RwLock<Vec<Arc<dyn Filter>>>,
    subscribers: DashMap<SubscriberId, mpsc::Sender<StreamData>>,
    status: AtomicU8,
    stats: Mutex<CaptureStats>,
}

impl Shared {
    fn accepted_by_all_filters(&self, bytes: &[u8]) -> bool {
        self.filters.read().iter().all(|f| f.apply(bytes))
    }

    /// Writes `bytes` to the smart buffer, then fans the chunk out to every
    /// subscriber's own bounded mailbox concurrently. A subscriber whose
    /// mailbox is still full when `FAN_OUT_TIMEOUT` elapses is skipped for
    /// this chunk rather than blocking the others.
    async fn dispatch(&self, bytes: &[u8], direction: Direction) {
        if !self.accepted_by_all_filters(bytes) {
            self.stats.lock().record_drop();
            return;
        }

        self.buffer.write(bytes);
        self.stats.lock().record_event(bytes.len());

        let data = StreamData::new(
            self.stream_id,
            self.config.kind.clone(),
            self.config.source.as_source_string(),
            direction,
            bytes.to_vec(),
        );

        let sends = self.subscribers.iter().map(|entry| {
            let mailbox = entry.value().clone();
            let data = data.clone();
            async move {
                let _ = mailbox.send(data).await;
            }
        });

        if tokio::time::timeout(FAN_OUT_TIMEOUT, join_all(sends)).await.is_err() {
            warn!("fan-out for stream {} exceeded {FAN_OUT_TIMEOUT:?}; slow subscriber(s) skipped this chunk", self.stream_id);
        }
    }
}

pub struct StdioCapture {
    shared: Arc<Shared>,
    context: Mutex<Option<CaptureContext>>,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl StdioCapture {
    pub fn new(stream_id: StreamId, config: StreamConfig) -> Self {
        let capacity = config.capacity_bytes;
        Self {
            shared: Arc::new(Shared {
                stream_id,
                config,
                buffer: Arc::new(SmartBuffer::new(capacity)),
                filters: RwLock::new(Vec::new()),
                subscribers: DashMap::new(),
                status: AtomicU8::new(STATUS_CREATED),
                stats: Mutex::new(CaptureStats::default()),
            }),
            context: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    pub fn buffer(&self) -> Arc<SmartBuffer> {
        self.shared.buffer.clone()
    }

    async fn run_spawn(argv: Vec<String>, shared: Arc<Shared>, context: CaptureContext) -> DomainResult<()> {
        let pty = openpty(None, None).map_err(|e| DomainError::ResourceAcquisition(e.to_string()))?;
        let master: OwnedFd = pty.master;
        let slave: OwnedFd = pty.slave;

        let mut cmd = Command::new(argv.first().cloned().unwrap_or_default());
        if argv.len() > 1 {
            cmd.args(&argv[1..]);
        }
        let slave_fd = slave.as_raw_fd();
        unsafe {
            cmd.stdin(dup_as_stdio(slave_fd)?);
            cmd.stdout(dup_as_stdio(slave_fd)?);
            cmd.stderr(dup_as_stdio(slave_fd)?);
        }
        drop(slave);

        let mut child = cmd.spawn().map_err(|e| DomainError::ResourceAcquisition(e.to_string()))?;

        let master_fd = master.as_raw_fd();
        let mut master_file = unsafe { dup_as_async_file(master_fd)? };
        drop(master);

        let mut buf = [0u8; 8192];
        loop {
            if context.is_cancelled() {
                let _ = child.start_kill();
                break;
            }
            tokio::select! {
                result = master_file.read(&mut buf) => {
                    match result {
                        Ok(0) => break,
                        Ok(n) => shared.dispatch(&buf[..n], Direction::Outbound).await,
                        Err(e) => {
                            warn!("pty read error on stream {}: {e}", shared.stream_id);
                            break;
                        }
                    }
                }
                status = child.wait() => {
                    debug!("spawned child for stream {} exited: {status:?}", shared.stream_id);
                    break;
                }
            }
        }

        let _ = child.wait().await;
        Ok(())
    }

    async fn run_attach(pid: u32, shared: Arc<Shared>, context: CaptureContext) -> DomainResult<()> {
        kill(Pid::from_raw(pid as i32), None)
            .map_err(|e| DomainError::ResourceAcquisition(format!("process {pid} not accessible: {e}")))?;

        let mut cmd = Command::new("strace");
        cmd.args(["-f", "-e", "trace=read,write", "-s", "65536", "-p", &pid.to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| DomainError::ResourceAcquisition(e.to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DomainError::Internal("strace stderr missing".into()))?;
        let mut lines = BufReader::new(stderr).lines();

        loop {
            if context.is_cancelled() {
                let _ = child.start_kill();
                break;
            }
            tokio::select! {
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            if let Some(parsed) = SyscallTraceParser::parse_line(&line) {
                                let direction = if parsed.syscall == "read" { Direction::Inbound } else { Direction::Outbound };
                                shared.dispatch(&parsed.bytes, direction).await;
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            error!("error reading strace output for pid {pid}: {e}");
                            break;
                        }
                    }
                }
                status = child.wait() => {
                    debug!("strace for pid {pid} exited: {status:?}");
                    break;
                }
            }
        }

        let _ = child.wait().await;
        Ok(())
    }
}

unsafe fn dup_as_stdio(fd: i32) -> std::io::Result<Stdio> {
    let new_fd = libc::dup(fd);
    if new_fd < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(Stdio::from(std::fs::File::from_raw_fd(new_fd)))
}

unsafe fn dup_as_async_file(fd: i32) -> std::io::Result<tokio::fs::File> {
    let new_fd = libc::dup(fd);
    if new_fd < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(tokio::fs::File::from_std(std::fs::File::from_raw_fd(new_fd)))
}

#[async_trait]
impl Capture for StdioCapture {
    fn status(&self) -> CaptureStatus {
        match self.shared.status.load(Ordering::SeqCst) {
            STATUS_RUNNING => CaptureStatus::Running,
            STATUS_STOPPED => CaptureStatus::Stopped,
            _ => CaptureStatus::Created,
        }
    }

    async fn start(&self, context: CaptureContext) -> DomainResult<()> {
        if self
            .shared
            .status
            .compare_exchange(STATUS_CREATED, STATUS_RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(DomainError::AlreadyStarted);
        }

        *self.context.lock() = Some(context.clone());

        let source = self.shared.config.source.clone();
        let shared = self.shared.clone();

        let handle = tokio::spawn(async move {
            let result = match source {
                SourceDescriptor::Spawn { argv } => StdioCapture::run_spawn(argv, shared.clone(), context).await,
                SourceDescriptor::Attach { pid } => StdioCapture::run_attach(pid, shared.clone(), context).await,
            };
            if let Err(e) = result {
                error!("capture task for stream {} failed: {e}", shared.stream_id);
                shared.status.store(STATUS_STOPPED, Ordering::SeqCst);
            }
        });

        *self.task.lock() = Some(handle);
        Ok(())
    }

    async fn stop(&self, deadline: Duration) -> DomainResult<()> {
        if let Some(context) = self.context.lock().clone() {
            context.cancel();
        }
        self.shared.status.store(STATUS_STOPPED, Ordering::SeqCst);

        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            let _ = tokio::time::timeout(deadline, handle).await;
        }
        Ok(())
    }

    /// Spawns a bounded-mailbox task that drains `handler`'s chunks off the
    /// capture's hot path; `dispatch` only ever waits on the mailbox send,
    /// never on `handler` itself. Dropping the stored sender (on
    /// `unsubscribe`) ends the task once its mailbox drains.
    fn subscribe(&self, handler: SubscriberCallback) -> SubscriberId {
        let id = SubscriberId::new();
        let (tx, mut rx) = mpsc::channel::<StreamData>(SUBSCRIBER_MAILBOX_CAPACITY);
        tokio::spawn(async move {
            while let Some(data) = rx.recv().await {
                handler(data);
            }
        });
        self.shared.subscribers.insert(id.clone(), tx);
        id
    }

    fn unsubscribe(&self, id: &SubscriberId) -> DomainResult<()> {
        self.shared
            .subscribers
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DomainError::UnknownSubscriber(id.to_string()))
    }

    fn add_filter(&self, filter: Arc<dyn Filter>) {
        self.shared.filters.write().push(filter);
    }

    fn remove_filter(&self, name: &str) -> DomainResult<()> {
        let mut filters = self.shared.filters.write();
        let before = filters.len();
        filters.retain(|f| f.name() != name);
        if filters.len() == before {
            return Err(DomainError::UnknownFilter(name.to_string()));
        }
        Ok(())
    }

    fn stats(&self) -> CaptureStats {
        self.shared.stats.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentrystream_domain::entities::stream_config::StreamConfig;

    #[test]
    fn new_capture_starts_in_created_status() {
        let config = StreamConfig::stdio_spawn(vec!["/bin/true".into()], 4096);
        let capture = StdioCapture::new(StreamId::new(), config);
        assert_eq!(capture.status(), CaptureStatus::Created);
    }

    #[test]
    fn unsubscribing_an_unknown_id_is_an_error() {
        let config = StreamConfig::stdio_spawn(vec!["/bin/true".into()], 4096);
        let capture = StdioCapture::new(StreamId::new(), config);
        assert!(matches!(
            capture.unsubscribe(&SubscriberId::new()),
            Err(DomainError::UnknownSubscriber(_))
        ));
    }

    #[test]
    fn removing_an_unregistered_filter_is_an_error() {
        let config = StreamConfig::stdio_spawn(vec!["/bin/true".into()], 4096);
        let capture = StdioCapture::new(StreamId::new(), config);
        assert!(matches!(capture.remove_filter("nope"), Err(DomainError::UnknownFilter(_))));
    }
}
