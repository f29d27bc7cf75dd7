// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The `Capture` port (§4.4): the control contract every stream transport
//! implements. Kept free of any async-runtime type so the domain crate
//! stays runtime-agnostic — the engine crate's `StdioCapture` drives this
//! trait with Tokio underneath.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::entities::stats::CaptureStats;
use crate::entities::stream_data::StreamData;
use crate::error::DomainResult;
use crate::value_objects::enums::CaptureStatus;
use crate::value_objects::ids::SubscriberId;

/// Cooperative cancellation handle threaded through a capture's read loop.
/// `cancel()` is idempotent; `is_cancelled()` is cheap enough to poll
/// between every blocking primitive per §5's "no more than one blocking
/// primitive between cancellation checks".
#[derive(Clone, Default)]
pub struct CaptureContext {
    cancelled: Arc<AtomicBool>,
}

impl CaptureContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A subscriber is identified by id and held only as a callback — the
/// Capture's subscriber table must never retain a strong reference back to
/// whatever owns the callback (§9's cyclic-reference note).
pub type SubscriberCallback = Box<dyn Fn(StreamData) + Send + Sync>;

#[async_trait]
pub trait Capture: Send + Sync {
    fn status(&self) -> CaptureStatus;

    /// Fails with `DomainError::AlreadyStarted` if already running.
    async fn start(&self, context: CaptureContext) -> DomainResult<()>;

    /// Idempotent: returns `Ok(())` even if already stopped. Must return
    /// within `deadline` or the caller force-terminates (§5, default 5s).
    async fn stop(&self, deadline: Duration) -> DomainResult<()>;

    fn subscribe(&self, handler: SubscriberCallback) -> SubscriberId;

    /// Fails without side effects if `id` is unknown (§3).
    fn unsubscribe(&self, id: &SubscriberId) -> DomainResult<()>;

    fn add_filter(&self, filter: Arc<dyn crate::ports::filter::Filter>);

    fn remove_filter(&self, name: &str) -> DomainResult<()>;

    fn stats(&self) -> CaptureStats;
}
