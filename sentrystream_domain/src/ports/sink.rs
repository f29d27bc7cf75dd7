// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The `Sink` port (§4.7): an infrastructure port that remains async since
//! it is I/O-bound, following the same "ports stay async" convention the
//! domain layer uses for file and repository access.

use async_trait::async_trait;

use crate::aggregates::alert::Alert;
use crate::aggregates::event::Event;
use crate::error::DomainResult;

#[async_trait]
pub trait Sink: Send + Sync {
    async fn write_event(&self, event: &Event) -> DomainResult<()>;
    async fn write_alert(&self, alert: &Alert) -> DomainResult<()>;
    async fn close(&self) -> DomainResult<()>;
}
