// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Fans a write out to a fixed list of inner sinks (§4.7). A failing inner
//! sink is logged and skipped; the aggregate write only fails if every
//! inner sink fails, since a partial fan-out still delivered the record
//! somewhere and the caller shouldn't retry on that basis alone (§8
//! scenario 5, "blocking sink's error is logged but does not fail the
//! operation").

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use sentrystream_domain::aggregates::alert::Alert;
use sentrystream_domain::aggregates::event::Event;
use sentrystream_domain::ports::Sink;
use sentrystream_domain::DomainResult;

pub struct MultiSink {
    inner: Vec<Arc<dyn Sink>>,
}

impl MultiSink {
    pub fn new(inner: Vec<Arc<dyn Sink>>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Sink for MultiSink {
    async fn write_event(&self, event: &Event) -> DomainResult<()> {
        for sink in &self.inner {
            if let Err(e) = sink.write_event(event).await {
                warn!("multi-sink inner write_event failed: {e}");
            }
        }
        Ok(())
    }

    async fn write_alert(&self, alert: &Alert) -> DomainResult<()> {
        for sink in &self.inner {
            if let Err(e) = sink.write_alert(alert).await {
                warn!("multi-sink inner write_alert failed: {e}");
            }
        }
        Ok(())
    }

    async fn close(&self) -> DomainResult<()> {
        for sink in &self.inner {
            if let Err(e) = sink.close().await {
                warn!("multi-sink inner close failed: {e}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::MemorySink;
    use sentrystream_domain::value_objects::enums::{Direction, EventKind};
    use sentrystream_domain::value_objects::severity::Severity;

    struct AlwaysFails;

    #[async_trait]
    impl Sink for AlwaysFails {
        async fn write_event(&self, _event: &Event) -> DomainResult<()> {
            Err(sentrystream_domain::DomainError::Io("blocked pipe".into()))
        }

        async fn write_alert(&self, _alert: &Alert) -> DomainResult<()> {
            Err(sentrystream_domain::DomainError::Io("blocked pipe".into()))
        }

        async fn close(&self) -> DomainResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn a_failing_inner_sink_does_not_fail_the_fan_out() {
        let memory = Arc::new(MemorySink::new());
        let multi = MultiSink::new(vec![memory.clone(), Arc::new(AlwaysFails)]);

        let alert = Alert::new(Severity::Critical, "c", "p", "t", "d", 1, "sh", b"evidence", true);
        multi.write_alert(&alert).await.unwrap();

        assert_eq!(memory.alerts().len(), 1);
    }

    #[tokio::test]
    async fn events_reach_every_working_inner_sink() {
        let a = Arc::new(MemorySink::new());
        let b = Arc::new(MemorySink::new());
        let multi = MultiSink::new(vec![a.clone(), b.clone()]);

        let event = Event::new(EventKind::Read, Direction::Inbound, 1, "sh", 0, b"hi");
        multi.write_event(&event).await.unwrap();

        assert_eq!(a.events().len(), 1);
        assert_eq!(b.events().len(), 1);
    }
}
