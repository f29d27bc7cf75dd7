// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! In-memory append-only sink, used by tests and by the multi-sink fan-out
//! scenario that needs a destination immune to a slow downstream consumer
//! (§4.7, §8 scenario 5).

use parking_lot::Mutex;

use async_trait::async_trait;

use sentrystream_domain::aggregates::alert::Alert;
use sentrystream_domain::aggregates::event::Event;
use sentrystream_domain::ports::Sink;
use sentrystream_domain::DomainResult;

#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
    alerts: Mutex<Vec<Alert>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().clone()
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn write_event(&self, event: &Event) -> DomainResult<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }

    async fn write_alert(&self, alert: &Alert) -> DomainResult<()> {
        self.alerts.lock().push(alert.clone());
        Ok(())
    }

    async fn close(&self) -> DomainResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentrystream_domain::value_objects::enums::{Direction, EventKind};
    use sentrystream_domain::value_objects::severity::Severity;

    #[tokio::test]
    async fn retains_everything_written() {
        let sink = MemorySink::new();
        let event = Event::new(EventKind::Write, Direction::Outbound, 2, "curl", 1, b"body");
        sink.write_event(&event).await.unwrap();
        let alert = Alert::new(Severity::Critical, "c", "p", "t", "d", 2, "curl", b"evidence", true);
        sink.write_alert(&alert).await.unwrap();

        assert_eq!(sink.events().len(), 1);
        assert_eq!(sink.alerts().len(), 1);
    }
}
