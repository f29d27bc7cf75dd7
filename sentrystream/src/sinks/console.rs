// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Line-delimited JSON (or CEF) to stdout, the default sink when no
//! destination is configured (§4.7).

use async_trait::async_trait;
use parking_lot::Mutex;
use std::io::{self, Write};

use sentrystream_domain::aggregates::alert::Alert;
use sentrystream_domain::aggregates::event::Event;
use sentrystream_domain::ports::Sink;
use sentrystream_domain::DomainResult;

use super::format::Format;

pub struct ConsoleSink {
    format: Format,
    stdout: Mutex<io::Stdout>,
}

impl ConsoleSink {
    pub fn new(format: Format) -> Self {
        Self { format, stdout: Mutex::new(io::stdout()) }
    }
}

#[async_trait]
impl Sink for ConsoleSink {
    async fn write_event(&self, event: &Event) -> DomainResult<()> {
        let line = self.format.encode_event(event)?;
        let mut out = self.stdout.lock();
        let _ = writeln!(out, "{line}");
        Ok(())
    }

    async fn write_alert(&self, alert: &Alert) -> DomainResult<()> {
        let line = self.format.encode_alert(alert)?;
        let mut out = self.stdout.lock();
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
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
    async fn writes_without_error() {
        let sink = ConsoleSink::new(Format::Jsonl);
        let event = Event::new(EventKind::Read, Direction::Inbound, 1, "sh", 0, b"hi");
        sink.write_event(&event).await.unwrap();
        let alert = Alert::new(Severity::High, "c", "p", "t", "d", 1, "sh", b"evidence", false);
        sink.write_alert(&alert).await.unwrap();
        sink.close().await.unwrap();
    }
}
