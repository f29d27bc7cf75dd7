// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The Sink Layer (§4.7): pluggable `Sink` implementations, a destination
//! string parser, and the output format each sink encodes with.

pub mod console;
pub mod file;
pub mod format;
pub mod memory;
pub mod multi;
pub mod pipe;
pub mod tcp;
pub mod unix;

pub use console::ConsoleSink;
pub use file::FileSink;
pub use format::Format;
pub use memory::MemorySink;
pub use multi::MultiSink;
pub use pipe::PipeSink;
pub use tcp::TcpSink;
pub use unix::UnixSink;

use std::sync::Arc;

use sentrystream_domain::ports::Sink;
use sentrystream_domain::{DomainError, DomainResult};

/// Parses a `<kind>:<location>` destination string into a constructed
/// `Sink`. An empty string or `-` selects the console sink regardless of
/// kind (§4.7).
pub async fn build_sink(destination: &str, format: Format) -> DomainResult<Arc<dyn Sink>> {
    if destination.is_empty() || destination == "-" {
        return Ok(Arc::new(ConsoleSink::new(format)));
    }

    let (kind, location) = destination
        .split_once(':')
        .ok_or_else(|| DomainError::MalformedDestination(destination.to_string()))?;

    match kind {
        "file" => Ok(Arc::new(FileSink::new(location, format)?)),
        "tcp" => {
            let (host, port) = location
                .rsplit_once(':')
                .ok_or_else(|| DomainError::MalformedDestination(destination.to_string()))?;
            let port: u16 = port
                .parse()
                .map_err(|_| DomainError::MalformedDestination(destination.to_string()))?;
            Ok(Arc::new(TcpSink::connect(host, port, format).await?))
        }
        "unix" => Ok(Arc::new(UnixSink::connect(location, format).await?)),
        "pipe" => Ok(Arc::new(PipeSink::open(location, format)?)),
        "integration" => Err(DomainError::UnknownSinkKind(format!(
            "integration sinks are external collaborators, not a built-in kind: {location}"
        ))),
        other => Err(DomainError::UnknownSinkKind(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_destination_selects_console() {
        let sink = build_sink("", Format::Jsonl).await.unwrap();
        sink.close().await.unwrap();
    }

    #[tokio::test]
    async fn dash_destination_selects_console() {
        let sink = build_sink("-", Format::Jsonl).await.unwrap();
        sink.close().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_kind_is_rejected() {
        let err = build_sink("carrier-pigeon:loft", Format::Jsonl).await.unwrap_err();
        assert!(matches!(err, DomainError::UnknownSinkKind(_)));
    }

    #[tokio::test]
    async fn missing_colon_is_malformed() {
        let err = build_sink("nocolonhere", Format::Jsonl).await.unwrap_err();
        assert!(matches!(err, DomainError::MalformedDestination(_)));
    }
}
