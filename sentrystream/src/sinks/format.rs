// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Output encodings a sink can be configured with (§4.7). `Cef` only has a
//! defined encoding for alerts; events still fall back to a JSON line since
//! the format has no event record of its own.

use std::str::FromStr;

use sentrystream_domain::aggregates::alert::Alert;
use sentrystream_domain::aggregates::event::Event;
use sentrystream_domain::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Jsonl,
    Cef,
}

impl FromStr for Format {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Format::Json),
            "jsonl" => Ok(Format::Jsonl),
            "cef" => Ok(Format::Cef),
            other => Err(DomainError::InvalidConfiguration(format!("unknown sink format: {other}"))),
        }
    }
}

impl Format {
    pub fn encode_event(self, event: &Event) -> DomainResult<String> {
        Ok(event.to_json_line()?)
    }

    pub fn encode_alert(self, alert: &Alert) -> DomainResult<String> {
        match self {
            Format::Cef => Ok(alert.to_cef()),
            Format::Json | Format::Jsonl => Ok(alert.to_json_line()?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_formats() {
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("jsonl".parse::<Format>().unwrap(), Format::Jsonl);
        assert_eq!("cef".parse::<Format>().unwrap(), Format::Cef);
    }

    #[test]
    fn rejects_unknown_format() {
        assert!("xml".parse::<Format>().is_err());
    }
}
