// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # StreamData
//!
//! An immutable snapshot handed from a Capture to its subscribers (§3).
//! `StreamData::new` always takes ownership of a fresh `Vec<u8>` copy — the
//! read loop's reusable buffer must never be retained past the call that
//! produced this value (§3 invariant, §8 "does not alias the read buffer").

use std::collections::HashMap;
use std::time::SystemTime;

use serde_json::Value;

use crate::value_objects::enums::Direction;
use crate::value_objects::ids::StreamId;

#[derive(Debug, Clone)]
pub struct StreamData {
    pub stream_id: StreamId,
    pub kind: super::stream_config::StreamKind,
    pub source: String,
    pub direction: Direction,
    pub captured_at: SystemTime,
    data: Vec<u8>,
    pub metadata: HashMap<String, Value>,
}

impl StreamData {
    pub fn new(
        stream_id: StreamId,
        kind: super::stream_config::StreamKind,
        source: impl Into<String>,
        direction: Direction,
        data: Vec<u8>,
    ) -> Self {
        Self {
            stream_id,
            kind,
            source: source.into(),
            direction,
            captured_at: SystemTime::now(),
            data,
            metadata: HashMap::new(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::stream_config::StreamKind;

    #[test]
    fn owns_a_copy_independent_of_its_source() {
        let mut buf = vec![1u8, 2, 3];
        let data = StreamData::new(StreamId::new(), StreamKind::Stdio, "test", Direction::Inbound, buf.clone());
        buf[0] = 99;
        assert_eq!(data.data(), &[1, 2, 3]);
    }
}
