// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! A `RingBuffer` paired with a runtime-adjustable context window. The
//! window starts at `ThreatLevel::Low` and only ever grows: raising the
//! threat level widens how far back `get_context` is willing to look, but
//! a later drop in threat level never shrinks it back down, so a
//! quieted-down stream still keeps the context that justified the earlier
//! alert.

use std::sync::atomic::{AtomicUsize, Ordering};

use sentrystream_domain::value_objects::Severity;

use crate::buffer::ring_buffer::RingBuffer;

pub const WINDOW_LOW: usize = 4 * 1024;
pub const WINDOW_MEDIUM: usize = 16 * 1024;
pub const WINDOW_HIGH: usize = 64 * 1024;
pub const WINDOW_CRITICAL: usize = 256 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    fn window_bytes(self) -> usize {
        match self {
            ThreatLevel::Low => WINDOW_LOW,
            ThreatLevel::Medium => WINDOW_MEDIUM,
            ThreatLevel::High => WINDOW_HIGH,
            ThreatLevel::Critical => WINDOW_CRITICAL,
        }
    }
}

/// Multi-resolution capture buffer: `ring` holds the raw tail of the
/// stream, `window_bytes` tracks how far back `get_context` may reach, and
/// `peak_severity` records the highest severity seen since the last reset.
pub struct SmartBuffer {
    ring: RingBuffer,
    window_bytes: AtomicUsize,
    peak_severity: parking_lot::Mutex<Severity>,
}

impl SmartBuffer {
    pub fn new(ring_capacity: usize) -> Self {
        Self {
            ring: RingBuffer::new(ring_capacity),
            window_bytes: AtomicUsize::new(WINDOW_LOW),
            peak_severity: parking_lot::Mutex::new(Severity::None),
        }
    }

    pub fn write(&self, bytes: &[u8]) -> usize {
        self.ring.write(bytes)
    }

    pub fn snapshot(&self) -> Vec<u8> {
        self.ring.snapshot()
    }

    pub fn window_bytes(&self) -> usize {
        self.window_bytes.load(Ordering::Acquire)
    }

    /// Widens the context window to at least `level`'s size. A level whose
    /// window is no larger than the one already in effect is a no-op, so
    /// the window never shrinks.
    pub fn raise_threat_level(&self, level: ThreatLevel) {
        self.window_bytes.fetch_max(level.window_bytes(), Ordering::AcqRel);
    }

    /// Records that a finding of `severity` was detected; the peak is
    /// updated monotonically until `reset_peak_severity` is called.
    pub fn record_finding(&self, severity: Severity) {
        let mut peak = self.peak_severity.lock();
        if severity > *peak {
            *peak = severity;
        }
    }

    pub fn peak_severity(&self) -> Severity {
        *self.peak_severity.lock()
    }

    /// Clears the recorded peak severity, e.g. after an operator
    /// acknowledges an alert. The context window is untouched.
    pub fn reset_peak_severity(&self) {
        *self.peak_severity.lock() = Severity::None;
    }

    /// Returns a contiguous snapshot anchored `before` bytes back from the
    /// most recent byte held within the current context window, extending
    /// `after` bytes further if that much is available. Bytes older than
    /// the window are never returned even if the underlying ring still
    /// holds them: the window is what the current threat level considers
    /// relevant.
    pub fn get_context(&self, before: usize, after: usize) -> Vec<u8> {
        let total = self.ring.len();
        let window = self.window_bytes().min(total);
        let window_start = total - window;
        let anchor = window_start + window.saturating_sub(before);
        let want = before.saturating_add(after).min(total.saturating_sub(anchor));

        let mut buf = vec![0u8; want];
        let n = self.ring.read_at(&mut buf, anchor);
        buf.truncate(n);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_is_monotonic_until_reset() {
        let sb = SmartBuffer::new(1024);
        sb.record_finding(Severity::Low);
        sb.record_finding(Severity::High);
        sb.record_finding(Severity::Medium);
        assert_eq!(sb.peak_severity(), Severity::High);

        sb.reset_peak_severity();
        assert_eq!(sb.peak_severity(), Severity::None);
    }

    #[test]
    fn ring_write_is_independent_of_peak_tracking() {
        let sb = SmartBuffer::new(8);
        sb.write(b"hello");
        assert_eq!(sb.snapshot(), b"hello");
        assert_eq!(sb.peak_severity(), Severity::None);
    }

    #[test]
    fn raising_threat_level_only_ever_grows_the_window() {
        let sb = SmartBuffer::new(1024 * 1024);
        assert_eq!(sb.window_bytes(), WINDOW_LOW);

        sb.raise_threat_level(ThreatLevel::High);
        assert_eq!(sb.window_bytes(), WINDOW_HIGH);

        sb.raise_threat_level(ThreatLevel::Medium);
        assert_eq!(sb.window_bytes(), WINDOW_HIGH, "a lower level must not shrink the window");

        sb.raise_threat_level(ThreatLevel::Critical);
        assert_eq!(sb.window_bytes(), WINDOW_CRITICAL);
    }

    #[test]
    fn get_context_returns_bytes_anchored_before_the_present() {
        let sb = SmartBuffer::new(64);
        sb.write(b"0123456789");
        // the window (WINDOW_LOW) is far larger than the 10 bytes held, so
        // the whole buffer is in play.
        let ctx = sb.get_context(4, 2);
        assert_eq!(ctx, b"6789");
    }

    #[test]
    fn get_context_clamps_to_what_is_actually_held() {
        let sb = SmartBuffer::new(64);
        sb.write(b"abc");
        let ctx = sb.get_context(10, 10);
        assert_eq!(ctx, b"abc");
    }
}
