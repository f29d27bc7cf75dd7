// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! A fixed-capacity, mutex-guarded byte ring buffer. Writes past capacity
//! overwrite the oldest bytes; reads drain a snapshot without racing a
//! concurrent writer.

use parking_lot::Mutex;

struct Inner {
    data: Vec<u8>,
    capacity: usize,
    /// Index in `data` one past the most recently written byte.
    head: usize,
    len: usize,
    total_written: u64,
    total_dropped: u64,
}

/// Circular byte buffer shared across the capture read loop and any reader
/// that wants a consistent snapshot (the pipeline, a diagnostic dump).
pub struct RingBuffer {
    inner: Mutex<Inner>,
}

impl RingBuffer {
    /// A capacity of 0 is accepted: every write is silently discarded and
    /// the buffer stays permanently empty rather than panicking.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                data: vec![0u8; capacity],
                capacity,
                head: 0,
                len: 0,
                total_written: 0,
                total_dropped: 0,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends `bytes`, overwriting the oldest content if it would exceed
    /// capacity. Returns the number of bytes dropped to make room.
    pub fn write(&self, bytes: &[u8]) -> usize {
        let mut inner = self.inner.lock();
        let capacity = inner.capacity;

        if bytes.len() >= capacity {
            // The incoming chunk alone fills or overflows the buffer: keep
            // only its tail.
            let tail = &bytes[bytes.len() - capacity..];
            inner.data[..capacity].copy_from_slice(tail);
            let dropped = (bytes.len() - capacity) as u64 + inner.len as u64;
            inner.head = 0;
            inner.len = capacity;
            inner.total_written += bytes.len() as u64;
            inner.total_dropped += dropped;
            return dropped as usize;
        }

        let mut dropped = 0usize;
        let room = capacity - inner.len;
        if bytes.len() > room {
            dropped = bytes.len() - room;
        }

        for &b in bytes {
            let idx = inner.head;
            inner.data[idx] = b;
            inner.head = (inner.head + 1) % capacity;
            if inner.len < capacity {
                inner.len += 1;
            }
        }
        inner.total_written += bytes.len() as u64;
        inner.total_dropped += dropped as u64;
        dropped
    }

    /// Returns a linear copy of the buffer's current contents, oldest byte
    /// first.
    pub fn snapshot(&self) -> Vec<u8> {
        let inner = self.inner.lock();
        if inner.len == 0 {
            return Vec::new();
        }
        let start = (inner.head + inner.capacity - inner.len) % inner.capacity;
        let mut out = Vec::with_capacity(inner.len);
        for i in 0..inner.len {
            out.push(inner.data[(start + i) % inner.capacity]);
        }
        out
    }

    pub fn total_written(&self) -> u64 {
        self.inner.lock().total_written
    }

    pub fn total_dropped(&self) -> u64 {
        self.inner.lock().total_dropped
    }

    /// Copies the most recent `buf.len()` bytes (or fewer, if the buffer
    /// holds less) into `buf`, oldest-first, without draining them.
    /// Returns the number of bytes copied.
    pub fn read(&self, buf: &mut [u8]) -> usize {
        let inner = self.inner.lock();
        let n = buf.len().min(inner.len);
        if n == 0 {
            return 0;
        }
        let skip = inner.len - n;
        let start = (inner.head + inner.capacity - inner.len + skip) % inner.capacity;
        for i in 0..n {
            buf[i] = inner.data[(start + i) % inner.capacity];
        }
        n
    }

    /// Random access: copies up to `buf.len()` bytes starting at logical
    /// `offset` (0 = oldest byte currently held) into `buf`. Returns the
    /// number of bytes copied, which is 0 when `offset` is at or past the
    /// end of the held content.
    pub fn read_at(&self, buf: &mut [u8], offset: usize) -> usize {
        let inner = self.inner.lock();
        if offset >= inner.len {
            return 0;
        }
        let n = buf.len().min(inner.len - offset);
        let base = (inner.head + inner.capacity - inner.len) % inner.capacity.max(1);
        for i in 0..n {
            buf[i] = inner.data[(base + offset + i) % inner.capacity];
        }
        n
    }

    /// Discards all currently held content; capacity and lifetime
    /// counters are unaffected.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.head = 0;
        inner.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_under_capacity_preserve_order() {
        let rb = RingBuffer::new(8);
        rb.write(b"abc");
        rb.write(b"de");
        assert_eq!(rb.snapshot(), b"abcde");
    }

    #[test]
    fn writes_over_capacity_retain_only_the_newest_bytes() {
        let rb = RingBuffer::new(4);
        let dropped = rb.write(b"abcdef");
        assert_eq!(dropped, 2);
        assert_eq!(rb.snapshot(), b"cdef");
    }

    #[test]
    fn wrap_around_across_multiple_writes_stays_in_order() {
        let rb = RingBuffer::new(4);
        rb.write(b"ab");
        rb.write(b"cd");
        rb.write(b"ef");
        assert_eq!(rb.snapshot(), b"cdef");
        assert_eq!(rb.total_dropped(), 2);
    }

    #[test]
    fn empty_buffer_snapshot_is_empty() {
        let rb = RingBuffer::new(16);
        assert!(rb.is_empty());
        assert_eq!(rb.snapshot(), Vec::<u8>::new());
    }

    #[test]
    fn zero_capacity_buffer_discards_every_write_without_panicking() {
        let rb = RingBuffer::new(0);
        let dropped = rb.write(b"abcdef");
        assert_eq!(dropped, 6);
        assert_eq!(rb.len(), 0);
        assert!(rb.snapshot().is_empty());
    }

    #[test]
    fn read_returns_the_most_recent_bytes() {
        let rb = RingBuffer::new(4);
        rb.write(b"abcdef");
        let mut buf = [0u8; 3];
        let n = rb.read(&mut buf);
        assert_eq!(n, 3);
        assert_eq!(&buf, b"def");
    }

    #[test]
    fn read_at_supports_random_access_into_the_held_window() {
        let rb = RingBuffer::new(8);
        rb.write(b"abcdef");
        let mut buf = [0u8; 2];
        assert_eq!(rb.read_at(&mut buf, 2), 2);
        assert_eq!(&buf, b"cd");
        assert_eq!(rb.read_at(&mut buf, 5), 1);
        assert_eq!(&buf[..1], b"f");
        assert_eq!(rb.read_at(&mut buf, 6), 0);
    }

    #[test]
    fn reset_empties_the_buffer_but_keeps_lifetime_counters() {
        let rb = RingBuffer::new(4);
        rb.write(b"abcdef");
        rb.reset();
        assert!(rb.is_empty());
        assert_eq!(rb.total_written(), 6);
        assert_eq!(rb.total_dropped(), 2);
    }
}
