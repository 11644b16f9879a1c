// src/capture.rs

//! Bounded capture of a child's output stream.
//!
//! A [`CaptureBuffer`] behaves like a ring buffer: it keeps the trailing
//! `capacity` bytes of everything appended and silently drops the oldest
//! bytes on overflow. Long-running jobs therefore use constant memory, and
//! what survives is the most recent (and usually most diagnostic) output.
//!
//! The buffer has no internal locking. The process runner's pump task owns it
//! while the child runs and hands it back through its join handle once the
//! stream is finished, so reads never overlap writes.

use std::collections::VecDeque;

/// Default retention per stream.
pub const DEFAULT_CAPACITY: usize = 640 * 1024;

#[derive(Debug, Clone)]
pub struct CaptureBuffer {
    capacity: usize,
    data: VecDeque<u8>,
    total_written: u64,
}

impl CaptureBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            data: VecDeque::with_capacity(capacity.min(64 * 1024)),
            total_written: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Total number of bytes ever appended, retained or not.
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Whether some of the appended bytes have already been dropped.
    pub fn overflowed(&self) -> bool {
        self.total_written > self.data.len() as u64
    }

    /// Append bytes, dropping from the front when capacity is exceeded.
    pub fn append(&mut self, bytes: &[u8]) {
        self.total_written += bytes.len() as u64;

        if bytes.len() >= self.capacity {
            // The chunk alone fills the buffer; only its tail survives.
            self.data.clear();
            self.data.extend(&bytes[bytes.len() - self.capacity..]);
            return;
        }

        let overflow = (self.data.len() + bytes.len()).saturating_sub(self.capacity);
        if overflow > 0 {
            self.data.drain(..overflow);
        }
        self.data.extend(bytes);
    }

    /// Copy of the currently retained bytes, oldest first.
    pub fn snapshot(&self) -> Vec<u8> {
        let (front, back) = self.data.as_slices();
        let mut out = Vec::with_capacity(self.data.len());
        out.extend_from_slice(front);
        out.extend_from_slice(back);
        out
    }

    /// Consume the buffer, returning the retained bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        Vec::from(self.data)
    }
}

impl Default for CaptureBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
