//! Growable linear byte buffer used by the async pipeline
//!
//! One contiguous arena with independent read and write cursors. The buffer
//! never wraps: consumed space is reclaimed only when the reader catches up
//! with the writer, at which point both cursors return to zero.
//!
//! Growth is exponential below [`THRESHOLD_BUFFER_SIZE`] and linear
//! ([`INCREMENT_BUFFER_SIZE`] per step) above it, always clamped to the
//! ceiling given at construction or through [`GrowableBuffer::set_max_capacity`].

use std::cmp::{max, min};

/// Initial arena size (bounded by the ceiling)
pub const DEFAULT_BUFFER_SIZE: usize = 10 * 1024 * 1024;
/// Below this size the arena doubles on growth
pub const THRESHOLD_BUFFER_SIZE: usize = 80 * 1024 * 1024;
/// Above the threshold the arena grows by this much per step
pub const INCREMENT_BUFFER_SIZE: usize = 10 * 1024 * 1024;
/// Default ceiling for async loggers
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 200 * 1024 * 1024;

#[derive(Debug)]
pub struct GrowableBuffer {
    data: Vec<u8>,
    reader: usize,
    writer: usize,
    max_capacity: usize,
}

impl GrowableBuffer {
    /// Create a buffer whose arena may grow up to `max_capacity` bytes
    pub fn new(max_capacity: usize) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, max_capacity)
    }

    /// Create a buffer with an explicit starting arena size
    pub fn with_capacity(initial: usize, max_capacity: usize) -> Self {
        let max_capacity = max(1, max_capacity);
        Self {
            data: vec![0; min(initial, max_capacity)],
            reader: 0,
            writer: 0,
            max_capacity,
        }
    }

    /// Append `bytes` at the write cursor, growing the arena if needed.
    ///
    /// Returns `false` without touching any state when the request cannot
    /// fit even after growing to the ceiling.
    pub fn push(&mut self, bytes: &[u8]) -> bool {
        if bytes.len() > self.max_capacity {
            return false;
        }
        self.ensure_capacity(bytes.len());
        if self.writable_capacity() < bytes.len() {
            return false;
        }
        self.data[self.writer..self.writer + bytes.len()].copy_from_slice(bytes);
        self.writer += bytes.len();
        true
    }

    /// Bytes written but not yet consumed
    pub fn readable(&self) -> &[u8] {
        &self.data[self.reader..self.writer]
    }

    pub fn readable_len(&self) -> usize {
        self.writer - self.reader
    }

    /// Free space after the write cursor without growing
    pub fn writable_capacity(&self) -> usize {
        self.data.len() - self.writer
    }

    /// Free space after the write cursor, for callers that fill it directly
    /// and then commit with [`advance_write`](Self::advance_write)
    pub fn writable_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.writer..]
    }

    /// Mark `n` readable bytes as consumed.
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds the readable length.
    pub fn advance_read(&mut self, n: usize) {
        assert!(
            n <= self.readable_len(),
            "advance_read({}) past readable length {}",
            n,
            self.readable_len()
        );
        self.reader += n;
        if self.reader == self.writer {
            self.reset();
        }
    }

    /// Commit `n` bytes written through [`writable_mut`](Self::writable_mut).
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds the writable capacity.
    pub fn advance_write(&mut self, n: usize) {
        assert!(
            n <= self.writable_capacity(),
            "advance_write({}) past writable capacity {}",
            n,
            self.writable_capacity()
        );
        self.writer += n;
    }

    /// Drop all content, keeping the arena allocated
    pub fn reset(&mut self) {
        self.reader = 0;
        self.writer = 0;
    }

    /// Exchange arena, cursors and ceiling with `other` without copying bytes
    pub fn swap(&mut self, other: &mut GrowableBuffer) {
        std::mem::swap(self, other);
    }

    pub fn is_empty(&self) -> bool {
        self.reader == self.writer
    }

    /// Currently allocated arena size
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Change the growth ceiling. An arena already larger than the new
    /// ceiling is kept as is; only future growth is limited.
    pub fn set_max_capacity(&mut self, max_capacity: usize) {
        self.max_capacity = max(1, max_capacity);
    }

    fn ensure_capacity(&mut self, need: usize) {
        let threshold = max(1, min(THRESHOLD_BUFFER_SIZE, self.max_capacity));
        let increment = max(1, min(INCREMENT_BUFFER_SIZE, self.max_capacity));

        while self.writable_capacity() < need && self.data.len() < self.max_capacity {
            let current = self.data.len();
            let mut new_size = if current < threshold {
                min(max(current * 2, 1), threshold)
            } else {
                current + increment
            };
            new_size = max(new_size, self.writer + need);
            new_size = min(new_size, self.max_capacity);

            if new_size <= current {
                break;
            }
            self.data.resize(new_size, 0);
        }
    }
}

impl Default for GrowableBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BUFFER_SIZE)
    }
}
