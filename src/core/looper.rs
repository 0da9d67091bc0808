//! Double-buffered async pipeline
//!
//! Producers append whole lines to the producer buffer under one mutex. A
//! single drain thread waits for data, swaps the producer buffer with its own
//! consumer buffer (an O(1) handle exchange, no byte copy), releases the lock
//! and hands the consumer contents to the delivery callback. Sink I/O
//! therefore never runs while the producer lock is held.
//!
//! ```text
//! push() ──lock──▶ [producer] ◀──swap──▶ [consumer] ──callback──▶ sinks
//!                       ▲  space_ready        │ data_ready
//!                       └─────────────────────┘
//! ```
//!
//! When the producer buffer is at its ceiling, `push` blocks on
//! `space_ready` until the drain thread swaps. A request larger than the
//! ceiling fails immediately with `CapacityExceeded`. After `stop` every
//! push fails with `PipelineClosed`; bytes pushed before `stop` are still
//! delivered before the drain thread exits.

use super::buffer::GrowableBuffer;
use super::error::{LoggerError, Result};
use super::metrics::LoggerMetrics;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Receives the contents of each swapped buffer on the drain thread
pub type DeliveryCallback = Box<dyn FnMut(&[u8]) + Send + 'static>;

struct ProducerSide {
    buffer: GrowableBuffer,
    /// Ceiling applied to both buffers
    max_capacity: usize,
    /// Successful pushes so far
    pushed: u64,
    /// Value of `pushed` covered by the last batch whose callback returned
    delivered: u64,
}

struct Shared {
    producer: Mutex<ProducerSide>,
    data_ready: Condvar,
    space_ready: Condvar,
    idle: Condvar,
    running: AtomicBool,
    metrics: Arc<LoggerMetrics>,
}

pub struct DualBufferLoop {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DualBufferLoop {
    /// Start a loop whose buffers may each grow to `max_capacity` bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the drain thread cannot be spawned
    pub fn new(max_capacity: usize, callback: DeliveryCallback) -> Result<Self> {
        Self::with_metrics(max_capacity, Arc::new(LoggerMetrics::new()), callback)
    }

    /// Start a loop that records block, swap and rejection events into `metrics`
    pub fn with_metrics(
        max_capacity: usize,
        metrics: Arc<LoggerMetrics>,
        callback: DeliveryCallback,
    ) -> Result<Self> {
        let producer = GrowableBuffer::new(max_capacity);
        let consumer = GrowableBuffer::new(max_capacity);
        let shared = Arc::new(Shared {
            producer: Mutex::new(ProducerSide {
                max_capacity: producer.max_capacity(),
                buffer: producer,
                pushed: 0,
                delivered: 0,
            }),
            data_ready: Condvar::new(),
            space_ready: Condvar::new(),
            idle: Condvar::new(),
            running: AtomicBool::new(true),
            metrics,
        });

        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("dualbuf-drain".to_string())
            .spawn(move || Self::drain(worker_shared, consumer, callback))
            .map_err(|e| {
                LoggerError::io_operation("spawn drain thread", "thread creation failed", e)
            })?;

        Ok(Self {
            shared,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Append one complete line to the producer buffer.
    ///
    /// Blocks while the producer buffer is full and the drain thread has not
    /// swapped yet.
    ///
    /// # Errors
    ///
    /// - `CapacityExceeded` if `bytes` is larger than the ceiling
    /// - `PipelineClosed` if the loop was stopped before or while waiting
    pub fn push(&self, bytes: &[u8]) -> Result<()> {
        let mut side = self.shared.producer.lock();
        let mut blocked = false;
        loop {
            if !self.shared.running.load(Ordering::Acquire) {
                self.shared.metrics.record_rejected();
                return Err(LoggerError::PipelineClosed);
            }
            let max = side.buffer.max_capacity();
            if bytes.len() > max {
                self.shared.metrics.record_rejected();
                return Err(LoggerError::capacity_exceeded(bytes.len(), max));
            }
            if side.buffer.push(bytes) {
                side.pushed += 1;
                self.shared.data_ready.notify_one();
                return Ok(());
            }
            if !blocked {
                self.shared.metrics.record_block();
                blocked = true;
            }
            self.shared.space_ready.wait(&mut side);
        }
    }

    /// Change the ceiling of both buffers. Already allocated arenas are not
    /// shrunk; a raised ceiling wakes producers waiting for space.
    pub fn set_max_buffer_size(&self, max_capacity: usize) {
        let mut side = self.shared.producer.lock();
        side.buffer.set_max_capacity(max_capacity);
        side.max_capacity = side.buffer.max_capacity();
        self.shared.space_ready.notify_all();
    }

    pub fn max_buffer_size(&self) -> usize {
        self.shared.producer.lock().max_capacity
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    pub fn metrics(&self) -> &Arc<LoggerMetrics> {
        &self.shared.metrics
    }

    /// Block until everything pushed before this call has been handed to the
    /// callback and the callback returned. Pushes made by other threads while
    /// waiting are not waited for. Returns immediately once stopped.
    ///
    /// Must not be called from inside the delivery callback.
    pub fn wait_idle(&self) {
        let mut side = self.shared.producer.lock();
        let target = side.pushed;
        while self.shared.running.load(Ordering::Acquire) && side.delivered < target {
            self.shared.idle.wait(&mut side);
        }
    }

    /// Stop the loop and join the drain thread after it delivered the
    /// remaining bytes.
    ///
    /// Only the first caller performs the stop and returns `true`; any later
    /// or concurrent call returns `false` immediately.
    pub fn stop(&self) -> bool {
        if self
            .shared
            .running
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        {
            let _side = self.shared.producer.lock();
            self.shared.space_ready.notify_all();
            self.shared.data_ready.notify_all();
            self.shared.idle.notify_all();
        }

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            // Stopped from inside the delivery callback: the thread exits on its own
            if handle.thread().id() == thread::current().id() {
                return true;
            }
            if let Err(e) = handle.join() {
                eprintln!("[LOGGER ERROR] Drain thread panicked during shutdown: {:?}", e);
            }
        }
        true
    }

    fn drain(shared: Arc<Shared>, mut consumer: GrowableBuffer, mut callback: DeliveryCallback) {
        let mut swapped = 0;
        loop {
            {
                let mut side = shared.producer.lock();
                if side.delivered != swapped {
                    side.delivered = swapped;
                    shared.idle.notify_all();
                }
                while side.buffer.is_empty() && shared.running.load(Ordering::Acquire) {
                    shared.data_ready.wait(&mut side);
                }
                if side.buffer.is_empty() {
                    // Stopped and fully drained
                    shared.idle.notify_all();
                    break;
                }
                consumer.set_max_capacity(side.max_capacity);
                side.buffer.swap(&mut consumer);
                swapped = side.pushed;
                shared.metrics.record_swap();
                shared.space_ready.notify_all();
            }

            let delivered = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                callback(consumer.readable())
            }));
            if let Err(panic_info) = delivered {
                eprintln!(
                    "[LOGGER CRITICAL] Delivery callback panicked: {}. \
                     {} bytes lost, drain thread continues.",
                    panic_message(panic_info.as_ref()),
                    consumer.readable_len()
                );
            }
            consumer.reset();
        }
    }
}

impl Drop for DualBufferLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Extract a printable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
