//! Ordered relay of resampled audio frames to the renderer sink.
//!
//! Single producer (the session's engine event loop), single consumer (the
//! drain task). Delivery order always equals push order, and a frame is
//! either delivered exactly once or explicitly discarded; the queue never
//! drops anything silently.
//!
//! `push` only enqueues and makes sure a drain is running; it never blocks
//! on the sink, so the event loop stays free to process a barge-in while
//! chunks are still queued. The drain is an explicit loop guarded by an
//! exclusivity flag: a push arriving while a drain is active never starts a
//! second one. The queue itself is behind a mutex so the same code stays
//! correct when producer and consumer live on different OS threads.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures::Future;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, warn};

use crate::core::audio::AudioFrame;
use crate::core::renderer::{RendererSink, SinkError};

/// Callback type for sink delivery failures
pub type DeliveryErrorCallback =
    Arc<dyn Fn(SinkError) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Delivery counters for monitoring and tests.
#[derive(Debug, Default)]
pub struct RelayStats {
    delivered: AtomicU64,
    discarded: AtomicU64,
}

impl RelayStats {
    /// Frames handed to the sink so far.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Frames dropped by explicit discard operations.
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }
}

struct RelayInner {
    sink: Arc<dyn RendererSink>,
    queue: Mutex<VecDeque<AudioFrame>>,
    draining: AtomicBool,
    stats: RelayStats,
    error_callback: RwLock<Option<DeliveryErrorCallback>>,
}

/// FIFO queue of audio frames awaiting delivery to the renderer sink.
pub struct ChunkRelay {
    inner: Arc<RelayInner>,
}

impl ChunkRelay {
    /// Create a relay delivering to `sink`.
    pub fn new(sink: Arc<dyn RendererSink>) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                sink,
                queue: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
                stats: RelayStats::default(),
                error_callback: RwLock::new(None),
            }),
        }
    }

    /// Register a callback invoked when sink delivery fails. The failing
    /// drain stops; undelivered frames stay queued for the owner to discard.
    pub fn on_delivery_error<F>(&self, callback: F)
    where
        F: Fn(SinkError) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static,
    {
        *self.inner.error_callback.write() = Some(Arc::new(callback));
    }

    /// Append a frame and make sure a drain is running.
    ///
    /// Never blocks on the sink. If a drain is already in progress this only
    /// enqueues; the running drain picks the frame up in order.
    pub fn push(&self, frame: AudioFrame) {
        self.inner.queue.lock().push_back(frame);
        self.ensure_drain();
    }

    fn ensure_drain(&self) {
        if self
            .inner
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            // A drain is already active; it will see the new frame.
            return;
        }
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.drain().await;
        });
    }

    /// Explicitly drop all queued-but-undelivered frames and clear the
    /// sink's playback buffer.
    ///
    /// This is the intentional, observable queue-clear used for barge-in and
    /// teardown, as opposed to losing frames.
    ///
    /// # Returns
    /// * `usize` - the number of frames discarded
    pub async fn discard_pending(&self) -> usize {
        let dropped = {
            let mut queue = self.inner.queue.lock();
            let dropped = queue.len();
            queue.clear();
            dropped
        };
        if dropped > 0 {
            debug!("discarded {dropped} undelivered audio frames");
        }
        self.inner
            .stats
            .discarded
            .fetch_add(dropped as u64, Ordering::Relaxed);

        if let Err(e) = self.inner.sink.clear_buffer().await {
            warn!("renderer buffer clear failed: {e}");
        }

        dropped
    }

    /// Number of frames currently awaiting delivery.
    pub fn pending(&self) -> usize {
        self.inner.queue.lock().len()
    }

    /// Delivery counters.
    pub fn stats(&self) -> &RelayStats {
        &self.inner.stats
    }
}

impl RelayInner {
    /// The single drain loop: pop in FIFO order until the queue is empty,
    /// then release the guard.
    async fn drain(self: Arc<Self>) {
        loop {
            let frame = self.queue.lock().pop_front();
            let Some(frame) = frame else {
                self.draining.store(false, Ordering::Release);
                // A frame pushed between our empty observation and the guard
                // release would otherwise sit until the next push.
                if self.queue.lock().is_empty() {
                    return;
                }
                if self
                    .draining
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    return;
                }
                continue;
            };

            if let Err(e) = self.sink.send_audio_data(frame.to_le_bytes()).await {
                error!("renderer delivery failed: {e}");
                self.draining.store(false, Ordering::Release);
                let callback = self.error_callback.read().clone();
                if let Some(callback) = callback {
                    callback(e).await;
                }
                return;
            }
            self.stats.delivered.fetch_add(1, Ordering::Relaxed);
        }
    }
}
