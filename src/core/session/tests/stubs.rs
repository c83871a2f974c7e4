//! Stub collaborators for testing InteractionSession in isolation.
//!
//! Each stub exposes a shared hooks handle with atomic call tracking so
//! tests can both drive the session (emit engine events, feed capture
//! frames) and observe what the session did to its collaborators.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore, mpsc};

use crate::core::audio::AudioFrame;
use crate::core::capture::{CaptureDevice, CaptureError};
use crate::core::engine::{
    ConversationEngine, EVENT_CHANNEL_CAPACITY, EngineError, EngineEvent, EngineResult,
};
use crate::core::quota::{QuotaError, QuotaReceipt, QuotaService, UsageReport};
use crate::core::renderer::{RendererSink, SinkError};

/// Tracking handles shared between a `StubEngine` and the test body.
#[derive(Default)]
pub struct EngineHooks {
    event_tx: Mutex<Option<mpsc::Sender<EngineEvent>>>,
    pub connect_count: AtomicUsize,
    pub disconnect_count: AtomicUsize,
    pub send_audio_count: AtomicUsize,
    pub create_response_count: AtomicUsize,
    pub cancel_reasons: Mutex<Vec<String>>,
    pub fail_connect: AtomicBool,
}

impl EngineHooks {
    /// Emit an event into the session's ordered event stream.
    pub async fn emit(&self, event: EngineEvent) {
        let tx = self.event_tx.lock().clone();
        tx.expect("engine not connected")
            .send(event)
            .await
            .expect("event channel closed");
    }

    /// Simulate an unexpected remote disconnect by dropping the sender.
    pub fn close_channel(&self) {
        self.event_tx.lock().take();
    }

    pub fn cancel_count(&self) -> usize {
        self.cancel_reasons.lock().len()
    }
}

/// Stub engine that records every call and hands events through hooks.
pub struct StubEngine {
    hooks: Arc<EngineHooks>,
    connected: AtomicBool,
}

impl StubEngine {
    pub fn new() -> (Self, Arc<EngineHooks>) {
        let hooks = Arc::new(EngineHooks::default());
        (
            Self {
                hooks: hooks.clone(),
                connected: AtomicBool::new(false),
            },
            hooks,
        )
    }
}

#[async_trait]
impl ConversationEngine for StubEngine {
    async fn connect(&mut self) -> EngineResult<mpsc::Receiver<EngineEvent>> {
        self.hooks.connect_count.fetch_add(1, Ordering::SeqCst);
        if self.hooks.fail_connect.load(Ordering::SeqCst) {
            return Err(EngineError::ConnectionFailed(
                "stub connect failure".to_string(),
            ));
        }
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        *self.hooks.event_tx.lock() = Some(tx);
        self.connected.store(true, Ordering::SeqCst);
        Ok(rx)
    }

    async fn disconnect(&mut self) -> EngineResult<()> {
        self.hooks.disconnect_count.fetch_add(1, Ordering::SeqCst);
        self.hooks.event_tx.lock().take();
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send_audio(&mut self, _frame: AudioFrame) -> EngineResult<()> {
        self.hooks.send_audio_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn create_response(&mut self) -> EngineResult<()> {
        self.hooks
            .create_response_count
            .fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn cancel_response(&mut self, reason: &str) -> EngineResult<()> {
        self.hooks.cancel_reasons.lock().push(reason.to_string());
        Ok(())
    }
}

/// Tracking handles shared between a `StubCapture` and the test body.
#[derive(Default)]
pub struct CaptureHooks {
    frame_tx: Mutex<Option<mpsc::Sender<Vec<f32>>>>,
    pub open_count: AtomicUsize,
    pub close_count: AtomicUsize,
    pub deny_permission: AtomicBool,
}

impl CaptureHooks {
    /// Feed one float PCM frame into the capture stream.
    pub async fn feed(&self, frame: Vec<f32>) {
        let tx = self.frame_tx.lock().clone();
        tx.expect("capture not open")
            .send(frame)
            .await
            .expect("capture channel closed");
    }

    pub fn is_open(&self) -> bool {
        self.frame_tx.lock().is_some()
    }
}

/// Stub capture device yielding frames from the test body.
pub struct StubCapture {
    hooks: Arc<CaptureHooks>,
}

impl StubCapture {
    pub fn new() -> (Self, Arc<CaptureHooks>) {
        let hooks = Arc::new(CaptureHooks::default());
        (
            Self {
                hooks: hooks.clone(),
            },
            hooks,
        )
    }
}

#[async_trait]
impl CaptureDevice for StubCapture {
    async fn open(&mut self) -> Result<mpsc::Receiver<Vec<f32>>, CaptureError> {
        if self.hooks.deny_permission.load(Ordering::SeqCst) {
            return Err(CaptureError::PermissionDenied(
                "microphone access denied".to_string(),
            ));
        }
        let (tx, rx) = mpsc::channel(32);
        *self.hooks.frame_tx.lock() = Some(tx);
        self.hooks.open_count.fetch_add(1, Ordering::SeqCst);
        Ok(rx)
    }

    async fn close(&mut self) -> Result<(), CaptureError> {
        self.hooks.close_count.fetch_add(1, Ordering::SeqCst);
        self.hooks.frame_tx.lock().take();
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        24_000
    }
}

/// Recording renderer sink; each delivery can be held open on a semaphore
/// permit so tests can pile frames up behind an active drain.
pub struct RecordingSink {
    pub sent: Mutex<Vec<Bytes>>,
    pub gate: Semaphore,
    pub entered: Notify,
    pub start_count: AtomicUsize,
    pub close_count: AtomicUsize,
    pub clear_count: AtomicUsize,
}

impl RecordingSink {
    /// A sink that never blocks.
    pub fn open() -> Arc<Self> {
        let sink = Self::gated();
        sink.gate.add_permits(Semaphore::MAX_PERMITS);
        sink
    }

    /// A sink that blocks every delivery until a permit is added.
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            gate: Semaphore::new(0),
            entered: Notify::new(),
            start_count: AtomicUsize::new(0),
            close_count: AtomicUsize::new(0),
            clear_count: AtomicUsize::new(0),
        })
    }

    pub fn delivered(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl RendererSink for RecordingSink {
    async fn start(&self) -> Result<(), SinkError> {
        self.start_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send_audio_data(&self, data: Bytes) -> Result<(), SinkError> {
        self.entered.notify_one();
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| SinkError::InternalError(e.to_string()))?;
        permit.forget();
        self.sent.lock().push(data);
        Ok(())
    }

    async fn clear_buffer(&self) -> Result<(), SinkError> {
        self.clear_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Stub quota service with a scriptable validity flag.
pub struct StubQuota {
    pub reports: Mutex<Vec<UsageReport>>,
    pub detached: Mutex<Vec<UsageReport>>,
    pub validity: AtomicU8,
    pub fail_next: AtomicBool,
}

impl StubQuota {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            reports: Mutex::new(Vec::new()),
            detached: Mutex::new(Vec::new()),
            validity: AtomicU8::new(1),
            fail_next: AtomicBool::new(false),
        })
    }

    pub fn report_count(&self) -> usize {
        self.reports.lock().len()
    }
}

#[async_trait]
impl QuotaService for StubQuota {
    async fn report(&self, usage: UsageReport) -> Result<QuotaReceipt, QuotaError> {
        self.reports.lock().push(usage);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(QuotaError::NetworkError("stub network failure".to_string()));
        }
        Ok(QuotaReceipt {
            validity_flag: self.validity.load(Ordering::SeqCst),
        })
    }

    fn report_detached(&self, usage: UsageReport) {
        self.detached.lock().push(usage);
    }
}
