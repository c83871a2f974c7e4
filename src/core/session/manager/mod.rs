//! Interaction session implementation.
//!
//! The session is the only component with externally visible state
//! transitions. It gates the capture path, consumes the engine's event
//! stream in arrival order, and wraps its own lifecycle with the duration
//! ledger. Split into focused submodules: lifecycle (start/stop), events
//! (the single update loop), audio (the capture pump), and hold
//! (push-to-talk).

mod audio;
mod events;
mod hold;
mod lifecycle;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use parking_lot::RwLock as SyncRwLock;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::core::capture::CaptureDevice;
use crate::core::engine::ConversationEngine;
use crate::core::quota::QuotaService;
use crate::core::relay::{ChunkRelay, RelayStats};
use crate::core::renderer::RendererSink;
use crate::core::resample::Resampler;

use super::callbacks::{SessionErrorCallback, StateChangeCallback, TranscriptCallback};
use super::config::SessionConfig;
use super::errors::SessionResult;
use super::ledger::DurationLedger;
use super::state::{HoldState, ResponseState, SessionState, StateCell};

/// One live voice interaction between a speaker and the remote engine.
///
/// Constructed per interaction and torn down with `stop()`; there is no
/// shared client reused across instances, so disposing the session releases
/// everything it acquired.
pub struct InteractionSession {
    pub(super) engine: Arc<RwLock<Box<dyn ConversationEngine>>>,
    pub(super) capture: Arc<RwLock<Box<dyn CaptureDevice>>>,
    pub(super) sink: Arc<dyn RendererSink>,
    pub(super) relay: Arc<ChunkRelay>,
    pub(super) resampler: Arc<Resampler>,

    pub(super) state: Arc<StateCell>,
    pub(super) hold: Arc<HoldState>,
    pub(super) response: Arc<ResponseState>,
    pub(super) ledger: Arc<DurationLedger>,
    pub(super) stopping: Arc<AtomicBool>,

    pub(super) event_task: Arc<SyncRwLock<Option<JoinHandle<()>>>>,
    pub(super) capture_task: Arc<SyncRwLock<Option<JoinHandle<()>>>>,

    pub(super) transcript_callback: Arc<SyncRwLock<Option<TranscriptCallback>>>,
    pub(super) state_callback: Arc<SyncRwLock<Option<StateChangeCallback>>>,
    pub(super) error_callback: Arc<SyncRwLock<Option<SessionErrorCallback>>>,

    pub(super) config: SessionConfig,
}

/// Context handed to the background tasks (event loop, capture pump, grace
/// timer) so they can reach the session internals without borrowing the
/// session itself.
#[derive(Clone)]
pub(super) struct SessionContext {
    pub(super) engine: Arc<RwLock<Box<dyn ConversationEngine>>>,
    pub(super) capture: Arc<RwLock<Box<dyn CaptureDevice>>>,
    pub(super) sink: Arc<dyn RendererSink>,
    pub(super) relay: Arc<ChunkRelay>,
    pub(super) resampler: Arc<Resampler>,
    pub(super) state: Arc<StateCell>,
    pub(super) hold: Arc<HoldState>,
    pub(super) response: Arc<ResponseState>,
    pub(super) ledger: Arc<DurationLedger>,
    pub(super) stopping: Arc<AtomicBool>,
    pub(super) event_task: Arc<SyncRwLock<Option<JoinHandle<()>>>>,
    pub(super) capture_task: Arc<SyncRwLock<Option<JoinHandle<()>>>>,
    pub(super) transcript_callback: Arc<SyncRwLock<Option<TranscriptCallback>>>,
    pub(super) state_callback: Arc<SyncRwLock<Option<StateChangeCallback>>>,
    pub(super) error_callback: Arc<SyncRwLock<Option<SessionErrorCallback>>>,
    pub(super) config: SessionConfig,
}

impl InteractionSession {
    /// Create a session from its four collaborators.
    ///
    /// Fails fast when the configured rate pair would require upsampling.
    pub fn new(
        config: SessionConfig,
        engine: Box<dyn ConversationEngine>,
        capture: Box<dyn CaptureDevice>,
        sink: Arc<dyn RendererSink>,
        quota: Arc<dyn QuotaService>,
    ) -> SessionResult<Self> {
        let resampler = Arc::new(Resampler::new(config.engine_rate, config.renderer_rate)?);

        let session_id = config
            .session_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let ledger = Arc::new(DurationLedger::new(
            quota,
            session_id,
            config.face_id.clone(),
        ));

        Ok(Self {
            engine: Arc::new(RwLock::new(engine)),
            capture: Arc::new(RwLock::new(capture)),
            relay: Arc::new(ChunkRelay::new(sink.clone())),
            sink,
            resampler,
            state: Arc::new(StateCell::new()),
            hold: Arc::new(HoldState::new()),
            response: Arc::new(ResponseState::new()),
            ledger,
            stopping: Arc::new(AtomicBool::new(false)),
            event_task: Arc::new(SyncRwLock::new(None)),
            capture_task: Arc::new(SyncRwLock::new(None)),
            transcript_callback: Arc::new(SyncRwLock::new(None)),
            state_callback: Arc::new(SyncRwLock::new(None)),
            error_callback: Arc::new(SyncRwLock::new(None)),
            config,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Identifier used in usage reports.
    pub fn session_id(&self) -> &str {
        self.ledger.session_id()
    }

    /// Relay delivery counters.
    pub fn relay_stats(&self) -> &RelayStats {
        self.relay.stats()
    }

    /// Number of audio frames queued but not yet delivered to the renderer.
    pub fn pending_frames(&self) -> usize {
        self.relay.pending()
    }

    /// True once the quota service has blocked further sessions.
    pub fn is_quota_blocked(&self) -> bool {
        self.ledger.is_blocked()
    }

    /// Register a callback for transcript fragments.
    pub fn on_transcript<F>(&self, callback: F)
    where
        F: Fn(
                crate::core::engine::SpeakerRole,
                String,
            ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
            + Send
            + Sync
            + 'static,
    {
        *self.transcript_callback.write() = Some(Arc::new(callback));
    }

    /// Register a callback for state transitions.
    pub fn on_state_change<F>(&self, callback: F)
    where
        F: Fn(SessionState) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
            + Send
            + Sync
            + 'static,
    {
        *self.state_callback.write() = Some(Arc::new(callback));
    }

    /// Register a callback for asynchronous session failures.
    pub fn on_error<F>(&self, callback: F)
    where
        F: Fn(
                super::errors::SessionError,
            ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
            + Send
            + Sync
            + 'static,
    {
        *self.error_callback.write() = Some(Arc::new(callback));
    }

    pub(super) fn context(&self) -> SessionContext {
        SessionContext {
            engine: Arc::clone(&self.engine),
            capture: Arc::clone(&self.capture),
            sink: Arc::clone(&self.sink),
            relay: Arc::clone(&self.relay),
            resampler: Arc::clone(&self.resampler),
            state: Arc::clone(&self.state),
            hold: Arc::clone(&self.hold),
            response: Arc::clone(&self.response),
            ledger: Arc::clone(&self.ledger),
            stopping: Arc::clone(&self.stopping),
            event_task: Arc::clone(&self.event_task),
            capture_task: Arc::clone(&self.capture_task),
            transcript_callback: Arc::clone(&self.transcript_callback),
            state_callback: Arc::clone(&self.state_callback),
            error_callback: Arc::clone(&self.error_callback),
            config: self.config.clone(),
        }
    }
}

impl SessionContext {
    pub(super) async fn notify_state(&self, state: SessionState) {
        let callback = self.state_callback.read().clone();
        if let Some(callback) = callback {
            callback(state).await;
        }
    }

    pub(super) async fn notify_error(&self, error: super::errors::SessionError) {
        let callback = self.error_callback.read().clone();
        if let Some(callback) = callback {
            callback(error).await;
        }
    }
}

// Compile-time assertion that InteractionSession is Send + Sync, relying on
// all fields being thread-safe.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    let _ = assert_send_sync::<InteractionSession>;
};
