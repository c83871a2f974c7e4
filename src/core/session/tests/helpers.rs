//! Shared test helpers for InteractionSession tests.

use std::sync::Arc;
use std::time::Duration;

use crate::core::audio::AudioFrame;
use crate::core::engine::{EngineEvent, SpeakerRole};
use crate::core::session::config::SessionConfig;
use crate::core::session::manager::InteractionSession;
use crate::core::session::state::TalkMode;

use super::stubs::{CaptureHooks, EngineHooks, RecordingSink, StubCapture, StubEngine, StubQuota};

/// A session wired to stub collaborators, plus the hooks to drive them.
pub struct SessionHarness {
    pub session: InteractionSession,
    pub engine: Arc<EngineHooks>,
    pub capture: Arc<CaptureHooks>,
    pub sink: Arc<RecordingSink>,
    pub quota: Arc<StubQuota>,
}

/// Build a harness with a non-blocking sink.
pub fn harness(talk_mode: TalkMode) -> SessionHarness {
    harness_with(talk_mode, RecordingSink::open())
}

/// Build a harness around a caller-provided sink (e.g. a gated one).
pub fn harness_with(talk_mode: TalkMode, sink: Arc<RecordingSink>) -> SessionHarness {
    let mut config = SessionConfig::new(talk_mode, "face-test");
    config.session_id = Some("session-test".to_string());

    let (engine, engine_hooks) = StubEngine::new();
    let (capture, capture_hooks) = StubCapture::new();
    let quota = StubQuota::new();

    let session = InteractionSession::new(
        config,
        Box::new(engine),
        Box::new(capture),
        sink.clone(),
        quota.clone(),
    )
    .expect("session construction failed");

    SessionHarness {
        session,
        engine: engine_hooks,
        capture: capture_hooks,
        sink,
        quota,
    }
}

/// Poll until `predicate` holds, failing the test after a timeout.
pub async fn wait_until<F>(what: &str, predicate: F)
where
    F: Fn() -> bool,
{
    let result = tokio::time::timeout(Duration::from_secs(10), async {
        while !predicate() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await;
    assert!(result.is_ok(), "timed out waiting for: {what}");
}

/// An assistant audio delta of `samples` PCM16 samples at the engine rate.
pub fn assistant_delta(samples: usize) -> EngineEvent {
    EngineEvent::ConversationUpdated {
        role: SpeakerRole::Assistant,
        audio: Some(AudioFrame::new(vec![1000i16; samples], 24_000)),
        transcript: None,
    }
}

/// A transcript-only conversation update.
pub fn transcript_update(role: SpeakerRole, text: &str) -> EngineEvent {
    EngineEvent::ConversationUpdated {
        role,
        audio: None,
        transcript: Some(text.to_string()),
    }
}

/// One 10 ms capture frame of float PCM at 24 kHz.
pub fn capture_frame() -> Vec<f32> {
    vec![0.25f32; 240]
}
