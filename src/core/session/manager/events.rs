//! The session's single update loop over the engine's ordered event stream.
//!
//! All remote events flow through one channel and one consumer, so they are
//! processed strictly in arrival order. The engine does not promise an order
//! between `Interrupted` and `SpeechStopped` for the same utterance, so both
//! handlers only clear flags and queues; whichever arrives first wins and
//! the other becomes a no-op.

use std::sync::atomic::Ordering;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::audio::AudioFrame;
use crate::core::engine::{EngineEvent, SpeakerRole};

use super::super::errors::SessionError;
use super::super::state::SessionState;
use super::SessionContext;

pub(super) fn spawn_event_loop(
    ctx: SessionContext,
    mut events: mpsc::Receiver<EngineEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!("engine event loop started");

        while let Some(event) = events.recv().await {
            if ctx.stopping.load(Ordering::Acquire) {
                break;
            }
            match event {
                EngineEvent::ConversationUpdated {
                    role,
                    audio,
                    transcript,
                } => handle_conversation_updated(&ctx, role, audio, transcript).await,
                EngineEvent::Interrupted => handle_interrupted(&ctx).await,
                EngineEvent::SpeechStopped => handle_speech_stopped(&ctx).await,
            }
        }

        // Channel closed without a stop: the remote side went away. Run the
        // same teardown as an explicit stop.
        if !ctx.stopping.load(Ordering::Acquire) {
            warn!("remote engine disconnected; tearing session down");
            ctx.notify_error(SessionError::RemoteDisconnect).await;
            ctx.teardown(true).await;
        }

        debug!("engine event loop finished");
    })
}

async fn handle_conversation_updated(
    ctx: &SessionContext,
    role: SpeakerRole,
    audio: Option<AudioFrame>,
    transcript: Option<String>,
) {
    if let Some(text) = transcript {
        let callback = ctx.transcript_callback.read().clone();
        if let Some(callback) = callback {
            callback(role, text).await;
        }
    }

    let Some(delta) = audio else {
        return;
    };
    if role != SpeakerRole::Assistant {
        return;
    }

    ctx.response.mark_active();
    if ctx
        .state
        .transition(SessionState::ActiveListening, SessionState::ActiveSpeaking)
    {
        ctx.notify_state(SessionState::ActiveSpeaking).await;
    }

    let resampled = ctx.resampler.process(delta.samples());
    ctx.relay
        .push(AudioFrame::new(resampled, ctx.resampler.rate_out()));
}

/// Barge-in: discard everything queued, cancel the in-flight response, then
/// go back to listening. Duplicate interrupts find nothing queued and no
/// active response, and do nothing.
async fn handle_interrupted(ctx: &SessionContext) {
    let dropped = ctx.relay.discard_pending().await;

    if ctx.response.take_active() {
        let cancel_result = {
            let mut engine = ctx.engine.write().await;
            engine.cancel_response("interrupted").await
        };
        if let Err(e) = cancel_result {
            warn!("cancel of in-flight response failed: {e}");
        }
    } else if dropped == 0 {
        debug!("duplicate interrupt with nothing queued; ignoring");
    }

    if ctx
        .state
        .transition(SessionState::ActiveSpeaking, SessionState::ActiveListening)
    {
        ctx.notify_state(SessionState::ActiveListening).await;
    }
}

/// The assistant finished speaking on its own; queued audio keeps draining.
async fn handle_speech_stopped(ctx: &SessionContext) {
    ctx.response.clear();
    if ctx
        .state
        .transition(SessionState::ActiveSpeaking, SessionState::ActiveListening)
    {
        ctx.notify_state(SessionState::ActiveListening).await;
    }
}
