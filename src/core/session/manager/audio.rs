//! The capture pump: microphone frames to the remote engine.
//!
//! Frames arrive as float PCM from the capture device's channel, are
//! converted to PCM16, and are forwarded while the talk-mode gate is open.
//! The conversion is O(frame size) with a single allocation per frame, so
//! the pump never falls behind a real-time capture rate.

use std::sync::atomic::Ordering;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::audio::AudioFrame;

use super::super::state::TalkMode;
use super::SessionContext;

pub(super) fn spawn_capture_pump(
    ctx: SessionContext,
    mut frames: mpsc::Receiver<Vec<f32>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!("capture pump started");

        while let Some(pcm) = frames.recv().await {
            if ctx.stopping.load(Ordering::Acquire) {
                break;
            }
            if !gate_open(&ctx) {
                // Muted: frames are dropped here, not buffered, so releasing
                // a hold never replays stale audio.
                continue;
            }

            let frame = AudioFrame::from_f32(&pcm, ctx.config.capture_rate);
            let send_result = {
                let mut engine = ctx.engine.write().await;
                engine.send_audio(frame).await
            };
            if let Err(e) = send_result {
                warn!("engine rejected captured audio: {e}");
            }
        }

        debug!("capture pump finished");
    })
}

fn gate_open(ctx: &SessionContext) -> bool {
    if !ctx.state.get().is_active() {
        return false;
    }
    match ctx.config.talk_mode {
        TalkMode::Continuous => true,
        TalkMode::PushToTalk => ctx.hold.is_engaged(),
    }
}
