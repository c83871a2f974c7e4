//! Push-to-talk hold handling.
//!
//! Engaging the hold opens the capture gate; releasing it keeps the gate
//! open for a short grace delay so trailing speech is not truncated, then
//! closes the gate and issues exactly one finalize-turn request to the
//! engine. The grace timer is superseded by teardown.

use tracing::{debug, warn};

use super::super::errors::{SessionError, SessionResult};
use super::super::state::TalkMode;
use super::InteractionSession;

impl InteractionSession {
    /// Engage the push-to-talk hold and start streaming capture.
    ///
    /// Rejected while a previous hold is still finalizing, outside
    /// push-to-talk mode, or when the session is not active.
    pub fn begin_hold(&self) -> SessionResult<()> {
        if self.config.talk_mode != TalkMode::PushToTalk {
            return Err(SessionError::InvalidState(
                "hold signals only apply to push-to-talk mode".to_string(),
            ));
        }
        if !self.state.get().is_active() {
            return Err(SessionError::InvalidState(
                "session is not active".to_string(),
            ));
        }
        if self.hold.is_finalizing() {
            return Err(SessionError::InvalidState(
                "previous hold is still finalizing".to_string(),
            ));
        }

        self.hold.engage();
        debug!("push-to-talk hold engaged");
        Ok(())
    }

    /// Release the hold.
    ///
    /// Capture keeps streaming for the configured grace delay, then the gate
    /// closes and one finalize-turn request is issued. Releasing an
    /// unengaged hold, or releasing twice, is a no-op.
    pub fn end_hold(&self) -> SessionResult<()> {
        if self.config.talk_mode != TalkMode::PushToTalk {
            return Err(SessionError::InvalidState(
                "hold signals only apply to push-to-talk mode".to_string(),
            ));
        }
        if !self.hold.is_engaged() {
            return Ok(());
        }
        if !self.hold.begin_finalize() {
            // Release already in flight for this hold.
            return Ok(());
        }

        let ctx = self.context();
        let grace = self.config.release_grace();
        debug!(grace_ms = grace.as_millis() as u64, "hold released; finalizing after grace");

        let handle = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            ctx.hold.disengage();

            let finalize_result = {
                let mut engine = ctx.engine.write().await;
                engine.create_response().await
            };
            if let Err(e) = finalize_result {
                warn!("finalize turn failed: {e}");
            }

            ctx.hold.end_finalize();
        });
        self.hold.set_grace_task(handle);

        Ok(())
    }
}
