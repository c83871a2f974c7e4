//! Session lifecycle: start, stop, and the shared idempotent teardown path.

use std::sync::atomic::Ordering;

use tracing::{debug, info, warn};

use crate::core::capture::CaptureError;

use super::super::errors::{SessionError, SessionResult};
use super::super::state::SessionState;
use super::{InteractionSession, SessionContext, audio, events};

impl InteractionSession {
    /// Start the session: acquire the capture device, connect the remote
    /// engine, start the renderer sink, and begin relaying.
    ///
    /// Only legal from `Idle`; any other state is rejected without side
    /// effects. Permission denial and connect failure both leave the session
    /// back in `Idle` so the caller may retry.
    pub async fn start(&self) -> SessionResult<()> {
        if self.ledger.is_blocked() {
            return Err(SessionError::QuotaExceeded);
        }

        if !self
            .state
            .transition(SessionState::Idle, SessionState::Connecting)
        {
            return Err(SessionError::InvalidState(format!(
                "start() is only legal from Idle (currently {:?})",
                self.state.get()
            )));
        }
        self.stopping.store(false, Ordering::Release);
        info!(mode = ?self.config.talk_mode, "starting interaction session");

        // Capture device first; denial surfaces immediately, no retry.
        let capture_result = {
            let mut capture = self.capture.write().await;
            capture.open().await
        };
        let capture_rx = match capture_result {
            Ok(rx) => rx,
            Err(CaptureError::PermissionDenied(msg)) => {
                self.state.set(SessionState::Idle);
                return Err(SessionError::PermissionDenied(msg));
            }
            Err(e) => {
                self.state.set(SessionState::Idle);
                return Err(e.into());
            }
        };

        // Remote engine next; failure rolls the capture device back.
        let connect_result = {
            let mut engine = self.engine.write().await;
            engine.connect().await
        };
        let event_rx = match connect_result {
            Ok(rx) => rx,
            Err(e) => {
                if let Err(close_err) = self.capture.write().await.close().await {
                    debug!("capture close after failed connect: {close_err}");
                }
                self.state.set(SessionState::Idle);
                return Err(SessionError::RemoteConnectFailure(e.to_string()));
            }
        };

        if let Err(e) = self.sink.start().await {
            if let Err(close_err) = self.capture.write().await.close().await {
                debug!("capture close after failed sink start: {close_err}");
            }
            if let Err(disc_err) = self.engine.write().await.disconnect().await {
                debug!("engine disconnect after failed sink start: {disc_err}");
            }
            self.state.set(SessionState::Idle);
            return Err(e.into());
        }

        self.ledger.mark_start();
        self.state.set(SessionState::ActiveListening);

        // A delivery failure tears the session down like any other fatal
        // connection-level error.
        let error_ctx = self.context();
        self.relay.on_delivery_error(move |e| {
            let ctx = error_ctx.clone();
            Box::pin(async move {
                ctx.notify_error(e.into()).await;
                ctx.teardown(false).await;
            })
        });

        let ctx = self.context();
        ctx.notify_state(SessionState::ActiveListening).await;
        *self.event_task.write() = Some(events::spawn_event_loop(ctx.clone(), event_rx));
        *self.capture_task.write() = Some(audio::spawn_capture_pump(ctx, capture_rx));

        info!("interaction session active");
        Ok(())
    }

    /// Stop the session from any trigger.
    ///
    /// Teardown is idempotent; a repeated stop changes nothing and reports
    /// zero engaged seconds.
    ///
    /// # Returns
    /// * `u64` - the engaged seconds flushed to the quota service
    pub async fn stop(&self) -> u64 {
        self.context().teardown(false).await
    }

    /// Best-effort release for page teardown: cancel all tasks synchronously
    /// and fire the unconfirmed usage beacon. No response is awaited.
    pub fn release_on_unload(&self) {
        if self.stopping.swap(true, Ordering::AcqRel) {
            return;
        }
        warn!("releasing session on unload; usage report is best-effort");
        self.hold.reset();
        if let Some(handle) = self.capture_task.write().take() {
            handle.abort();
        }
        if let Some(handle) = self.event_task.write().take() {
            handle.abort();
        }
        self.state.set(SessionState::Stopped);
        self.ledger.flush_detached();
    }

    /// Re-arm the session after the caller re-validated the customer's
    /// quota externally. Clears the quota block and returns a stopped
    /// session to `Idle` so `start()` becomes legal again.
    pub fn revalidate(&self) {
        self.ledger.revalidate();
        if self
            .state
            .transition(SessionState::Stopped, SessionState::Idle)
        {
            debug!("session re-validated; start() unblocked");
        }
    }
}

impl SessionContext {
    /// The one teardown path shared by explicit stop, remote disconnect,
    /// delivery failure, and quota enforcement.
    ///
    /// Order: grace timer, capture, renderer sink, engine connection, queued
    /// frames. Every step is safe when the resource was never acquired or
    /// was already released.
    pub(super) async fn teardown(&self, from_event_loop: bool) -> u64 {
        if self.stopping.swap(true, Ordering::AcqRel) {
            debug!("teardown already ran; nothing left to release");
            return self.ledger.flush().await;
        }

        self.hold.reset();

        if let Some(handle) = self.capture_task.write().take() {
            handle.abort();
        }
        if let Err(e) = self.capture.write().await.close().await {
            debug!("capture close during teardown: {e}");
        }

        if let Err(e) = self.sink.close().await {
            debug!("renderer close during teardown: {e}");
        }

        if let Err(e) = self.engine.write().await.disconnect().await {
            debug!("engine disconnect during teardown: {e}");
        }

        self.relay.discard_pending().await;
        self.response.clear();

        if !from_event_loop {
            if let Some(handle) = self.event_task.write().take() {
                handle.abort();
            }
        }

        let previous = self.state.set(SessionState::Stopped);
        if previous != SessionState::Stopped {
            self.notify_state(SessionState::Stopped).await;
        }

        let added_seconds = self.ledger.flush().await;
        info!(added_seconds, "interaction session stopped");
        added_seconds
    }
}
