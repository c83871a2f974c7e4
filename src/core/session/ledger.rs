//! Session-duration accounting against the external usage quota.
//!
//! The ledger wraps the session lifecycle, not the audio path: `mark_start`
//! on session start, `flush` on any stop trigger. Taking the start marker
//! and reporting are mutually exclusive, so an interval is never counted
//! twice; an interval lost to a network failure or an ungraceful process
//! exit is a documented gap, not a retried one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::core::quota::{QuotaService, UsageReport};

/// Measures engaged seconds per session and reports them to the quota
/// service.
pub struct DurationLedger {
    service: Arc<dyn QuotaService>,
    session_id: String,
    face_id: String,
    started_at: Mutex<Option<Instant>>,
    blocked: AtomicBool,
}

impl DurationLedger {
    /// Create a ledger reporting under the given identifiers.
    pub fn new(
        service: Arc<dyn QuotaService>,
        session_id: impl Into<String>,
        face_id: impl Into<String>,
    ) -> Self {
        Self {
            service,
            session_id: session_id.into(),
            face_id: face_id.into(),
            started_at: Mutex::new(None),
            blocked: AtomicBool::new(false),
        }
    }

    /// The session identifier used in usage reports.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Record the start instant of an engaged interval.
    pub fn mark_start(&self) {
        *self.started_at.lock() = Some(Instant::now());
    }

    /// Take the start marker and compute whole elapsed seconds.
    ///
    /// Clearing the marker before reporting is what makes a repeated stop
    /// report zero instead of double counting.
    fn take_elapsed_seconds(&self) -> Option<u64> {
        self.started_at
            .lock()
            .take()
            .map(|started| started.elapsed().as_secs())
    }

    /// Flush the current interval: emit exactly one usage report and apply
    /// the service's quota verdict.
    ///
    /// # Returns
    /// * `u64` - the reported engaged seconds (0 when no interval was open)
    pub async fn flush(&self) -> u64 {
        let Some(added_seconds) = self.take_elapsed_seconds() else {
            return 0;
        };

        let usage = UsageReport {
            session_id: self.session_id.clone(),
            face_id: self.face_id.clone(),
            added_seconds,
        };

        match self.service.report(usage).await {
            Ok(receipt) if !receipt.is_valid() => {
                info!(
                    session_id = %self.session_id,
                    "quota service rejected the session; blocking restart"
                );
                self.blocked.store(true, Ordering::Release);
            }
            Ok(_) => {
                debug!(added_seconds, "usage interval flushed");
            }
            Err(e) => {
                // Not retried; this interval's seconds are dropped.
                warn!(added_seconds, "usage flush failed: {e}");
            }
        }

        added_seconds
    }

    /// Best-effort flush for page teardown: the report is fired without
    /// awaiting or confirming a response.
    pub fn flush_detached(&self) {
        let Some(added_seconds) = self.take_elapsed_seconds() else {
            return;
        };
        self.service.report_detached(UsageReport {
            session_id: self.session_id.clone(),
            face_id: self.face_id.clone(),
            added_seconds,
        });
    }

    /// True once the quota service has flagged the customer as exhausted.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::Acquire)
    }

    /// Clear the quota block after the caller re-validated externally.
    pub fn revalidate(&self) {
        self.blocked.store(false, Ordering::Release);
    }
}
