//! Tests for InteractionSession
//!
//! Organized into modules:
//! - `basic`: creation, configuration, and callback registration
//! - `lifecycle`: start/stop legality, rollback paths, idempotent teardown
//! - `interruption`: barge-in queue clearing and cancellation
//! - `ptt`: push-to-talk hold, grace delay, and finalize guard
//! - `ledger`: duration accounting and quota enforcement
//!
//! Shared utilities live in `helpers` and `stubs`.

mod helpers;
mod stubs;
