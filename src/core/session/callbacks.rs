//! Callback types for InteractionSession

use std::pin::Pin;
use std::sync::Arc;

use futures::Future;

use crate::core::engine::SpeakerRole;

use super::errors::SessionError;
use super::state::SessionState;

/// Callback type for transcript fragments from either speaker
pub type TranscriptCallback =
    Arc<dyn Fn(SpeakerRole, String) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Callback type for externally visible state transitions
pub type StateChangeCallback =
    Arc<dyn Fn(SessionState) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Callback type for asynchronous session failures (remote disconnect,
/// delivery errors) that cannot be returned from a method call
pub type SessionErrorCallback =
    Arc<dyn Fn(SessionError) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;
