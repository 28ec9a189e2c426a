//! crates/news_digest_core/src/ports.rs
//!
//! Defines the service contracts (traits) the client core depends on.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! core independent of the HTTP backend, the durable store, and the speech engine.

use async_trait::async_trait;

use crate::domain::{
    ActivityEvent, AuthReply, Credentials, Digest, Preferences, UserId, Voice,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (network, disk, TTS).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("Server responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Could not decode response: {0}")]
    Decode(String),
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The news backend, reached over HTTP.
#[async_trait]
pub trait NewsApi: Send + Sync {
    /// Creates an account. Application-level rejections come back in `AuthReply::error`.
    async fn register(&self, credentials: &Credentials) -> PortResult<AuthReply>;

    /// Logs in. On success `AuthReply::user_id` is set.
    async fn login(&self, credentials: &Credentials) -> PortResult<AuthReply>;

    /// Reports one interaction. The response body carries nothing the client uses.
    async fn record_activity(&self, event: &ActivityEvent) -> PortResult<()>;

    /// Fetches the digest. Any non-success status is an error.
    async fn fetch_digest(&self, preferences: &Preferences) -> PortResult<Digest>;
}

/// Durable storage for the signed-in user's identifier.
pub trait SessionStore: Send + Sync {
    fn get(&self) -> PortResult<Option<UserId>>;
    fn set(&self, user_id: &UserId) -> PortResult<()>;
    fn clear(&self) -> PortResult<()>;
}

/// Text-to-speech capability.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Finds a voice for a language code, if the engine has one.
    fn resolve_voice(&self, lang: &str) -> Option<Voice>;

    /// Speaks `text` once. Concurrent calls are allowed to overlap.
    async fn speak(&self, text: &str, voice: &Voice) -> PortResult<()>;
}
