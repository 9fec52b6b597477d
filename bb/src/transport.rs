//! Chat transport collaborator
//!
//! The wire protocol lives outside this crate. The reconnect supervisor and the
//! companion notifier only need to know whether the session is up and how to
//! bring a new one up.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the chat transport
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connect failed: {0}")]
    Connect(String),

    #[error("Join failed for {channel}: {message}")]
    Join { channel: String, message: String },
}

/// A chat connection that can be re-established
#[async_trait]
pub trait Transport: Send + Sync {
    /// Whether a session is currently up
    fn is_live(&self) -> bool;

    /// Establish a fresh session under the given identity (nick)
    async fn connect(&self, identity: &str) -> Result<(), TransportError>;

    /// Join a channel on the current session
    async fn join(&self, channel: &str) -> Result<(), TransportError>;
}

/// Transport for one-shot CLI runs: never live, refuses to connect
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineTransport;

#[async_trait]
impl Transport for OfflineTransport {
    fn is_live(&self) -> bool {
        false
    }

    async fn connect(&self, identity: &str) -> Result<(), TransportError> {
        Err(TransportError::Connect(format!("offline, cannot connect as {}", identity)))
    }

    async fn join(&self, channel: &str) -> Result<(), TransportError> {
        Err(TransportError::Join {
            channel: channel.to_string(),
            message: "offline".to_string(),
        })
    }
}
