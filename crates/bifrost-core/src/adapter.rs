use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::types::InboundEvent;

/// Errors surfaced by a protocol adapter.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The underlying transport could not be established.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The network rejected the supplied credentials or token.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// A message could not be delivered to the remote endpoint.
    #[error("Send failed: {0}")]
    SendFailed(String),
}

/// Common interface implemented by both network adapters (IRC, Slack).
///
/// `start` owns the connection handshake and hands back the inbound event
/// stream; the relay engine never sees protocol frames, only
/// [`InboundEvent`]s. Sends take the sender's display name so adapters that
/// can impersonate (Slack) do, and the rest ignore it.
#[async_trait]
pub trait ChatAdapter: Send + Sync {
    /// Stable lowercase identifier ("irc", "slack"); used in logs.
    fn network(&self) -> &str;

    /// Connect and return the inbound event stream.
    ///
    /// A failure here is fatal to the whole relay — there is no retry.
    async fn start(&mut self) -> Result<mpsc::Receiver<InboundEvent>, AdapterError>;

    /// Deliver a plain message to `target` on behalf of `sender`.
    async fn send_message(&self, target: &str, sender: &str, text: &str)
        -> Result<(), AdapterError>;

    /// Deliver a `/me`-style action to `target` on behalf of `sender`.
    async fn send_action(&self, target: &str, sender: &str, text: &str)
        -> Result<(), AdapterError>;

    /// Tear the connection down. Idempotent; no further events follow.
    async fn stop(&self);
}
