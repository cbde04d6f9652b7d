use thiserror::Error;

use bifrost_core::adapter::AdapterError;

/// Errors produced by the relay core.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A bridge pair string had no `:` separator. Fatal at startup.
    #[error("malformed bridge pair {pair:?} (expected \"slack-channel:irc-channel\")")]
    BadBridgePair { pair: String },

    /// A channel was named on either side of two different pairs.
    #[error("channel {channel:?} is bridged twice")]
    DuplicateChannel { channel: String },

    /// The emoji table file could not be read or parsed.
    #[error("emoji table {path:?}: {reason}")]
    EmojiTable { path: String, reason: String },

    /// An adapter failed to start. The engine never entered Running.
    #[error("{network} adapter failed to start: {cause}")]
    Startup {
        network: &'static str,
        cause: AdapterError,
    },

    /// The network rejected our credentials while the relay was running.
    #[error("fatal authentication failure on {network}: {reason}")]
    FatalAuth {
        network: &'static str,
        reason: String,
    },
}
