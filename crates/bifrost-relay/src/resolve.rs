//! Resolution seam between the transform pipeline and the rich network.

use async_trait::async_trait;

/// A resolved user identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUser {
    pub name: String,
    /// Bot-authored messages are never relayed — another bridge or bot on
    /// the same channels would loop with us.
    pub is_bot: bool,
}

/// Failure to resolve an identity. The message being processed is dropped;
/// the relay loop continues.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("lookup failed for {id:?}: {reason}")]
    LookupFailed { id: String, reason: String },
}

/// Maps opaque network identifiers to display names.
///
/// Implementations cache: once resolved, a name is treated as stable for
/// the lifetime of the process.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Resolve a channel ID (e.g. `C024BE91L`) to its name, without the
    /// leading `#`.
    async fn channel_name(&self, id: &str) -> Result<String, DirectoryError>;

    /// Resolve a user ID (e.g. `U023BECGF`) to a display name.
    async fn user_name(&self, id: &str) -> Result<ResolvedUser, DirectoryError>;
}
