//! Cached identity resolution backed by the Slack Web API.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use bifrost_relay::resolve::{Directory, DirectoryError, ResolvedUser};

use crate::client::SlackClient;

/// [`Directory`] implementation with process-lifetime caches.
///
/// Names are cached on first successful lookup and never invalidated.
/// Mutation only ever happens on the relay task; the mutexes exist so the
/// trait object is `Sync`, not because there is contention.
pub struct SlackDirectory {
    client: SlackClient,
    users: Mutex<HashMap<String, ResolvedUser>>,
    channels: Mutex<HashMap<String, String>>,
}

impl SlackDirectory {
    pub fn new(client: SlackClient) -> Self {
        Self {
            client,
            users: Mutex::new(HashMap::new()),
            channels: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl Directory for SlackDirectory {
    async fn channel_name(&self, id: &str) -> Result<String, DirectoryError> {
        if let Some(name) = self.channels.lock().await.get(id) {
            return Ok(name.clone());
        }
        let info = self
            .client
            .conversation_info(id)
            .await
            .map_err(|e| DirectoryError::LookupFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })?;
        debug!(channel = %id, name = %info.name, "cached channel name");
        self.channels
            .lock()
            .await
            .insert(id.to_string(), info.name.clone());
        Ok(info.name)
    }

    async fn user_name(&self, id: &str) -> Result<ResolvedUser, DirectoryError> {
        if let Some(user) = self.users.lock().await.get(id) {
            return Ok(user.clone());
        }
        let info = self
            .client
            .user_info(id)
            .await
            .map_err(|e| DirectoryError::LookupFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })?;
        let user = ResolvedUser {
            name: info.name,
            is_bot: info.is_bot,
        };
        debug!(user = %id, name = %user.name, is_bot = user.is_bot, "cached user");
        self.users
            .lock()
            .await
            .insert(id.to_string(), user.clone());
        Ok(user)
    }
}
