//! Slack channel adapter: Socket Mode inbound, Web API outbound.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use bifrost_core::adapter::{AdapterError, ChatAdapter};
use bifrost_core::config::SlackConfig;
use bifrost_core::types::InboundEvent;

use crate::client::SlackClient;
use crate::socket;

/// Events buffered between the socket task and the relay loop.
const EVENT_BUFFER: usize = 64;

/// Slack adapter.
pub struct SlackAdapter {
    client: SlackClient,
    socket: Option<JoinHandle<()>>,
}

impl SlackAdapter {
    pub fn new(config: &SlackConfig) -> Self {
        Self {
            client: SlackClient::new(&config.bot_token, &config.app_token),
            socket: None,
        }
    }

    /// Web API handle for the resolver directory.
    pub fn client(&self) -> SlackClient {
        self.client.clone()
    }
}

#[async_trait]
impl ChatAdapter for SlackAdapter {
    fn network(&self) -> &str {
        "slack"
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<InboundEvent>, AdapterError> {
        // Open the first Socket Mode URL here rather than inside the pump
        // task, so bad credentials fail the process at startup.
        let url = self
            .client
            .connections_open()
            .await
            .map_err(|e| AdapterError::AuthFailed(e.to_string()))?;

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        self.socket = Some(tokio::spawn(socket::run(url, self.client.clone(), tx)));
        Ok(rx)
    }

    async fn send_message(
        &self,
        target: &str,
        sender: &str,
        text: &str,
    ) -> Result<(), AdapterError> {
        self.client
            .post_message(target, sender, text)
            .await
            .map_err(|e| AdapterError::SendFailed(e.to_string()))
    }

    async fn send_action(
        &self,
        target: &str,
        sender: &str,
        text: &str,
    ) -> Result<(), AdapterError> {
        self.client
            .post_action(target, sender, text)
            .await
            .map_err(|e| AdapterError::SendFailed(e.to_string()))
    }

    async fn stop(&self) {
        if let Some(socket) = self.socket.as_ref() {
            socket.abort();
        }
    }
}
