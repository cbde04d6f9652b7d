//! Slack Web API client.
//!
//! Thin typed wrappers over the handful of methods the bridge needs:
//! `apps.connections.open` (Socket Mode URL), `chat.postMessage`,
//! `users.info`, `conversations.info`. Slack reports failures inside a
//! 200 response (`ok: false` + an error token), so every wrapper checks
//! the envelope.

use serde::Deserialize;

use crate::error::SlackError;

const API_BASE: &str = "https://slack.com/api";

/// Shared Web API client. Cheap to clone — reqwest pools connections
/// internally.
#[derive(Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    bot_token: String,
    app_token: String,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConnectionsOpenResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    user: Option<UserInfo>,
}

/// The `user` object of `users.info`, reduced to what the bridge reads.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub name: String,
    #[serde(default)]
    pub is_bot: bool,
}

#[derive(Debug, Deserialize)]
struct ConversationsInfoResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    channel: Option<ChannelInfo>,
}

/// The `channel` object of `conversations.info`, reduced to its name.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelInfo {
    pub name: String,
}

impl SlackClient {
    pub fn new(bot_token: &str, app_token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token: bot_token.to_string(),
            app_token: app_token.to_string(),
        }
    }

    /// Open a Socket Mode connection; returns the WSS URL to dial.
    ///
    /// Authenticated with the app-level token, unlike everything else.
    pub async fn connections_open(&self) -> Result<String, SlackError> {
        let resp: ConnectionsOpenResponse = self
            .http
            .post(format!("{API_BASE}/apps.connections.open"))
            .bearer_auth(&self.app_token)
            .send()
            .await?
            .json()
            .await?;
        if !resp.ok {
            return Err(api_error(resp.error));
        }
        resp.url
            .ok_or_else(|| SlackError::Api("connections.open returned no url".to_string()))
    }

    /// Post a plain message to `channel`, impersonating `username`.
    pub async fn post_message(
        &self,
        channel: &str,
        username: &str,
        text: &str,
    ) -> Result<(), SlackError> {
        let body = serde_json::json!({
            "channel": channel,
            "text": text,
            "username": username,
        });
        self.call("chat.postMessage", &body).await
    }

    /// Post a `/me`-style action: italicised, per Slack convention.
    pub async fn post_action(
        &self,
        channel: &str,
        username: &str,
        text: &str,
    ) -> Result<(), SlackError> {
        let body = serde_json::json!({
            "channel": channel,
            "text": format!("_{text}_"),
            "username": username,
            "mrkdwn": true,
        });
        self.call("chat.postMessage", &body).await
    }

    pub async fn user_info(&self, id: &str) -> Result<UserInfo, SlackError> {
        let resp: UserInfoResponse = self
            .http
            .get(format!("{API_BASE}/users.info"))
            .bearer_auth(&self.bot_token)
            .query(&[("user", id)])
            .send()
            .await?
            .json()
            .await?;
        if !resp.ok {
            return Err(api_error(resp.error));
        }
        resp.user
            .ok_or_else(|| SlackError::Api("users.info returned no user".to_string()))
    }

    pub async fn conversation_info(&self, id: &str) -> Result<ChannelInfo, SlackError> {
        let resp: ConversationsInfoResponse = self
            .http
            .get(format!("{API_BASE}/conversations.info"))
            .bearer_auth(&self.bot_token)
            .query(&[("channel", id)])
            .send()
            .await?
            .json()
            .await?;
        if !resp.ok {
            return Err(api_error(resp.error));
        }
        resp.channel
            .ok_or_else(|| SlackError::Api("conversations.info returned no channel".to_string()))
    }

    async fn call(&self, method: &str, body: &serde_json::Value) -> Result<(), SlackError> {
        let resp: ApiEnvelope = self
            .http
            .post(format!("{API_BASE}/{method}"))
            .bearer_auth(&self.bot_token)
            .json(body)
            .send()
            .await?
            .json()
            .await?;
        if !resp.ok {
            return Err(api_error(resp.error));
        }
        Ok(())
    }
}

fn api_error(error: Option<String>) -> SlackError {
    SlackError::Api(error.unwrap_or_else(|| "unknown error".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_info_decodes() {
        let json = r#"{"ok":true,"user":{"name":"alice","is_bot":false,"id":"U42"}}"#;
        let resp: UserInfoResponse = serde_json::from_str(json).unwrap();
        assert!(resp.ok);
        let user = resp.user.unwrap();
        assert_eq!(user.name, "alice");
        assert!(!user.is_bot);
    }

    #[test]
    fn api_failure_envelope_decodes() {
        let json = r#"{"ok":false,"error":"invalid_auth"}"#;
        let resp: ConnectionsOpenResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.error.as_deref(), Some("invalid_auth"));
        assert!(resp.url.is_none());
    }

    #[test]
    fn channel_info_ignores_extra_fields() {
        let json = r#"{"ok":true,"channel":{"name":"general","is_channel":true}}"#;
        let resp: ConversationsInfoResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.channel.unwrap().name, "general");
    }
}
