//! Slack Socket Mode event loop.
//!
//! `apps.connections.open` hands us a WSS URL; Slack then pushes JSON
//! envelopes over the WebSocket. Every `events_api` envelope must be acked
//! by id or Slack redelivers it. `disconnect` envelopes are routine — Slack
//! rotates connections — so the loop redials with a fresh URL and only
//! gives up when reauthentication itself fails.

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, info, warn};

use bifrost_core::types::{InboundEvent, MessageKind, Sender};

use crate::client::SlackClient;

/// One envelope off the Socket Mode WebSocket. Only the fields we read.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    envelope_id: Option<String>,
    #[serde(default)]
    payload: Option<EventsApiPayload>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventsApiPayload {
    #[serde(default)]
    event: Option<MessageEvent>,
}

/// A message-shaped event inside an `events_api` envelope.
#[derive(Debug, Deserialize)]
struct MessageEvent {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    bot_id: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

enum ConnectionEnd {
    /// Slack closed or asked for a reconnect; dial a fresh URL.
    Refresh,
    /// The relay dropped its receiver; shut the pump down.
    RelayGone,
}

/// Drive the Socket Mode connection until the relay hangs up or Slack
/// rejects our credentials. `first_url` was opened during adapter startup
/// so bad tokens fail the whole process instead of this background task.
pub(crate) async fn run(first_url: String, client: SlackClient, tx: mpsc::Sender<InboundEvent>) {
    let mut url = first_url;
    loop {
        match pump(&url, &tx).await {
            ConnectionEnd::RelayGone => return,
            ConnectionEnd::Refresh => {}
        }
        url = match client.connections_open().await {
            Ok(fresh) => fresh,
            Err(e) => {
                warn!(error = %e, "socket mode reconnect failed");
                let _ = tx
                    .send(InboundEvent::FatalAuth {
                        reason: e.to_string(),
                    })
                    .await;
                return;
            }
        };
    }
}

/// Read one WebSocket connection to exhaustion.
async fn pump(url: &str, tx: &mpsc::Sender<InboundEvent>) -> ConnectionEnd {
    let (mut ws, _) = match connect_async(url).await {
        Ok(connection) => connection,
        Err(e) => {
            warn!(error = %e, "websocket dial failed, refreshing");
            return ConnectionEnd::Refresh;
        }
    };
    while let Some(frame) = ws.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "websocket read error, refreshing");
                return ConnectionEnd::Refresh;
            }
        };
        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => return ConnectionEnd::Refresh,
            _ => continue,
        };
        let envelope: Envelope = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(error = %e, "unparsable socket frame dropped");
                continue;
            }
        };
        if let Some(ref id) = envelope.envelope_id {
            let ack = serde_json::json!({ "envelope_id": id }).to_string();
            if ws.send(Message::Text(ack)).await.is_err() {
                return ConnectionEnd::Refresh;
            }
        }
        match envelope.kind.as_str() {
            "hello" => {
                let connected = InboundEvent::Connected {
                    detail: "socket mode established".to_string(),
                };
                if tx.send(connected).await.is_err() {
                    return ConnectionEnd::RelayGone;
                }
            }
            "disconnect" => {
                info!(
                    reason = envelope.reason.as_deref().unwrap_or("unspecified"),
                    "slack asked us to reconnect"
                );
                return ConnectionEnd::Refresh;
            }
            "events_api" => {
                let Some(event) = envelope.payload.and_then(|p| p.event) else {
                    continue;
                };
                if let Some(inbound) = translate(event) {
                    if tx.send(inbound).await.is_err() {
                        return ConnectionEnd::RelayGone;
                    }
                }
            }
            other => debug!(kind = %other, "ignoring socket envelope"),
        }
    }
    ConnectionEnd::Refresh
}

/// Map a Slack event to a relay event. `None` means drop it here.
fn translate(event: MessageEvent) -> Option<InboundEvent> {
    if event.kind != "message" {
        return Some(InboundEvent::Presence { detail: event.kind });
    }
    let channel = event.channel?;
    let text = event.text.unwrap_or_default();
    match event.subtype.as_deref() {
        None | Some("me_message") => {
            let kind = if event.subtype.is_some() {
                MessageKind::Action
            } else {
                MessageKind::Plain
            };
            let id = event.user?;
            Some(InboundEvent::Message {
                sender: Sender {
                    id,
                    display_name: non_empty(event.username),
                },
                channel,
                text,
                kind,
            })
        }
        // Our own impersonated posts echo back with this subtype; they must
        // reach the engine so the echo ledger can consume them. Foreign
        // bot posts carrying a username relay like the original did.
        Some("bot_message") => {
            let id = event.bot_id.or(event.user)?;
            Some(InboundEvent::Message {
                sender: Sender {
                    id,
                    display_name: non_empty(event.username),
                },
                channel,
                text,
                kind: MessageKind::Plain,
            })
        }
        Some("file_share") | Some("file_comment") => {
            // Older event shapes omit `user`; recover the sender from the
            // first <@U…> token in the rendered text.
            let id = match event.user.or_else(|| first_user_mention(&text)) {
                Some(id) => id,
                None => {
                    warn!("cannot extract sender from file event, dropped");
                    return None;
                }
            };
            Some(InboundEvent::Message {
                sender: Sender {
                    id,
                    display_name: non_empty(event.username),
                },
                channel,
                text,
                kind: MessageKind::Plain,
            })
        }
        Some(other) => {
            debug!(subtype = %other, "ignoring message subtype");
            None
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Pull `U…` out of the first `<@U…>` token, e.g. a file comment's
/// "<@U123> commented on …" rendering.
fn first_user_mention(text: &str) -> Option<String> {
    let start = text.find("<@")?;
    let rest = &text[start + 2..];
    let end = rest.find('>')?;
    let id = &rest[..end];
    let id = id.split_once('|').map(|(id, _)| id).unwrap_or(id);
    if id.starts_with('U') {
        Some(id.to_string())
    } else {
        None
    }
}
