//! IRC channel adapter.
//!
//! Wraps the `irc` crate's async client: connects, joins the bridged
//! channels, and pumps parsed lines into the relay's typed event stream.
//! The client's message sink is a cheap cloneable handle, so sends never
//! contend with the reader task.

use async_trait::async_trait;
use futures_util::StreamExt;
use irc::client::prelude::{Client, Command, Config, Message, Response};
use irc::client::{ClientStream, Sender as IrcSender};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use bifrost_core::adapter::{AdapterError, ChatAdapter};
use bifrost_core::config::IrcConfig;
use bifrost_core::types::{InboundEvent, MessageKind, Sender};

use crate::error::IrcError;

/// Events buffered between the reader task and the relay loop.
const EVENT_BUFFER: usize = 64;

/// IRC adapter. Create with the channels to join, then `start`.
pub struct IrcAdapter {
    config: IrcConfig,
    channels: Vec<String>,
    sender: Option<IrcSender>,
    reader: Option<JoinHandle<()>>,
}

impl IrcAdapter {
    pub fn new(config: &IrcConfig, channels: Vec<String>) -> Self {
        Self {
            config: config.clone(),
            channels,
            sender: None,
            reader: None,
        }
    }

    async fn connect(&self) -> Result<(IrcSender, ClientStream), IrcError> {
        let config = Config {
            nickname: Some(self.config.nick.clone()),
            realname: Some(self.config.realname.clone()),
            server: Some(self.config.server.clone()),
            port: Some(self.config.port),
            use_tls: Some(self.config.use_tls),
            password: self.config.password.clone(),
            channels: self.channels.clone(),
            ..Config::default()
        };
        let mut client = Client::from_config(config).await?;
        client.identify()?;
        let stream = client.stream()?;
        Ok((client.sender(), stream))
    }
}

#[async_trait]
impl ChatAdapter for IrcAdapter {
    fn network(&self) -> &str {
        "irc"
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<InboundEvent>, AdapterError> {
        let (sender, stream) = self
            .connect()
            .await
            .map_err(|e| AdapterError::ConnectionFailed(e.to_string()))?;
        self.sender = Some(sender);

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        self.reader = Some(tokio::spawn(read_loop(stream, tx)));
        Ok(rx)
    }

    async fn send_message(
        &self,
        target: &str,
        _sender: &str,
        text: &str,
    ) -> Result<(), AdapterError> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| AdapterError::SendFailed("adapter not started".to_string()))?;
        sender
            .send_privmsg(target, text)
            .map_err(|e| AdapterError::SendFailed(e.to_string()))
    }

    async fn send_action(
        &self,
        target: &str,
        _sender: &str,
        text: &str,
    ) -> Result<(), AdapterError> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| AdapterError::SendFailed("adapter not started".to_string()))?;
        sender
            .send_action(target, text)
            .map_err(|e| AdapterError::SendFailed(e.to_string()))
    }

    async fn stop(&self) {
        if let Some(sender) = self.sender.as_ref() {
            let _ = sender.send_quit("bridge shutting down");
        }
        if let Some(reader) = self.reader.as_ref() {
            reader.abort();
        }
    }
}

/// Pump parsed IRC lines into typed relay events until the connection dies
/// or the relay hangs up.
async fn read_loop(mut stream: ClientStream, tx: mpsc::Sender<InboundEvent>) {
    while let Some(item) = stream.next().await {
        let message = match item {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "irc stream error, closing");
                break;
            }
        };
        if let Some(event) = classify(&message) {
            if tx.send(event).await.is_err() {
                break; // relay gone
            }
        }
    }
    debug!("irc read loop finished");
}

/// Map one server line to a relay event. `None` is protocol noise.
fn classify(message: &Message) -> Option<InboundEvent> {
    let nick = message.source_nickname().map(str::to_string);
    match message.command {
        Command::PRIVMSG(ref target, ref text) => {
            let nick = nick?;
            let (body, kind) = split_ctcp_action(text);
            Some(InboundEvent::Message {
                sender: Sender {
                    id: nick.clone(),
                    display_name: Some(nick),
                },
                channel: target.clone(),
                text: body.to_string(),
                kind,
            })
        }
        Command::JOIN(ref chan, _, _) => {
            nick.map(|n| InboundEvent::Presence {
                detail: format!("{n} joined {chan}"),
            })
        }
        Command::PART(ref chan, _) => {
            nick.map(|n| InboundEvent::Presence {
                detail: format!("{n} left {chan}"),
            })
        }
        Command::QUIT(_) => nick.map(|n| InboundEvent::Presence {
            detail: format!("{n} quit"),
        }),
        Command::Response(Response::RPL_WELCOME, _) => Some(InboundEvent::Connected {
            detail: "registered with server".to_string(),
        }),
        Command::Response(Response::ERR_NICKNAMEINUSE, _) => Some(InboundEvent::FatalAuth {
            reason: "nickname already in use".to_string(),
        }),
        Command::Response(Response::ERR_PASSWDMISMATCH, _) => Some(InboundEvent::FatalAuth {
            reason: "server password rejected".to_string(),
        }),
        _ => None,
    }
}

/// Unwrap a CTCP ACTION payload (`\x01ACTION …\x01`) if present.
fn split_ctcp_action(text: &str) -> (&str, MessageKind) {
    text.strip_prefix("\u{1}ACTION ")
        .and_then(|rest| rest.strip_suffix('\u{1}'))
        .map(|body| (body, MessageKind::Action))
        .unwrap_or((text, MessageKind::Plain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use irc::proto::Prefix;

    fn from_nick(nick: &str, command: Command) -> Message {
        Message {
            tags: None,
            prefix: Some(Prefix::Nickname(
                nick.to_string(),
                nick.to_string(),
                "host".to_string(),
            )),
            command,
        }
    }

    #[test]
    fn privmsg_becomes_a_plain_message() {
        let message = from_nick(
            "dave",
            Command::PRIVMSG("#chat".to_string(), "hello".to_string()),
        );
        match classify(&message) {
            Some(InboundEvent::Message {
                sender,
                channel,
                text,
                kind,
            }) => {
                assert_eq!(sender.id, "dave");
                assert_eq!(sender.display_name.as_deref(), Some("dave"));
                assert_eq!(channel, "#chat");
                assert_eq!(text, "hello");
                assert_eq!(kind, MessageKind::Plain);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn ctcp_action_becomes_an_action() {
        let message = from_nick(
            "dave",
            Command::PRIVMSG("#chat".to_string(), "\u{1}ACTION waves\u{1}".to_string()),
        );
        match classify(&message) {
            Some(InboundEvent::Message { text, kind, .. }) => {
                assert_eq!(text, "waves");
                assert_eq!(kind, MessageKind::Action);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn join_is_presence_noise() {
        let message = from_nick("dave", Command::JOIN("#chat".to_string(), None, None));
        assert!(matches!(
            classify(&message),
            Some(InboundEvent::Presence { .. })
        ));
    }

    #[test]
    fn nick_in_use_is_fatal() {
        let message = Message {
            tags: None,
            prefix: None,
            command: Command::Response(Response::ERR_NICKNAMEINUSE, vec![]),
        };
        assert!(matches!(
            classify(&message),
            Some(InboundEvent::FatalAuth { .. })
        ));
    }

    #[test]
    fn welcome_is_connected() {
        let message = Message {
            tags: None,
            prefix: None,
            command: Command::Response(Response::RPL_WELCOME, vec![]),
        };
        assert!(matches!(
            classify(&message),
            Some(InboundEvent::Connected { .. })
        ));
    }

    #[test]
    fn unhandled_lines_are_ignored() {
        let message = from_nick("dave", Command::NICK("dave2".to_string()));
        assert!(classify(&message).is_none());
    }

    #[test]
    fn action_without_closing_marker_stays_plain() {
        let (body, kind) = split_ctcp_action("\u{1}ACTION waves");
        assert_eq!(body, "\u{1}ACTION waves");
        assert_eq!(kind, MessageKind::Plain);
    }
}
