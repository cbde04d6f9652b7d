//! The relay loop: one task, two event streams, one decision path.
//!
//! All mutable relay state (the echo ledger, and transitively the resolver
//! caches) is touched only from this loop, one event at a time. A slow send
//! on one network delays the other's events; accepted — ordering per
//! destination channel matters more than latency here.

use std::sync::Arc;

use tracing::{debug, info, warn};

use bifrost_core::adapter::{AdapterError, ChatAdapter};
use bifrost_core::types::{InboundEvent, MessageKind, OutboundFragment, Sender};

use crate::error::RelayError;
use crate::ledger::EchoLedger;
use crate::map::ChannelMap;
use crate::resolve::{Directory, DirectoryError};
use crate::transform::Transformer;

/// Relay lifecycle. `Starting` until both adapters hand over their event
/// streams, `Running` for the life of the loop, `Terminated` after either
/// stream closes or a fatal auth event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Starting,
    Running,
    Terminated,
}

/// Which network an event arrived from.
#[derive(Debug, Clone, Copy)]
enum Side {
    Irc,
    Slack,
}

impl Side {
    fn name(self) -> &'static str {
        match self {
            Side::Irc => "irc",
            Side::Slack => "slack",
        }
    }
}

/// Outcome of resolving who sent a message.
enum SenderOutcome {
    Named(String),
    Bot,
    Failed(DirectoryError),
}

/// Owns the bridge topology, the echo ledger, and both adapters.
pub struct RelayEngine {
    irc: Box<dyn ChatAdapter>,
    slack: Box<dyn ChatAdapter>,
    map: ChannelMap,
    ledger: EchoLedger,
    directory: Arc<dyn Directory>,
    slack_to_irc: Transformer,
    irc_to_slack: Transformer,
    state: EngineState,
}

impl RelayEngine {
    pub fn new(
        irc: Box<dyn ChatAdapter>,
        slack: Box<dyn ChatAdapter>,
        map: ChannelMap,
        directory: Arc<dyn Directory>,
        slack_to_irc: Transformer,
        irc_to_slack: Transformer,
    ) -> Self {
        Self {
            irc,
            slack,
            map,
            ledger: EchoLedger::new(),
            directory,
            slack_to_irc,
            irc_to_slack,
            state: EngineState::Starting,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Drive the relay until a stream closes (`Ok`) or authentication fails
    /// (`Err`). A startup failure on either adapter is fatal and the engine
    /// never enters `Running`.
    pub async fn run(mut self) -> Result<(), RelayError> {
        let mut slack_rx = self.slack.start().await.map_err(|cause| RelayError::Startup {
            network: "slack",
            cause,
        })?;
        let mut irc_rx = self.irc.start().await.map_err(|cause| RelayError::Startup {
            network: "irc",
            cause,
        })?;
        self.state = EngineState::Running;
        info!("relay running");

        let outcome = loop {
            // No priority between networks; whichever stream is ready wins.
            let (side, event) = tokio::select! {
                ev = irc_rx.recv() => match ev {
                    Some(ev) => (Side::Irc, ev),
                    None => break Ok("irc event stream closed"),
                },
                ev = slack_rx.recv() => match ev {
                    Some(ev) => (Side::Slack, ev),
                    None => break Ok("slack event stream closed"),
                },
            };
            match event {
                InboundEvent::Message {
                    sender,
                    channel,
                    text,
                    kind,
                } => match side {
                    Side::Irc => self.relay_irc_message(sender, channel, text, kind).await,
                    Side::Slack => self.relay_slack_message(sender, channel, text, kind).await,
                },
                InboundEvent::Connected { detail } => {
                    info!(network = side.name(), %detail, "connected");
                }
                InboundEvent::Presence { detail } => {
                    debug!(network = side.name(), %detail, "presence");
                }
                InboundEvent::FatalAuth { reason } => {
                    break Err(RelayError::FatalAuth {
                        network: side.name(),
                        reason,
                    });
                }
            }
        };

        self.state = EngineState::Terminated;
        self.irc.stop().await;
        self.slack.stop().await;
        match outcome {
            Ok(reason) => {
                info!(%reason, "relay terminated");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// IRC → Slack. The map is keyed by the raw PRIVMSG target; IRC always
    /// supplies the nick, so no resolution is needed.
    async fn relay_irc_message(
        &mut self,
        sender: Sender,
        channel: String,
        text: String,
        kind: MessageKind,
    ) {
        let Some(dest) = self.map.forward(&channel) else {
            debug!(%channel, "irc channel not bridged, discarding");
            return;
        };
        let dest = dest.to_string();
        let name = sender.display_name.unwrap_or(sender.id);
        if !self.ledger.should_process(&name, &channel) {
            debug!(%name, %channel, "suppressed echo of our own relay");
            return;
        }
        let fragments = match self.irc_to_slack.render(&name, &text).await {
            Ok(fragments) => fragments,
            Err(e) => {
                warn!(error = %e, "dropping irc message");
                return;
            }
        };
        for text in fragments {
            let fragment = OutboundFragment {
                channel: dest.clone(),
                text,
                kind,
            };
            if let Err(e) = dispatch(self.slack.as_ref(), &fragment, &name).await {
                warn!(error = %e, channel = %fragment.channel, "slack send failed, dropping message");
                return;
            }
            // Pre-authorise the echo Slack will report for this send.
            self.ledger.mark_relayed(&name, &fragment.channel);
        }
    }

    /// Slack → IRC. Slack events carry a channel ID; the map is keyed by
    /// `#name`, so the ID is resolved first.
    async fn relay_slack_message(
        &mut self,
        sender: Sender,
        channel: String,
        text: String,
        kind: MessageKind,
    ) {
        let name = match self.resolve_sender(&sender).await {
            SenderOutcome::Named(name) => name,
            SenderOutcome::Bot => {
                debug!(user = %sender.id, "dropping bot-authored message");
                return;
            }
            SenderOutcome::Failed(e) => {
                warn!(user = %sender.id, error = %e, "dropping message, sender lookup failed");
                return;
            }
        };
        let channel_name = match self.directory.channel_name(&channel).await {
            Ok(resolved) => format!("#{resolved}"),
            Err(e) => {
                warn!(channel = %channel, error = %e, "dropping message, channel lookup failed");
                return;
            }
        };
        let Some(dest) = self.map.backward(&channel_name) else {
            debug!(channel = %channel_name, "slack channel not bridged, discarding");
            return;
        };
        let dest = dest.to_string();
        if !self.ledger.should_process(&name, &channel_name) {
            debug!(%name, channel = %channel_name, "suppressed echo of our own relay");
            return;
        }
        let fragments = match self.slack_to_irc.render(&name, &text).await {
            Ok(fragments) => fragments,
            Err(e) => {
                warn!(error = %e, "dropping message, mention resolution failed");
                return;
            }
        };
        for text in fragments {
            let fragment = OutboundFragment {
                channel: dest.clone(),
                text,
                kind,
            };
            if let Err(e) = dispatch(self.irc.as_ref(), &fragment, &name).await {
                warn!(error = %e, channel = %fragment.channel, "irc send failed, dropping message");
                return;
            }
            self.ledger.mark_relayed(&name, &fragment.channel);
        }
    }

    async fn resolve_sender(&self, sender: &Sender) -> SenderOutcome {
        if let Some(ref name) = sender.display_name {
            return SenderOutcome::Named(name.clone());
        }
        match self.directory.user_name(&sender.id).await {
            Ok(user) if user.is_bot => SenderOutcome::Bot,
            Ok(user) => SenderOutcome::Named(user.name),
            Err(e) => SenderOutcome::Failed(e),
        }
    }
}

/// Send one fragment through an adapter, matching the inbound kind.
async fn dispatch(
    adapter: &dyn ChatAdapter,
    fragment: &OutboundFragment,
    sender: &str,
) -> Result<(), AdapterError> {
    match fragment.kind {
        MessageKind::Plain => {
            adapter
                .send_message(&fragment.channel, sender, &fragment.text)
                .await
        }
        MessageKind::Action => {
            adapter
                .send_action(&fragment.channel, sender, &fragment.text)
                .await
        }
    }
}
