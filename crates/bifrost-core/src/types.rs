//! The typed event model shared by the relay core and both adapters.

/// Who sent an inbound message, as the source network identifies them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    /// Opaque network-local identity (IRC nick, Slack user or bot ID).
    pub id: String,
    /// Display name when the network already supplied one — skips
    /// resolution entirely.
    pub display_name: Option<String>,
}

/// Plain chat line vs `/me` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Plain,
    Action,
}

/// A typed event from one network's adapter.
///
/// The engine matches exhaustively; adding a variant is a compile error at
/// every handling site.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// A chat message or action in a channel.
    Message {
        sender: Sender,
        channel: String,
        text: String,
        kind: MessageKind,
    },
    /// The adapter finished connecting. Informational only.
    Connected { detail: String },
    /// Join/part/presence noise. Informational, never relayed.
    Presence { detail: String },
    /// The network rejected our credentials mid-run. Terminates the relay.
    FatalAuth { reason: String },
}

/// One rendered message ready to hand to the destination adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundFragment {
    pub channel: String,
    pub text: String,
    pub kind: MessageKind,
}
