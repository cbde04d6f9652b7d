pub mod adapter;
pub mod config;
pub mod error;
pub mod types;

pub use adapter::{AdapterError, ChatAdapter};
pub use config::BifrostConfig;
pub use error::{CoreError, Result};
pub use types::{InboundEvent, MessageKind, OutboundFragment, Sender};
