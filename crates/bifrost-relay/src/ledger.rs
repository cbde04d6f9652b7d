//! One-hop echo suppression.
//!
//! The bridge is an ordinary participant on both networks, so a message it
//! relays comes straight back on the destination's own event stream. Each
//! outbound send pre-authorises that echo here; the ledger consumes it
//! instead of letting it bounce back across the bridge forever.

use std::collections::HashMap;

/// Pending-echo counter per (sender display name, channel).
///
/// A counter rather than a flag: several relays to the same channel can be
/// in flight before their echoes return. Content-blind — it records only
/// that *some* relay by that identity is outstanding, so a second genuine
/// message racing its own echo can be mis-suppressed. Best-effort.
#[derive(Debug, Default)]
pub struct EchoLedger {
    pending: HashMap<(String, String), u32>,
}

impl EchoLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one outbound relay whose echo should be swallowed.
    pub fn mark_relayed(&mut self, sender: &str, channel: &str) {
        *self
            .pending
            .entry((sender.to_string(), channel.to_string()))
            .or_insert(0) += 1;
    }

    /// Decide whether an inbound message is genuine.
    ///
    /// Returns `false` and consumes one pending mark when this looks like
    /// an echo of our own send; returns `true` (state untouched) otherwise.
    pub fn should_process(&mut self, sender: &str, channel: &str) -> bool {
        let key = (sender.to_string(), channel.to_string());
        match self.pending.get_mut(&key) {
            Some(count) if *count > 0 => {
                *count -= 1;
                if *count == 0 {
                    self.pending.remove(&key);
                }
                false
            }
            _ => true,
        }
    }
}
