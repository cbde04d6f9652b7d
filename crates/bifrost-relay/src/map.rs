//! Static bridge topology built once from configuration.

use std::collections::HashMap;

use crate::error::RelayError;

/// Bidirectional channel mapping between the two networks.
///
/// Built from `"slack-channel:irc-channel"` pair strings. Immutable after
/// construction, so it can be read without coordination.
#[derive(Debug, Clone, Default)]
pub struct ChannelMap {
    irc_to_slack: HashMap<String, String>,
    slack_to_irc: HashMap<String, String>,
}

impl ChannelMap {
    /// Build the map from configured pairs.
    ///
    /// A pair without a `:` separator, or a channel named in more than one
    /// pair, is a fatal configuration error.
    pub fn from_pairs<S: AsRef<str>>(pairs: &[S]) -> Result<Self, RelayError> {
        let mut map = ChannelMap::default();
        for pair in pairs {
            let pair = pair.as_ref();
            let (slack, irc) = pair.split_once(':').ok_or_else(|| RelayError::BadBridgePair {
                pair: pair.to_string(),
            })?;
            if map
                .slack_to_irc
                .insert(slack.to_string(), irc.to_string())
                .is_some()
            {
                return Err(RelayError::DuplicateChannel {
                    channel: slack.to_string(),
                });
            }
            if map
                .irc_to_slack
                .insert(irc.to_string(), slack.to_string())
                .is_some()
            {
                return Err(RelayError::DuplicateChannel {
                    channel: irc.to_string(),
                });
            }
        }
        Ok(map)
    }

    /// Map an IRC channel to its Slack counterpart.
    pub fn forward(&self, irc_channel: &str) -> Option<&str> {
        self.irc_to_slack.get(irc_channel).map(String::as_str)
    }

    /// Map a Slack channel to its IRC counterpart.
    pub fn backward(&self, slack_channel: &str) -> Option<&str> {
        self.slack_to_irc.get(slack_channel).map(String::as_str)
    }

    /// Every IRC channel named in the topology, for the adapter to join.
    pub fn irc_channels(&self) -> Vec<String> {
        self.irc_to_slack.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_pairs_map_symmetrically() {
        let map = ChannelMap::from_pairs(&["#general:#chat", "#dev:#bifrost-dev"]).unwrap();

        assert_eq!(map.forward("#chat"), Some("#general"));
        assert_eq!(map.backward("#general"), Some("#chat"));
        assert_eq!(map.forward("#bifrost-dev"), Some("#dev"));
        assert_eq!(map.backward("#dev"), Some("#bifrost-dev"));
    }

    #[test]
    fn unconfigured_channel_is_absent_both_ways() {
        let map = ChannelMap::from_pairs(&["#general:#chat"]).unwrap();

        assert_eq!(map.forward("#nope"), None);
        assert_eq!(map.backward("#nope"), None);
        // side mix-ups don't resolve either
        assert_eq!(map.forward("#general"), None);
        assert_eq!(map.backward("#chat"), None);
    }

    #[test]
    fn pair_without_separator_is_rejected() {
        let err = ChannelMap::from_pairs(&["#general#chat"]).unwrap_err();
        assert!(matches!(err, RelayError::BadBridgePair { .. }));
    }

    #[test]
    fn duplicate_channel_is_rejected() {
        let err = ChannelMap::from_pairs(&["#general:#chat", "#general:#other"]).unwrap_err();
        assert!(matches!(
            err,
            RelayError::DuplicateChannel { channel } if channel == "#general"
        ));
    }

    #[test]
    fn irc_channels_lists_join_targets() {
        let map = ChannelMap::from_pairs(&["#general:#chat", "#dev:#bifrost-dev"]).unwrap();
        let mut channels = map.irc_channels();
        channels.sort();
        assert_eq!(channels, vec!["#bifrost-dev", "#chat"]);
    }
}
