//! Per-direction message rendering: newline collapse, markup translation,
//! sender prefix, and length-limited fragment splitting.

use std::sync::Arc;

use crate::emoji::EmojiTable;
use crate::markup;
use crate::resolve::{Directory, DirectoryError};

/// Hard per-message budget on the IRC side, sender prefix included.
pub const IRC_LINE_BUDGET: usize = 400;
/// Slack truncates display around 4k characters; split well before the API
/// hard cap.
pub const SLACK_TEXT_LIMIT: usize = 4_000;
/// How far back from the split boundary to look for whitespace before
/// giving up and cutting mid-word.
pub const SPLIT_LOOKBACK: usize = 15;

/// How the sender prefix is rendered on the destination side.
#[derive(Clone, Copy)]
pub enum Prefix {
    /// `<name> ` verbatim.
    Angle,
    /// `<name> ` with the name decorated (mIRC colour/attribute codes).
    Decorated(fn(&str) -> String),
    /// No textual prefix — the destination adapter carries the sender
    /// itself (Slack username impersonation).
    None,
}

/// Markup translation applied when leaving the rich network.
pub struct Rewrite {
    pub directory: Arc<dyn Directory>,
    pub emoji: EmojiTable,
}

/// One direction of the bridge's rendering pipeline.
///
/// Step order matters: newline collapse first (destination lines are
/// newline-delimited), markup before emoji, entity unescape last, prefix
/// and splitting at the very end.
pub struct Transformer {
    limit: usize,
    prefix: Prefix,
    rewrite: Option<Rewrite>,
}

impl Transformer {
    pub fn new(limit: usize, prefix: Prefix, rewrite: Option<Rewrite>) -> Self {
        Self {
            limit,
            prefix,
            rewrite,
        }
    }

    /// Pipeline for messages leaving Slack towards IRC: full markup/emoji
    /// rewriting and a decorated prefix inside the IRC line budget.
    pub fn slack_to_irc(
        directory: Arc<dyn Directory>,
        emoji: EmojiTable,
        decorate: fn(&str) -> String,
    ) -> Self {
        Self::new(
            IRC_LINE_BUDGET,
            Prefix::Decorated(decorate),
            Some(Rewrite { directory, emoji }),
        )
    }

    /// Pipeline for messages leaving IRC towards Slack: no markup work and
    /// no textual prefix (the Slack adapter impersonates the sender).
    pub fn irc_to_slack() -> Self {
        Self::new(SLACK_TEXT_LIMIT, Prefix::None, None)
    }

    /// Run the full pipeline. `Err` means a resolver lookup failed and the
    /// message must be dropped.
    pub async fn render(&self, sender: &str, text: &str) -> Result<Fragments, DirectoryError> {
        let mut text = collapse_newlines(text);
        if let Some(ref rewrite) = self.rewrite {
            text = markup::rewrite_links(&text);
            text = markup::resolve_mentions(&text, rewrite.directory.as_ref()).await?;
            text = markup::collapse_leftovers(&text);
            text = rewrite.emoji.expand(&text);
            text = markup::unescape_entities(&text);
        }
        let prefix = match self.prefix {
            Prefix::Angle => format!("<{sender}> "),
            Prefix::Decorated(decorate) => format!("<{}> ", decorate(sender)),
            Prefix::None => String::new(),
        };
        Ok(Fragments::new(prefix, text, self.limit))
    }
}

/// Collapse every newline variant to a single space. `\r\n` counts as one
/// newline, not two.
fn collapse_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push(' ');
            }
            '\n' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

/// Lazy fragment sequence produced by [`Transformer::render`].
///
/// Finite and not restartable; each fragment repeats the sender prefix and
/// never exceeds the length budget. Concatenating the fragment bodies
/// reconstructs the rendered text exactly.
pub struct Fragments {
    prefix: String,
    rest: String,
    budget: usize,
    started: bool,
}

impl Fragments {
    fn new(prefix: String, text: String, limit: usize) -> Self {
        // Degenerate budgets (prefix as long as the limit) still make
        // forward progress one byte at a time.
        let budget = limit.saturating_sub(prefix.len()).max(1);
        Self {
            prefix,
            rest: text,
            budget,
            started: false,
        }
    }
}

impl Iterator for Fragments {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.rest.is_empty() {
            // Empty input still yields the bare prefix once.
            if self.started {
                return None;
            }
            self.started = true;
            return Some(self.prefix.clone());
        }
        self.started = true;
        if self.rest.len() <= self.budget {
            let body = std::mem::take(&mut self.rest);
            return Some(format!("{}{}", self.prefix, body));
        }
        let cut = split_point(&self.rest, self.budget);
        let body: String = self.rest.drain(..cut).collect();
        Some(format!("{}{}", self.prefix, body))
    }
}

/// Split index for an over-long body: the nearest space within
/// [`SPLIT_LOOKBACK`] bytes before (or at) `budget`, else `budget` itself
/// backed off to a char boundary.
fn split_point(body: &str, budget: usize) -> usize {
    let bytes = body.as_bytes();
    let floor = budget.saturating_sub(SPLIT_LOOKBACK);
    let mut i = budget;
    loop {
        if bytes[i] == b' ' {
            return i;
        }
        if i <= floor || i == 0 {
            break;
        }
        i -= 1;
    }
    let mut cut = budget;
    while cut > 1 && !body.is_char_boundary(cut) {
        cut -= 1;
    }
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::resolve::ResolvedUser;

    struct StaticDirectory;

    #[async_trait]
    impl Directory for StaticDirectory {
        async fn channel_name(&self, id: &str) -> Result<String, DirectoryError> {
            match id {
                "C1" => Ok("general".to_string()),
                other => Err(DirectoryError::LookupFailed {
                    id: other.to_string(),
                    reason: "unknown channel".to_string(),
                }),
            }
        }

        async fn user_name(&self, _id: &str) -> Result<ResolvedUser, DirectoryError> {
            Ok(ResolvedUser {
                name: "alice".to_string(),
                is_bot: false,
            })
        }
    }

    fn emoji() -> EmojiTable {
        EmojiTable::from_pairs([("wave".to_string(), "👋".to_string())])
    }

    fn plain_irc_bound() -> Transformer {
        Transformer::new(
            IRC_LINE_BUDGET,
            Prefix::Angle,
            Some(Rewrite {
                directory: Arc::new(StaticDirectory),
                emoji: emoji(),
            }),
        )
    }

    async fn render_all(t: &Transformer, sender: &str, text: &str) -> Vec<String> {
        t.render(sender, text).await.unwrap().collect()
    }

    #[tokio::test]
    async fn short_message_is_a_single_prefixed_fragment() {
        let fragments = render_all(&plain_irc_bound(), "alice", "hello there").await;
        assert_eq!(fragments, vec!["<alice> hello there"]);
    }

    #[tokio::test]
    async fn full_pipeline_end_to_end() {
        let fragments =
            render_all(&plain_irc_bound(), "alice", "check <C1|general> now :wave:").await;
        assert_eq!(fragments, vec!["<alice> check #general now 👋"]);
    }

    #[tokio::test]
    async fn newlines_collapse_to_spaces() {
        let fragments = render_all(&plain_irc_bound(), "alice", "one\r\ntwo\rthree\nfour").await;
        assert_eq!(fragments, vec!["<alice> one two three four"]);
    }

    #[tokio::test]
    async fn empty_input_yields_prefix_only_fragment() {
        let fragments = render_all(&plain_irc_bound(), "alice", "").await;
        assert_eq!(fragments, vec!["<alice> "]);
    }

    #[tokio::test]
    async fn split_prefers_word_boundary_in_lookback_window() {
        // 420 body characters with the only nearby space at position 395.
        let mut body = "x".repeat(420);
        body.replace_range(395..396, " ");

        let transformer = Transformer::new(400, Prefix::None, None);
        let fragments = render_all(&transformer, "alice", &body).await;

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].len(), 395);
        assert_eq!(fragments[1].len(), 25);
        assert!(fragments[1].starts_with(' '));
        assert_eq!(fragments.concat(), body);
    }

    #[tokio::test]
    async fn split_without_whitespace_cuts_at_the_budget() {
        let body = "y".repeat(900);
        let transformer = Transformer::new(400, Prefix::None, None);
        let fragments = render_all(&transformer, "alice", &body).await;

        assert_eq!(
            fragments.iter().map(String::len).collect::<Vec<_>>(),
            vec![400, 400, 100]
        );
        assert_eq!(fragments.concat(), body);
    }

    #[tokio::test]
    async fn every_fragment_fits_the_budget_with_prefix() {
        let words = "word ".repeat(300);
        let fragments = render_all(&plain_irc_bound(), "alice", words.trim_end()).await;

        assert!(fragments.len() > 1);
        for fragment in &fragments {
            assert!(fragment.len() <= IRC_LINE_BUDGET, "fragment too long: {}", fragment.len());
            assert!(fragment.starts_with("<alice> "));
        }
    }

    #[tokio::test]
    async fn fragment_bodies_reconstruct_the_text() {
        let words = "lorem ipsum dolor sit amet ".repeat(40);
        let fragments = render_all(&plain_irc_bound(), "alice", &words).await;

        let rebuilt: String = fragments
            .iter()
            .map(|f| f.strip_prefix("<alice> ").unwrap())
            .collect();
        assert_eq!(rebuilt, words);
    }

    #[tokio::test]
    async fn decorated_prefix_counts_against_the_budget() {
        fn loud(name: &str) -> String {
            format!("\u{2}{name}\u{2}")
        }
        let transformer = Transformer::new(40, Prefix::Decorated(loud), None);
        let fragments = render_all(&transformer, "alice", &"z".repeat(100)).await;

        for fragment in &fragments {
            assert!(fragment.len() <= 40);
            assert!(fragment.starts_with("<\u{2}alice\u{2}> "));
        }
    }

    #[tokio::test]
    async fn multibyte_text_never_splits_inside_a_char() {
        let body = "é".repeat(300); // 600 bytes
        let transformer = Transformer::new(401, Prefix::None, None);
        let fragments = render_all(&transformer, "alice", &body).await;

        assert!(fragments.len() > 1);
        for fragment in &fragments {
            assert!(fragment.len() <= 401);
        }
        assert_eq!(fragments.concat(), body);
    }

    #[tokio::test]
    async fn failed_mention_lookup_propagates() {
        let result = plain_irc_bound().render("alice", "see <C999>").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn irc_to_slack_leaves_markup_alone() {
        let transformer = Transformer::irc_to_slack();
        let fragments = render_all(&transformer, "dave", "plain <not|markup> :wave:").await;
        assert_eq!(fragments, vec!["plain <not|markup> :wave:"]);
    }
}
