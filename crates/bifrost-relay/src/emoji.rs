//! Emoji shortcode table.
//!
//! Loaded once at startup from an emoji-data JSON dump (the file the
//! reference deployment ships as `emoji_pretty.json`). Expansion is a
//! single left-to-right pass; unknown shortcodes stay verbatim.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::RelayError;

/// One entry in the emoji-data file. Only the fields we read.
#[derive(Debug, Deserialize)]
struct EmojiEntry {
    short_name: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    unified: Option<String>,
    #[serde(default)]
    texts: Option<Vec<String>>,
}

/// Shortcode → display text.
#[derive(Debug, Clone, Default)]
pub struct EmojiTable {
    map: HashMap<String, String>,
}

impl EmojiTable {
    /// Load the table from an emoji-data JSON file. Fatal at startup when
    /// the file is unreadable or not the expected shape.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RelayError> {
        let path = path.as_ref();
        let table_err = |reason: String| RelayError::EmojiTable {
            path: path.display().to_string(),
            reason,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| table_err(e.to_string()))?;
        let entries: Vec<EmojiEntry> =
            serde_json::from_str(&raw).map_err(|e| table_err(e.to_string()))?;
        Ok(Self::from_entries(entries))
    }

    /// Build a table directly from (shortcode, replacement) pairs.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            map: pairs.into_iter().collect(),
        }
    }

    fn from_entries(entries: Vec<EmojiEntry>) -> Self {
        let mut map = HashMap::new();
        for entry in entries {
            // Preference: explicit text replacement, else the first code
            // point of `unified`, else the first of `texts`.
            let value = if let Some(text) = entry.text.filter(|t| !t.is_empty()) {
                text
            } else if let Some(glyph) = entry.unified.as_deref().and_then(first_code_point) {
                glyph.to_string()
            } else if let Some(first) = entry.texts.and_then(|t| t.into_iter().next()) {
                first
            } else {
                warn!(short_name = %entry.short_name, "emoji entry has no usable value, skipped");
                continue;
            };
            map.insert(entry.short_name, value);
        }
        Self { map }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Expand `:code:` shortcodes in `text`.
    ///
    /// Single pass, left to right, non-overlapping. A matched code
    /// immediately followed by a `:modifier:` (skin-tone style) swallows
    /// the modifier. An unknown code — modifier included — passes through
    /// verbatim and is not rescanned.
    pub fn expand(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find(':') {
            let (before, from_colon) = rest.split_at(start);
            out.push_str(before);
            match parse_shortcode(from_colon) {
                Some((name, token_len)) => {
                    let modifier_len = parse_shortcode(&from_colon[token_len..])
                        .map(|(_, len)| len)
                        .unwrap_or(0);
                    match self.map.get(name) {
                        Some(value) => out.push_str(value),
                        None => out.push_str(&from_colon[..token_len + modifier_len]),
                    }
                    rest = &from_colon[token_len + modifier_len..];
                }
                None => {
                    out.push(':');
                    rest = &from_colon[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// First code point of a `unified` field like "1F44B" or "1F44B-1F3FB".
fn first_code_point(unified: &str) -> Option<char> {
    let first = unified.split('-').next()?;
    let value = u32::from_str_radix(first, 16).ok()?;
    char::from_u32(value)
}

/// Parse a leading `:name:` token; returns (name, total token length).
fn parse_shortcode(s: &str) -> Option<(&str, usize)> {
    let rest = s.strip_prefix(':')?;
    let end = rest.find(|c: char| !is_shortcode_char(c))?;
    if end == 0 || !rest[end..].starts_with(':') {
        return None;
    }
    Some((&rest[..end], end + 2))
}

fn is_shortcode_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> EmojiTable {
        EmojiTable::from_pairs([
            ("wave".to_string(), "👋".to_string()),
            ("smile".to_string(), "😄".to_string()),
            ("+1".to_string(), "👍".to_string()),
        ])
    }

    #[test]
    fn known_shortcode_expands() {
        assert_eq!(table().expand("hello :wave:"), "hello 👋");
    }

    #[test]
    fn unknown_shortcode_is_untouched() {
        assert_eq!(table().expand("hello :notarealcode:"), "hello :notarealcode:");
    }

    #[test]
    fn skin_tone_modifier_is_dropped_with_the_match() {
        assert_eq!(table().expand(":wave::skin-tone-2: hi"), "👋 hi");
    }

    #[test]
    fn unknown_code_keeps_its_modifier() {
        assert_eq!(table().expand(":zzzz::skin-tone-2:"), ":zzzz::skin-tone-2:");
    }

    #[test]
    fn plus_and_dash_are_shortcode_characters() {
        assert_eq!(table().expand("ok :+1: then"), "ok 👍 then");
    }

    #[test]
    fn bare_colons_pass_through() {
        assert_eq!(table().expand("12:30 and a :: pair"), "12:30 and a :: pair");
    }

    #[test]
    fn entry_preference_is_text_then_unified_then_texts() {
        let entries = vec![
            EmojiEntry {
                short_name: "a".into(),
                text: Some("<3".into()),
                unified: Some("1F44B".into()),
                texts: None,
            },
            EmojiEntry {
                short_name: "b".into(),
                text: None,
                unified: Some("1F44B-1F3FB".into()),
                texts: None,
            },
            EmojiEntry {
                short_name: "c".into(),
                text: None,
                unified: None,
                texts: Some(vec![":)".into(), "=)".into()]),
            },
        ];
        let table = EmojiTable::from_entries(entries);
        assert_eq!(table.expand(":a:"), "<3");
        assert_eq!(table.expand(":b:"), "👋");
        assert_eq!(table.expand(":c:"), ":)");
    }

    #[test]
    fn unusable_entry_is_skipped() {
        let entries = vec![EmojiEntry {
            short_name: "ghost".into(),
            text: None,
            unified: Some("not-hex".into()),
            texts: None,
        }];
        let table = EmojiTable::from_entries(entries);
        assert!(table.is_empty());
    }
}
