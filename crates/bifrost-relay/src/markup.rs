//! Slack markup translation for the plain-text side.
//!
//! Slack wraps structure in angle brackets: `<@U123>` user mentions,
//! `<#C123|general>` channel references, `<https://…|label>` inline links,
//! and HTML-escapes the surrounding text. Each rewrite below is one
//! left-to-right pass over the bracket grammar; repeated pattern
//! substitution over mutating text double-rewrites its own output (the
//! leftover form handled by [`collapse_leftovers`] is exactly such a relic
//! of upstream pre-rendering).

use crate::resolve::{Directory, DirectoryError};

/// Rewrite `<url|label>` link tokens to `label (url)`.
///
/// Only tokens whose target contains `://` are links; mention tokens pass
/// through untouched for [`resolve_mentions`].
pub fn rewrite_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        let (before, from_bracket) = rest.split_at(start);
        out.push_str(before);
        let Some(rel_end) = from_bracket[1..].find('>') else {
            out.push_str(from_bracket);
            rest = "";
            break;
        };
        let content = &from_bracket[1..1 + rel_end];
        rest = &from_bracket[rel_end + 2..];
        match content.split_once('|') {
            Some((target, label)) if target.contains("://") => {
                out.push_str(label);
                out.push_str(" (");
                out.push_str(target);
                out.push(')');
            }
            _ => emit_verbatim(content, &mut out),
        }
    }
    out.push_str(rest);
    out
}

/// Rewrite mention tokens to `#name` / `@name`.
///
/// `<C…|label>` / `<U…|label>` use the embedded label. Bare `<C…>` / `<U…>`
/// ask the directory; a failed lookup aborts the whole message (the caller
/// drops it). An optional `@`/`#` sigil before the ID — Slack's wire form —
/// is tolerated and stripped. The type is decided by the ID's first
/// character: `C` is a channel, `U` a user; anything else passes through.
pub async fn resolve_mentions(
    text: &str,
    directory: &dyn Directory,
) -> Result<String, DirectoryError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        let (before, from_bracket) = rest.split_at(start);
        out.push_str(before);
        let Some(rel_end) = from_bracket[1..].find('>') else {
            out.push_str(from_bracket);
            rest = "";
            break;
        };
        let content = &from_bracket[1..1 + rel_end];
        rest = &from_bracket[rel_end + 2..];

        let body = content
            .strip_prefix('@')
            .or_else(|| content.strip_prefix('#'))
            .unwrap_or(content);
        match body.split_once('|') {
            Some((id, label)) => match id_sigil(id) {
                Some(sigil) => {
                    out.push(sigil);
                    out.push_str(label);
                }
                None => emit_verbatim(content, &mut out),
            },
            None => match id_sigil(body) {
                Some('#') => {
                    let name = directory.channel_name(body).await?;
                    out.push('#');
                    out.push_str(&name);
                }
                Some(_) => {
                    let user = directory.user_name(body).await?;
                    out.push('@');
                    out.push_str(&user.name);
                }
                None => emit_verbatim(content, &mut out),
            },
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// Collapse the pre-expanded `@U123 (label)` / `#C123 (label)` leftover
/// form down to `@label` / `#label`, by the same ID-prefix rule.
pub fn collapse_leftovers(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < text.len() {
        let ch = match text[i..].chars().next() {
            Some(c) => c,
            None => break,
        };
        if ch == '@' || ch == '#' {
            if let Some((label_sigil, label, consumed)) = parse_leftover(&text[i..]) {
                out.push(label_sigil);
                out.push_str(label);
                i += consumed;
                continue;
            }
        }
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

/// Parse a leading `@ID (label)` / `#ID (label)` form. Returns the new
/// sigil, the label, and the bytes consumed.
fn parse_leftover(s: &str) -> Option<(char, &str, usize)> {
    let rest = &s[1..];
    let id_len = word_len(rest);
    if id_len == 0 {
        return None;
    }
    let id = &rest[..id_len];
    let after_id = rest[id_len..].strip_prefix(" (")?;
    let label_len = word_len(after_id);
    if label_len == 0 || !after_id[label_len..].starts_with(')') {
        return None;
    }
    let sigil = id_sigil(id)?;
    let consumed = 1 + id_len + 2 + label_len + 1;
    Some((sigil, &after_id[..label_len], consumed))
}

/// Length of the leading `\w+` run.
fn word_len(s: &str) -> usize {
    s.find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .unwrap_or(s.len())
}

/// Destination sigil for an identifier: channels start with `C`, users
/// with `U`.
fn id_sigil(id: &str) -> Option<char> {
    match id.as_bytes().first() {
        Some(b'C') => Some('#'),
        Some(b'U') => Some('@'),
        _ => None,
    }
}

/// Undo the HTML entity escaping Slack applies to message text. Applied
/// last so earlier passes see the original escaped form.
pub fn unescape_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        let (before, from_amp) = rest.split_at(start);
        out.push_str(before);
        match from_amp.find(';') {
            Some(end) if end > 1 => match decode_entity(&from_amp[1..end]) {
                Some(decoded) => {
                    out.push_str(&decoded);
                    rest = &from_amp[end + 1..];
                }
                None => {
                    out.push('&');
                    rest = &from_amp[1..];
                }
            },
            _ => {
                out.push('&');
                rest = &from_amp[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<String> {
    match entity {
        "amp" => Some("&".into()),
        "lt" => Some("<".into()),
        "gt" => Some(">".into()),
        "quot" => Some("\"".into()),
        "apos" => Some("'".into()),
        "nbsp" => Some(" ".into()),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                num.parse::<u32>().ok()?
            };
            char::from_u32(code).map(|c| c.to_string())
        }
    }
}

fn emit_verbatim(content: &str, out: &mut String) {
    out.push('<');
    out.push_str(content);
    out.push('>');
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

        async fn user_name(&self, id: &str) -> Result<ResolvedUser, DirectoryError> {
            match id {
                "U42" => Ok(ResolvedUser {
                    name: "alice".to_string(),
                    is_bot: false,
                }),
                other => Err(DirectoryError::LookupFailed {
                    id: other.to_string(),
                    reason: "unknown user".to_string(),
                }),
            }
        }
    }

    #[test]
    fn link_with_label_becomes_label_then_url() {
        assert_eq!(
            rewrite_links("see <https://example.org/a|the docs> please"),
            "see the docs (https://example.org/a) please"
        );
    }

    #[test]
    fn mention_tokens_survive_link_pass() {
        assert_eq!(rewrite_links("ping <@U42> in <#C1|general>"), "ping <@U42> in <#C1|general>");
    }

    #[test]
    fn unterminated_bracket_is_verbatim() {
        assert_eq!(rewrite_links("a < b"), "a < b");
    }

    #[tokio::test]
    async fn labelled_channel_mention_uses_label() {
        let out = resolve_mentions("<C123|general>", &StaticDirectory).await.unwrap();
        assert_eq!(out, "#general");
    }

    #[tokio::test]
    async fn bare_user_mention_resolves() {
        let out = resolve_mentions("<U42>", &StaticDirectory).await.unwrap();
        assert_eq!(out, "@alice");
    }

    #[tokio::test]
    async fn sigil_prefixed_wire_forms_resolve() {
        let out = resolve_mentions("hey <@U42>, see <#C1>", &StaticDirectory)
            .await
            .unwrap();
        assert_eq!(out, "hey @alice, see #general");
    }

    #[tokio::test]
    async fn failed_lookup_aborts_the_message() {
        let err = resolve_mentions("<U999>", &StaticDirectory).await.unwrap_err();
        assert!(matches!(err, DirectoryError::LookupFailed { id, .. } if id == "U999"));
    }

    #[tokio::test]
    async fn non_id_token_passes_through() {
        let out = resolve_mentions("<!here> everyone", &StaticDirectory).await.unwrap();
        assert_eq!(out, "<!here> everyone");
    }

    #[test]
    fn leftover_user_form_collapses() {
        assert_eq!(collapse_leftovers("ask @U19J5UPEC (flexd) about it"), "ask @flexd about it");
    }

    #[test]
    fn leftover_channel_form_collapses_to_hash() {
        assert_eq!(collapse_leftovers("#C123 (general)"), "#general");
    }

    #[test]
    fn leftover_with_unknown_prefix_is_untouched() {
        assert_eq!(collapse_leftovers("@alice (hi)"), "@alice (hi)");
    }

    #[test]
    fn entities_unescape() {
        assert_eq!(unescape_entities("a &amp; b &lt;c&gt; &quot;d&quot;"), "a & b <c> \"d\"");
    }

    #[test]
    fn numeric_entities_unescape() {
        assert_eq!(unescape_entities("&#39;quoted&#x27;"), "'quoted'");
    }

    #[test]
    fn lone_ampersand_is_untouched() {
        assert_eq!(unescape_entities("fish & chips; &bogus; x"), "fish & chips; &bogus; x");
    }
}
