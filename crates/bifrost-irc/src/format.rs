//! mIRC text formatting.
//!
//! Colour and attribute codes understood by mIRC-compatible clients, used
//! to style the relayed sender prefix.

use std::fmt;

/// The colours specified by mIRC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    White,
    Black,
    Blue,
    Green,
    Red,
    Brown,
    Purple,
    Orange,
    Yellow,
    LightGreen,
    Teal,
    LightCyan,
    LightBlue,
    LightPurple,
    Gray,
    LightGray,
    Default,
}

impl Color {
    fn code(self) -> &'static str {
        match self {
            Color::White => "0",
            Color::Black => "1",
            Color::Blue => "2",
            Color::Green => "3",
            Color::Red => "4",
            Color::Brown => "5",
            Color::Purple => "6",
            Color::Orange => "7",
            Color::Yellow => "8",
            Color::LightGreen => "9",
            Color::Teal => "10",
            Color::LightCyan => "11",
            Color::LightBlue => "12",
            Color::LightPurple => "13",
            Color::Gray => "14",
            Color::LightGray => "15",
            Color::Default => "99",
        }
    }
}

/// The formatting attributes specified by mIRC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attrib {
    Bold,
    Italic,
    Underline,
    Video,
    Reset,
}

impl Attrib {
    fn code(self) -> &'static str {
        match self {
            Attrib::Bold => "\u{2}",
            Attrib::Italic => "\u{1D}",
            Attrib::Underline => "\u{1F}",
            Attrib::Video => "\u{16}",
            Attrib::Reset => "\u{F}",
        }
    }
}

/// An in-progress text format operation.
///
/// Colours are wrapped in `\x03fg,bg…\x03`; each attribute wraps the whole
/// run in its toggle code. `Reset` short-circuits: everything after it in
/// the attribute list is ignored.
#[derive(Debug, Clone)]
pub struct Fmt {
    text: String,
    fg: Option<Color>,
    bg: Option<Color>,
    attribs: Vec<Attrib>,
}

impl Fmt {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fg: None,
            bg: None,
            attribs: Vec::new(),
        }
    }

    /// Replace the foreground colour.
    pub fn fg(mut self, c: Color) -> Self {
        self.fg = Some(c);
        self
    }

    /// Replace the background colour.
    pub fn bg(mut self, c: Color) -> Self {
        self.bg = Some(c);
        self
    }

    /// Add an attribute.
    pub fn attr(mut self, a: Attrib) -> Self {
        self.attribs.push(a);
        self
    }
}

impl fmt::Display for Fmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fg = self.fg.unwrap_or(Color::Default).code();
        let bg = self.bg.unwrap_or(Color::Default).code();
        let mut s = format!("\u{3}{},{}{}\u{3}", fg, bg, self.text);
        for a in &self.attribs {
            if *a == Attrib::Reset {
                s.push_str(a.code());
                break;
            }
            s = format!("{}{}{}", a.code(), s, a.code());
        }
        write!(f, "{s}")
    }
}

/// Bold yellow sender name, as shown in relayed `<name>` prefixes.
pub fn sender_name(name: &str) -> String {
    Fmt::new(name).attr(Attrib::Bold).fg(Color::Yellow).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_gets_default_colours() {
        assert_eq!(Fmt::new("hi").to_string(), "\u{3}99,99hi\u{3}");
    }

    #[test]
    fn foreground_colour_is_applied() {
        assert_eq!(Fmt::new("hi").fg(Color::Red).to_string(), "\u{3}4,99hi\u{3}");
    }

    #[test]
    fn attributes_wrap_the_coloured_run() {
        assert_eq!(
            Fmt::new("hi").fg(Color::Yellow).attr(Attrib::Bold).to_string(),
            "\u{2}\u{3}8,99hi\u{3}\u{2}"
        );
    }

    #[test]
    fn reset_short_circuits_later_attributes() {
        assert_eq!(
            Fmt::new("hi").attr(Attrib::Reset).attr(Attrib::Bold).to_string(),
            "\u{3}99,99hi\u{3}\u{F}"
        );
    }

    #[test]
    fn sender_name_is_bold_yellow() {
        assert_eq!(sender_name("alice"), "\u{2}\u{3}8,99alice\u{3}\u{2}");
    }
}
