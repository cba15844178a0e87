//! Display colors for usernames in chat lines.
//!
//! Colors are plain ANSI SGR sequences; the client terminal renders them.

use std::fmt;
use std::str::FromStr;

/// A named display color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
    Purple,
    Cyan,
    #[default]
    Reset,
}

impl Color {
    /// All supported colors, in the order they are advertised to clients.
    pub const ALL: [Color; 7] = [
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Purple,
        Color::Cyan,
        Color::Reset,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Cyan => "cyan",
            Self::Reset => "reset",
        }
    }

    /// The ANSI escape sequence for this color.
    pub fn ansi(self) -> &'static str {
        match self {
            Self::Red => "\x1b[31m",
            Self::Green => "\x1b[32m",
            Self::Yellow => "\x1b[33m",
            Self::Blue => "\x1b[34m",
            Self::Purple => "\x1b[35m",
            Self::Cyan => "\x1b[36m",
            Self::Reset => "\x1b[0m",
        }
    }

    /// Comma-separated list of color names for usage replies.
    pub fn available() -> String {
        Self::ALL
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Wrap `text` in this color, resetting afterwards.
    pub fn paint(self, text: &str) -> String {
        format!("{}{}{}", self.ansi(), text, Color::Reset.ansi())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a color name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownColor;

impl FromStr for Color {
    type Err = UnknownColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or(UnknownColor)
    }
}
