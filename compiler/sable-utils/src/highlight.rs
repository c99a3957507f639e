//! Terminal highlighting for compiler messages.
use std::{fmt, ops::BitOr};

/// ANSI escape that resets all styling.
const RESET: &str = "\u{001b}[0m";

/// Foreground colours available to the highlighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colour {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
}

impl Colour {
    fn code(self) -> u8 {
        match self {
            Colour::Red => 31,
            Colour::Green => 32,
            Colour::Yellow => 33,
            Colour::Blue => 34,
            Colour::Magenta => 35,
            Colour::Cyan => 36,
        }
    }
}

/// Text effects that can be combined with a [Colour].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Bold,
    Underline,
}

impl Modifier {
    fn code(self) -> u8 {
        match self {
            Modifier::Bold => 1,
            Modifier::Underline => 4,
        }
    }
}

/// A colour with an optional text effect, produced by combining a [Colour]
/// and a [Modifier] with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    colour: Colour,
    modifier: Option<Modifier>,
}

impl From<Colour> for Style {
    fn from(colour: Colour) -> Self {
        Style { colour, modifier: None }
    }
}

impl BitOr<Modifier> for Colour {
    type Output = Style;

    fn bitor(self, modifier: Modifier) -> Self::Output {
        Style { colour: self, modifier: Some(modifier) }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\u{001b}[{}m", self.colour.code())?;

        if let Some(modifier) = self.modifier {
            write!(f, "\u{001b}[{}m", modifier.code())?;
        }

        Ok(())
    }
}

/// Wrap `message` in the escape codes of `style`, resetting the terminal
/// afterwards.
pub fn highlight(style: impl Into<Style>, message: impl fmt::Display) -> String {
    format!("{}{message}{RESET}", style.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_resets() {
        let text = highlight(Colour::Red | Modifier::Bold, "error");

        assert!(text.starts_with("\u{001b}[31m\u{001b}[1m"));
        assert!(text.ends_with(RESET));
        assert!(text.contains("error"));
    }
}
