//! Colors for the help text and the banner. Lines copied from the input are
//! never styled.
use anstyle::{AnsiColor, Color, Style};
use is_terminal::IsTerminal;
use std::fmt;

/// Whether to color what we print to the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChoice {
    /// Color output going to a terminal
    Auto,
    /// Never color anything (`--monochrome`)
    Never,
}

impl ColorChoice {
    /// The equivalent `anstream` choice
    #[must_use]
    pub fn for_anstream(self) -> anstream::ColorChoice {
        match self {
            ColorChoice::Auto => anstream::ColorChoice::Auto,
            ColorChoice::Never => anstream::ColorChoice::Never,
        }
    }

    /// Should log messages on standard error carry ANSI escapes?
    #[must_use]
    pub fn for_stderr(self) -> bool {
        self == ColorChoice::Auto && std::io::stderr().is_terminal()
    }
}

const BLUE: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlue)));
const BOLD_BLUE: Style = BLUE.bold();
const BOLD_RED: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightRed))).bold();
const GREEN: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));
const YELLOW: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));

#[must_use]
pub(crate) fn app_name(content: &str) -> StyledStr<'_> {
    StyledStr { prefix: BOLD_BLUE, content }
}
#[must_use]
pub(crate) fn as_version(content: &str) -> StyledStr<'_> {
    StyledStr { prefix: BOLD_RED, content }
}
#[must_use]
pub(crate) fn as_item(content: &str) -> StyledStr<'_> {
    StyledStr { prefix: GREEN, content }
}
#[must_use]
pub(crate) fn as_title(content: &str) -> StyledStr<'_> {
    StyledStr { prefix: YELLOW, content }
}

/// A string and the style to print it in
pub(crate) struct StyledStr<'a> {
    prefix: Style,
    content: &'a str,
}
impl StyledStr<'_> {
    /// Length without the escape codes
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }
    /// The number of leading blanks
    #[must_use]
    pub fn indented_by(&self) -> usize {
        use bstr::ByteSlice;
        self.content.as_bytes().find_not_byteset(b" ").unwrap_or(self.len())
    }
}
impl fmt::Display for StyledStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.prefix.render(), self.content, self.prefix.render_reset())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn len_ignores_escape_codes() {
        let contents = "abc";
        assert_eq!(app_name(contents).len(), contents.len());
        assert_eq!(as_version(contents).len(), contents.len());
        assert_eq!(as_item(contents).len(), contents.len());
        assert_eq!(as_title(contents).len(), contents.len());
        assert!(as_item(contents).to_string().len() > contents.len());
    }

    #[test]
    fn indented_by_counts_leading_blanks() {
        assert_eq!(as_item("  --soak  ").indented_by(), 2);
        assert_eq!(as_item("-q").indented_by(), 0);
        assert_eq!(as_item("   ").indented_by(), 3);
    }

    #[test]
    fn never_means_no_color_on_stderr() {
        assert!(!ColorChoice::Never.for_stderr());
        assert!(matches!(ColorChoice::Never.for_anstream(), anstream::ColorChoice::Never));
    }
}
