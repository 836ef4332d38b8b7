//! Terminal rendering of statuses
//!
//! Colors are chosen per call through a [`Palette`] instead of being switched
//! on and off around prints, so every rendered line carries its own reset.

use std::io::Write;

use colored::{Color, Colorize};

use crate::extract::extract_text;
use crate::types::{Account, Status};

const ACCT_COLOR: Color = Color::BrightRed;
const NAME_COLOR: Color = Color::BrightGreen;
const BOOST_COLOR: Color = Color::BrightBlue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub enabled: bool,
}

impl Palette {
    pub fn colored() -> Self {
        Self { enabled: true }
    }

    pub fn plain() -> Self {
        Self { enabled: false }
    }

    /// Wrap `text` in ANSI codes for `color`, or return it untouched when disabled
    pub fn paint(&self, text: &str, color: Color) -> String {
        if self.enabled {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::colored()
    }
}

/// Render one status as terminal text, without a trailing newline
///
/// Boosts render as two lines: who boosted whom, then the boosted content.
pub fn render_status(status: &Status, palette: &Palette) -> String {
    match status.reblog.as_deref() {
        Some(original) => format!(
            "{} reblogged {}\n{}",
            palette.paint(&status.account.acct, ACCT_COLOR),
            palette.paint(&original.account.acct, BOOST_COLOR),
            palette.paint(&extract_text(&original.content), BOOST_COLOR),
        ),
        None => format!(
            "{} {} {}",
            palette.paint(&status.account.acct, ACCT_COLOR),
            palette.paint(&status.account.display_name, NAME_COLOR),
            extract_text(&status.content),
        ),
    }
}

pub fn render_account(account: &Account, palette: &Palette) -> String {
    format!(
        "{} {}",
        palette.paint(&account.acct, ACCT_COLOR),
        palette.paint(&account.display_name, NAME_COLOR),
    )
}

/// Write a rendered status followed by a newline
pub fn write_status<W: Write>(out: &mut W, status: &Status, palette: &Palette) -> std::io::Result<()> {
    writeln!(out, "{}", render_status(status, palette))
}

/// Write statuses oldest first
///
/// Timelines come back from the API newest first.
pub fn write_timeline<W: Write>(
    out: &mut W,
    statuses: &[Status],
    palette: &Palette,
) -> std::io::Result<()> {
    for status in statuses.iter().rev() {
        write_status(out, status, palette)?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Account {
        Account::new("1", "alice", "Alice A.")
    }

    fn bob() -> Account {
        Account::new("2", "bob@remote.example", "Bob")
    }

    #[test]
    fn test_plain_status() {
        let status = Status::new("10", alice(), "<p>hello<br>world</p>");
        assert_eq!(
            render_status(&status, &Palette::plain()),
            "alice Alice A. hello\nworld"
        );
    }

    #[test]
    fn test_reblogged_status() {
        let original = Status::new("10", bob(), "<p>boost me</p>");
        let boost = Status::boost("11", alice(), original);
        assert_eq!(
            render_status(&boost, &Palette::plain()),
            "alice reblogged bob@remote.example\nboost me"
        );
    }

    #[test]
    fn test_plain_palette_emits_no_escapes() {
        let status = Status::new("10", alice(), "<p>hi</p>");
        let rendered = render_status(&status, &Palette::plain());
        assert!(!rendered.contains('\u{1b}'));
    }

    #[test]
    fn test_colored_palette_resets_within_the_line() {
        colored::control::set_override(true);
        let status = Status::new("10", alice(), "<p>hi</p>");
        let rendered = render_status(&status, &Palette::colored());
        colored::control::unset_override();

        assert!(rendered.contains("alice"));
        assert!(rendered.contains("Alice A."));
        assert!(rendered.ends_with("hi"));
        // every colored span is closed before the uncolored content
        assert_eq!(
            rendered.matches("\u{1b}[0m").count(),
            2,
            "unexpected escapes in {:?}",
            rendered
        );
    }

    #[test]
    fn test_render_account() {
        assert_eq!(render_account(&bob(), &Palette::plain()), "bob@remote.example Bob");
    }

    #[test]
    fn test_write_timeline_prints_oldest_first() {
        let newest = Status::new("3", alice(), "<p>third</p>");
        let middle = Status::new("2", bob(), "<p>second</p>");
        let oldest = Status::new("1", alice(), "<p>first</p>");

        let mut out = Vec::new();
        write_timeline(&mut out, &[newest, middle, oldest], &Palette::plain()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "alice Alice A. first\nbob@remote.example Bob second\nalice Alice A. third\n"
        );
    }

    #[test]
    fn test_write_timeline_empty() {
        let mut out = Vec::new();
        write_timeline(&mut out, &[], &Palette::plain()).unwrap();
        assert!(out.is_empty());
    }
}
