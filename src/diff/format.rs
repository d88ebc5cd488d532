//! Rendering a diff for humans

use super::Diff;
use ansi_term::{Color, Style};
use std::fmt::{Display, Formatter, Result};

/// Convert a diff into a pretty HTML report.
///
/// Intended as an example from which to write one's own display function.
pub fn diff_pretty_html(diffs: &[Diff]) -> String {
    let mut html = String::new();
    for diff in diffs {
        let text = escape_html(diff.text());
        match diff {
            Diff::Insert(_) => {
                html.push_str("<ins style=\"background:#e6ffe6;\">");
                html.push_str(&text);
                html.push_str("</ins>");
            }
            Diff::Delete(_) => {
                html.push_str("<del style=\"background:#ffe6e6;\">");
                html.push_str(&text);
                html.push_str("</del>");
            }
            Diff::Equal(_) => {
                html.push_str("<span>");
                html.push_str(&text);
                html.push_str("</span>");
            }
        }
    }
    html
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\n' => escaped.push_str("&para;<br>"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Struct used to adjust the formatting of a diff for terminals
#[derive(Debug)]
pub struct DiffFormatter {
    with_color: bool,

    equal: Style,
    delete: Style,
    insert: Style,
}

impl DiffFormatter {
    /// Construct a new formatter
    pub fn new() -> Self {
        Self {
            with_color: false,

            equal: Style::new(),
            delete: Color::Red.normal(),
            insert: Color::Green.normal(),
        }
    }

    /// Enable formatting the diff with color
    pub fn with_color(mut self) -> Self {
        self.with_color = true;
        self
    }

    /// Returns a `Display` impl which can be used to print a diff
    pub fn fmt_diffs<'a>(&'a self, diffs: &'a [Diff]) -> impl Display + 'a {
        DiffsDisplay { f: self, diffs }
    }
}

impl Default for DiffFormatter {
    fn default() -> Self {
        Self::new()
    }
}

struct DiffsDisplay<'a> {
    f: &'a DiffFormatter,
    diffs: &'a [Diff],
}

impl Display for DiffsDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for diff in self.diffs {
            let style = match diff {
                Diff::Equal(_) => self.f.equal,
                Diff::Delete(_) => self.f.delete,
                Diff::Insert(_) => self.f.insert,
            };
            if self.f.with_color {
                write!(f, "{}", style.prefix())?;
            }
            write!(f, "{}", diff.text())?;
            if self.f.with_color {
                write!(f, "{}", style.suffix())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_html() {
        let diffs = vec![
            Diff::Equal("a\n".to_string()),
            Diff::Delete("<B>b</B>".to_string()),
            Diff::Insert("c&d".to_string()),
        ];
        assert_eq!(
            diff_pretty_html(&diffs),
            "<span>a&para;<br></span><del style=\"background:#ffe6e6;\">&lt;B&gt;b&lt;/B&gt;</del>\
             <ins style=\"background:#e6ffe6;\">c&amp;d</ins>"
        );
    }

    #[test]
    fn test_formatter_without_color() {
        let diffs = vec![
            Diff::Equal("one ".to_string()),
            Diff::Delete("two".to_string()),
            Diff::Insert("three".to_string()),
        ];
        let formatted = DiffFormatter::new().fmt_diffs(&diffs).to_string();
        assert_eq!(formatted, "one twothree");
    }
}
