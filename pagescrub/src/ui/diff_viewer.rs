//! Line diff between the original and the scrubbed page.

use crate::ui::theme::{self, ThemeEntry, ThemeMap};
use diffy::{create_patch, Line as DiffLine};
use owo_colors::OwoColorize;
use std::io::{self, Write};

/// Writes a unified-style diff: removed lines in red, added lines in green.
/// Context lines are printed uncolored.
pub fn print_diff<W: Write>(
    original: &str,
    sanitized: &str,
    writer: &mut W,
    theme_map: &ThemeMap,
    supports_color: bool,
) -> io::Result<()> {
    let header_color = theme::color_for(ThemeEntry::DiffHeader, theme_map);
    let removed_color = theme::color_for(ThemeEntry::DiffRemoved, theme_map);
    let added_color = theme::color_for(ThemeEntry::DiffAdded, theme_map);

    let header = "--- Diff View ---";
    if supports_color {
        writeln!(writer, "{}", header.color(header_color))?;
    } else {
        writeln!(writer, "{}", header)?;
    }

    let patch = create_patch(original, sanitized);
    let mut changed = false;
    for hunk in patch.hunks() {
        for line in hunk.lines() {
            let (marker, text, color) = match line {
                DiffLine::Delete(s) => {
                    changed = true;
                    ("-", *s, Some(removed_color))
                }
                DiffLine::Insert(s) => {
                    changed = true;
                    ("+", *s, Some(added_color))
                }
                DiffLine::Context(s) => (" ", *s, None),
            };
            let rendered = format!("{} {}", marker, text.trim_end_matches('\n'));
            match color {
                Some(color) if supports_color => writeln!(writer, "{}", rendered.color(color))?,
                _ => writeln!(writer, "{}", rendered)?,
            }
        }
    }

    if !changed {
        writeln!(writer, "No changes detected.")?;
    }

    let footer = "-----------------";
    if supports_color {
        writeln!(writer, "{}", footer.color(header_color))?;
    } else {
        writeln!(writer, "{}", footer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::ThemeStyle;

    #[test]
    fn marks_removed_and_added_lines() {
        let theme = ThemeStyle::default_theme_map();
        let mut out = Vec::new();
        print_diff("<p>a</p>\n<p>secret</p>\n", "<p>a</p>\n<p>masked</p>\n", &mut out, &theme, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("- <p>secret</p>"));
        assert!(text.contains("+ <p>masked</p>"));
        assert!(text.contains("  <p>a</p>"));
    }

    #[test]
    fn identical_inputs_report_no_changes() {
        let theme = ThemeStyle::default_theme_map();
        let mut out = Vec::new();
        print_diff("same\n", "same\n", &mut out, &theme, false).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("No changes detected."));
    }
}
