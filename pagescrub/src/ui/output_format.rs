//! Styled status messages for stderr.
//!
//! Every helper takes the writer explicitly so callers decide where messages
//! go, and whether color is used, without touching global state.

use crate::ui::theme::{self, ThemeEntry, ThemeMap};
use owo_colors::OwoColorize;
use std::io::{self, Write};

fn print_message<W: Write>(
    writer: &mut W,
    prefix: &str,
    msg: &str,
    entry: ThemeEntry,
    theme_map: &ThemeMap,
    supports_color: bool,
) -> io::Result<()> {
    let line = format!("{}{}", prefix, msg);
    if supports_color {
        writeln!(writer, "{}", line.color(theme::color_for(entry, theme_map)))
    } else {
        writeln!(writer, "{}", line)
    }
}

pub fn print_info_message<W: Write>(writer: &mut W, msg: &str, theme_map: &ThemeMap, supports_color: bool) -> io::Result<()> {
    print_message(writer, "", msg, ThemeEntry::Info, theme_map, supports_color)
}

pub fn print_error_message<W: Write>(writer: &mut W, msg: &str, theme_map: &ThemeMap, supports_color: bool) -> io::Result<()> {
    print_message(writer, "Error: ", msg, ThemeEntry::Error, theme_map, supports_color)
}

/// Prints the run summary line.
pub fn print_success_message<W: Write>(writer: &mut W, msg: &str, theme_map: &ThemeMap, supports_color: bool) -> io::Result<()> {
    print_message(writer, "", msg, ThemeEntry::Success, theme_map, supports_color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::ThemeStyle;

    #[test]
    fn plain_output_has_prefix_and_no_escapes() {
        let theme = ThemeStyle::default_theme_map();
        let mut out = Vec::new();
        print_error_message(&mut out, "careful", &theme, false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Error: careful\n");
    }

    #[test]
    fn colored_output_strips_to_the_same_text() {
        let theme = ThemeStyle::default_theme_map();
        let mut out = Vec::new();
        print_error_message(&mut out, "boom", &theme, true).unwrap();
        assert!(out.contains(&0x1b));
        let stripped = strip_ansi_escapes::strip(&out);
        assert_eq!(String::from_utf8(stripped).unwrap(), "Error: boom\n");
    }
}
