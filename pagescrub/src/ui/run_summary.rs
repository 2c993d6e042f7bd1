//! Run summary: an optional per-rule table followed by the summary line.

use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use owo_colors::AnsiColors;
use pagescrub_core::{CompiledRules, RunStats};
use std::io::{self, Write};

use crate::ui::output_format;
use crate::ui::theme::{self, ThemeEntry, ThemeMap};

fn table_color(entry: ThemeEntry, theme_map: &ThemeMap) -> Color {
    match theme::color_for(entry, theme_map) {
        AnsiColors::Black => Color::Black,
        AnsiColors::Red => Color::DarkRed,
        AnsiColors::Green => Color::DarkGreen,
        AnsiColors::Yellow => Color::DarkYellow,
        AnsiColors::Blue => Color::DarkBlue,
        AnsiColors::Magenta => Color::DarkMagenta,
        AnsiColors::Cyan => Color::DarkCyan,
        AnsiColors::White => Color::Grey,
        AnsiColors::BrightBlack => Color::DarkGrey,
        AnsiColors::BrightRed => Color::Red,
        AnsiColors::BrightGreen => Color::Green,
        AnsiColors::BrightYellow => Color::Yellow,
        AnsiColors::BrightBlue => Color::Blue,
        AnsiColors::BrightMagenta => Color::Magenta,
        AnsiColors::BrightCyan => Color::Cyan,
        _ => Color::White,
    }
}

/// Builds a table of rules that matched, listed in the order they ran.
pub fn build_rule_table(stats: &RunStats, rules: &CompiledRules, theme_map: &ThemeMap, supports_color: bool) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Rule").fg(table_color(ThemeEntry::Header, theme_map)),
            Cell::new("Matches").fg(table_color(ThemeEntry::Header, theme_map)),
        ]);
    if !supports_color {
        table.force_no_tty();
    }

    for rule in &rules.rules {
        if let Some(count) = stats.rule_hits.get(&rule.name).filter(|c| **c > 0) {
            table.add_row(vec![
                Cell::new(&rule.name).fg(table_color(ThemeEntry::SummaryRuleName, theme_map)),
                Cell::new(count).fg(table_color(ThemeEntry::SummaryOccurrences, theme_map)),
            ]);
        }
    }
    table
}

/// Prints the summary line, preceded by the rule table when `with_table` is set.
pub fn print_summary<W: Write>(
    stats: &RunStats,
    rules: &CompiledRules,
    with_table: bool,
    writer: &mut W,
    theme_map: &ThemeMap,
    supports_color: bool,
) -> io::Result<()> {
    if with_table {
        if stats.rule_hits.is_empty() {
            output_format::print_info_message(writer, "No rule matched.", theme_map, supports_color)?;
        } else {
            writeln!(writer, "{}", build_rule_table(stats, rules, theme_map, supports_color))?;
        }
    }
    output_format::print_success_message(writer, &stats.to_string(), theme_map, supports_color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::ThemeStyle;
    use pagescrub_core::{compile_rules, RuleSet};

    #[test]
    fn summary_line_matches_counters() {
        let rules = compile_rules(&RuleSet::load_default_rules().unwrap().rules).unwrap();
        let stats = RunStats { substitutions: 3, widget_regions_modified: 2, ..Default::default() };
        let mut out = Vec::new();
        print_summary(&stats, &rules, false, &mut out, &ThemeStyle::default_theme_map(), false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "✓ Sanitized 3 items, 2 editor regions\n");
    }

    #[test]
    fn table_lists_hits_in_rule_order() {
        let rules = compile_rules(&RuleSet::load_default_rules().unwrap().rules).unwrap();
        let mut stats = RunStats::default();
        stats.rule_hits.insert("username".to_string(), 2);
        stats.rule_hits.insert("tenant_guid".to_string(), 1);
        let rendered = build_rule_table(&stats, &rules, &ThemeStyle::default_theme_map(), false).to_string();
        let guid_at = rendered.find("tenant_guid").unwrap();
        let user_at = rendered.find("username").unwrap();
        assert!(guid_at < user_at);
        assert!(!rendered.contains("admin_email"));
    }
}
