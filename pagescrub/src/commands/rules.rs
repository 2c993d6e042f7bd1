//! `rules` command: list the built-in rules in application order.

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use is_terminal::IsTerminal;
use serde::Serialize;
use std::io::{self, Write};

use pagescrub_core::{RuleSet, ScrubRule};

use crate::cli::RulesCommand;

#[derive(Serialize)]
struct RuleListing<'a> {
    position: usize,
    #[serde(flatten)]
    rule: &'a ScrubRule,
}

pub fn run_rules_command(cmd: &RulesCommand) -> Result<()> {
    let rule_set = RuleSet::load_default_rules()?;
    let stdout = io::stdout();
    let supports_color = stdout.is_terminal();
    let mut writer = stdout.lock();
    if cmd.json {
        write_rules_json(&rule_set, &mut writer)
    } else {
        writeln!(writer, "{}", build_rules_table(&rule_set, supports_color))?;
        Ok(())
    }
}

fn write_rules_json<W: Write>(rule_set: &RuleSet, writer: &mut W) -> Result<()> {
    let listing: Vec<RuleListing> = rule_set
        .rules
        .iter()
        .enumerate()
        .map(|(i, rule)| RuleListing { position: i + 1, rule })
        .collect();
    serde_json::to_writer_pretty(&mut *writer, &listing).context("Failed to serialize rule list")?;
    writeln!(writer)?;
    Ok(())
}

pub fn build_rules_table(rule_set: &RuleSet, supports_color: bool) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Name", "Category", "Pattern", "Replacement"]);
    if !supports_color {
        table.force_no_tty();
    }
    for (i, rule) in rule_set.rules.iter().enumerate() {
        let pattern = match (&rule.preceded_by, &rule.pattern) {
            (Some(guard), Some(pattern)) => format!("{} (after {})", pattern, guard),
            (None, Some(pattern)) => pattern.clone(),
            (_, None) => String::new(),
        };
        table.add_row(vec![
            (i + 1).to_string(),
            rule.name.clone(),
            rule.category.clone().unwrap_or_default(),
            pattern,
            rule.replace_with.clone(),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_listing_keeps_order_and_positions() {
        let rules = RuleSet::load_default_rules().unwrap();
        let mut out = Vec::new();
        write_rules_json(&rules, &mut out).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let entries = parsed.as_array().unwrap();
        assert_eq!(entries.len(), rules.rules.len());
        assert_eq!(entries[0]["position"], 1);
        assert_eq!(entries[0]["name"], "subscription_name_prefixed");
        assert_eq!(entries.last().unwrap()["name"], "username");
    }

    #[test]
    fn table_shows_guard() {
        let rules = RuleSet::load_default_rules().unwrap();
        let rendered = build_rules_table(&rules, false).to_string();
        assert!(rendered.contains("tenant_guid_tail"));
        assert!(rendered.contains("(after"));
    }
}
