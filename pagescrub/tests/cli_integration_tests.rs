// pagescrub/tests/cli_integration_tests.rs
//! Command-line integration tests for the `pagescrub` binary.
//!
//! Each test spawns the binary with `assert_cmd`, feeds a page through stdin
//! or a temporary file, and checks stdout, stderr and any files written.
//! Output is passed through `strip_ansi_escapes` before text comparisons.

use anyhow::Result;
use assert_cmd::Command;
#[allow(unused_imports)]
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};
use test_log::test;

use strip_ansi_escapes::strip as strip_ansi_escapes_fn;

const PAGE: &str = r#"<p title="owner jagilber">Signed in as jagilber</p>"#;
const SCRUBBED_PAGE: &str = r#"<p title="owner cloudadmin">Signed in as cloudadmin</p>"#;
const EDITOR_PAGE: &str = concat!(
    r#"<div class="monaco-editor"><div class="view-lines">"#,
    r#"<div class="view-line"><span class="mtk1" data-owner="jagilber">resource</span></div>"#,
    r#"</div></div>"#
);

fn run_pagescrub_command(input: &str, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("pagescrub").unwrap();
    cmd.env("RUST_LOG", "debug");
    cmd.env_remove("PAGESCRUB_THEME");
    cmd.args(args);
    cmd.write_stdin(input.as_bytes());
    cmd.assert()
}

fn strip_ansi(s: &[u8]) -> String {
    let cleaned = strip_ansi_escapes_fn(s);
    String::from_utf8_lossy(&cleaned).to_string()
}

#[test]
fn test_scrub_stdin_to_stdout() -> Result<()> {
    let assert = run_pagescrub_command(PAGE, &["scrub"]).success();
    let output = assert.get_output();

    assert_eq!(strip_ansi(&output.stdout), SCRUBBED_PAGE);
    let stderr = strip_ansi(&output.stderr);
    assert!(stderr.contains("✓ Sanitized 1 items, 0 editor regions"), "stderr was: {}", stderr);
    Ok(())
}

#[test]
fn test_scrub_input_file_to_output_file() -> Result<()> {
    let mut input = NamedTempFile::new()?;
    input.write_all(PAGE.as_bytes())?;
    let dir = tempdir()?;
    let out_path = dir.path().join("scrubbed.html");

    let assert = run_pagescrub_command(
        "",
        &[
            "scrub",
            "-i",
            input.path().to_str().unwrap(),
            "-o",
            out_path.to_str().unwrap(),
        ],
    )
    .success();

    assert!(strip_ansi(&assert.get_output().stdout).is_empty());
    assert_eq!(fs::read_to_string(&out_path)?, SCRUBBED_PAGE);
    let stderr = strip_ansi(&assert.get_output().stderr);
    assert!(stderr.contains("Writing scrubbed content to file"));
    Ok(())
}

#[test]
fn test_editor_line_counts_in_both_counters() -> Result<()> {
    let assert = run_pagescrub_command(EDITOR_PAGE, &["scrub"]).success();
    let output = assert.get_output();

    let stdout = strip_ansi(&output.stdout);
    assert!(stdout.contains(r#"data-owner="cloudadmin""#));
    assert!(!stdout.to_lowercase().contains("jagilber"));
    assert!(strip_ansi(&output.stderr).contains("✓ Sanitized 1 items, 1 editor regions"));
    Ok(())
}

#[test]
fn test_json_stats_export() -> Result<()> {
    let dir = tempdir()?;
    let stats_path = dir.path().join("stats.json");

    run_pagescrub_command(EDITOR_PAGE, &["scrub", "--json-stats", stats_path.to_str().unwrap()]).success();

    let stats: serde_json::Value = serde_json::from_str(&fs::read_to_string(&stats_path)?)?;
    assert_eq!(stats["substitutions"], 1);
    assert_eq!(stats["widget_regions_modified"], 1);
    assert_eq!(stats["rule_hits"]["username"], 1);
    Ok(())
}

#[test]
fn test_diff_view() -> Result<()> {
    let input = "<p>intro</p>\n<p>jagilber</p>\n";
    let assert = run_pagescrub_command(input, &["scrub", "--diff"]).success();
    let stdout = strip_ansi(&assert.get_output().stdout);

    assert!(stdout.contains("--- Diff View ---"));
    assert!(stdout.contains("- <p>jagilber</p>"));
    assert!(stdout.contains("+ <p>cloudadmin</p>"));
    assert!(stdout.contains("  <p>intro</p>"));
    Ok(())
}

#[test]
fn test_rule_table_lists_matching_rules() -> Result<()> {
    let input = "<p>sfjagilber-centralus jagilber</p>";
    let assert = run_pagescrub_command(input, &["scrub", "--rule-table"]).success();
    let stderr = strip_ansi(&assert.get_output().stderr);

    assert!(stderr.contains("key_vault"));
    assert!(stderr.contains("username"));
    assert!(stderr.find("key_vault").unwrap() < stderr.rfind("username").unwrap());
    Ok(())
}

#[test]
fn test_no_summary_flag() -> Result<()> {
    let assert = run_pagescrub_command(PAGE, &["scrub", "--no-summary"]).success();
    let stderr = strip_ansi(&assert.get_output().stderr);
    assert!(!stderr.contains("✓ Sanitized"));
    Ok(())
}

#[test]
fn test_quiet_suppresses_stderr() -> Result<()> {
    run_pagescrub_command(PAGE, &["-q", "scrub"])
        .success()
        .stdout(predicate::str::diff(SCRUBBED_PAGE))
        .stderr(predicate::str::is_empty());
    Ok(())
}

#[test]
fn test_empty_input() -> Result<()> {
    let assert = run_pagescrub_command("", &["scrub"]).success();
    let output = assert.get_output();
    assert!(output.stdout.is_empty());
    assert!(strip_ansi(&output.stderr).contains("✓ Sanitized 0 items, 0 editor regions"));
    Ok(())
}

#[test]
fn test_missing_input_file_fails() -> Result<()> {
    let assert = run_pagescrub_command("", &["scrub", "-i", "/definitely/not/here.html"]).failure();
    let stderr = strip_ansi(&assert.get_output().stderr);
    assert!(stderr.contains("Error: Failed to read input file"));
    Ok(())
}

#[test]
fn test_rules_command_table() -> Result<()> {
    let assert = run_pagescrub_command("", &["rules"]).success();
    let stdout = strip_ansi(&assert.get_output().stdout);
    assert!(stdout.contains("subscription_name_prefixed"));
    assert!(stdout.find("tenant_guid").unwrap() < stdout.find("username").unwrap());
    Ok(())
}

#[test]
fn test_rules_command_json() -> Result<()> {
    let assert = run_pagescrub_command("", &["rules", "--json"]).success();
    let rules: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout)?;
    let rules = rules.as_array().unwrap();
    assert_eq!(rules.len(), 20);
    assert_eq!(rules[19]["name"], "username");
    assert_eq!(rules[19]["position"], 20);
    Ok(())
}

#[test]
fn test_custom_theme_and_bad_theme() -> Result<()> {
    let mut theme = NamedTempFile::new()?;
    writeln!(theme, "success:\n  fg: magenta")?;
    run_pagescrub_command(PAGE, &["--theme", theme.path().to_str().unwrap(), "scrub"]).success();

    let mut broken = NamedTempFile::new()?;
    writeln!(broken, "success:\n  fg: [not, a, color")?;
    let assert = run_pagescrub_command(PAGE, &["--theme", broken.path().to_str().unwrap(), "scrub"]).failure();
    assert!(strip_ansi(&assert.get_output().stderr).contains("Failed to parse theme file"));
    Ok(())
}
