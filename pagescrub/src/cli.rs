//! This file defines the command-line interface (CLI) for the pagescrub
//! application, including all available commands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "pagescrub",
    version = env!("CARGO_PKG_VERSION"),
    about = "Scrub sensitive identifiers out of saved web pages",
    long_about = "pagescrub replaces tenant names, GUIDs, certificate thumbprints, resource names and usernames in a saved HTML page, including the lines of embedded code editors, so the page can be screenshotted, recorded or shared without leaking private values.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress the summary and all log output.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    /// Specify the path to a custom YAML theme file.
    #[arg(long = "theme", value_name = "FILE", global = true, env = "PAGESCRUB_THEME", help = "Specify the path to a custom YAML theme file.")]
    pub theme: Option<PathBuf>,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `pagescrub` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scrubs an HTML page from a file or stdin.
    #[command(about = "Scrubs an HTML page from a file or stdin.")]
    Scrub(ScrubCommand),

    /// Lists the built-in rules in the order they are applied.
    #[command(about = "Lists the built-in rules in the order they are applied.")]
    Rules(RulesCommand),
}

/// Arguments for the `scrub` command.
#[derive(Parser, Debug)]
pub struct ScrubCommand {
    /// Path to an input file (reads from stdin if not provided).
    #[arg(long, short = 'i', value_name = "FILE", help = "Read input from a specified file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    /// Write scrubbed output to this file instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE", help = "Write output to a specified file instead of stdout.")]
    pub output: Option<PathBuf>,

    /// Show a unified diff instead of the scrubbed page.
    #[arg(long, short = 'D', help = "Show a unified diff to highlight the changes made.")]
    pub diff: bool,

    /// Suppress the summary line.
    #[arg(long = "no-summary", help = "Suppress the run summary.")]
    pub no_summary: bool,

    /// Print per-rule hit counts before the summary line.
    #[arg(long = "rule-table", help = "Print a table of matches per rule.")]
    pub rule_table: bool,

    /// Export run statistics to a JSON file.
    #[arg(long = "json-stats", value_name = "FILE", help = "Export the run statistics to a JSON file.")]
    pub json_stats: Option<PathBuf>,
}

/// Arguments for the `rules` command.
#[derive(Parser, Debug)]
pub struct RulesCommand {
    /// Print the rules as JSON instead of a table.
    #[arg(long = "json", help = "Print the rules as JSON instead of a table.")]
    pub json: bool,
}
