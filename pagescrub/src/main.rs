// pagescrub/src/main.rs
//! pagescrub entry point.
//!
//! Parses the command line, sets up logging and the theme, and dispatches to
//! the selected command.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;

use pagescrub::cli::{Cli, Commands};
use pagescrub::commands::rules::run_rules_command;
use pagescrub::commands::scrub::{error_msg, run_scrub_opts, ScrubOptions};
use pagescrub::logger;
use pagescrub::ui::theme::{build_theme_map, ThemeMap, ThemeStyle};
use pagescrub_core::Sanitizer;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.quiet {
        logger::init_logger(Some(log::LevelFilter::Off));
    } else if cli.debug {
        logger::init_logger(Some(log::LevelFilter::Debug));
    } else {
        logger::init_logger(None);
    }

    let theme_map = match build_theme_map(cli.theme.as_ref()) {
        Ok(theme_map) => theme_map,
        Err(e) => {
            let fallback = ThemeStyle::default_theme_map();
            error_msg(format!("{:#}", e), &fallback);
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, &theme_map) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error_msg(format!("{:#}", e), &theme_map);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, theme_map: &ThemeMap) -> Result<()> {
    match &cli.command {
        Commands::Scrub(cmd) => {
            let opts = ScrubOptions::from_command(cmd, cli.quiet)?;
            let sanitizer = Sanitizer::with_default_rules().context("Failed to prepare the rule list")?;
            run_scrub_opts(&sanitizer, opts, theme_map)?;
        }
        Commands::Rules(cmd) => run_rules_command(cmd)?,
    }
    Ok(())
}
