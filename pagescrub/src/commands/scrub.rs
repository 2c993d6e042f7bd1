//! `scrub` command: read a page, scrub it, write it back out.

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use log::{debug, info};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use pagescrub_core::{sanitize_html, RunStats, Sanitizer};

use crate::cli::ScrubCommand;
use crate::ui::diff_viewer;
use crate::ui::output_format;
use crate::ui::run_summary;
use crate::ui::theme::ThemeMap;

/// Options for a single scrub run, resolved from the command line.
pub struct ScrubOptions {
    pub input: String,
    pub diff: bool,
    pub output_path: Option<PathBuf>,
    pub json_stats_path: Option<PathBuf>,
    pub no_summary: bool,
    pub rule_table: bool,
    pub quiet: bool,
}

impl ScrubOptions {
    /// Reads the input named by `cmd` (or stdin) and captures the flags.
    pub fn from_command(cmd: &ScrubCommand, quiet: bool) -> Result<Self> {
        let input = match &cmd.input_file {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file: {}", path.display()))?,
            None => {
                let mut buffer = String::new();
                io::stdin()
                    .read_to_string(&mut buffer)
                    .context("Failed to read from stdin")?;
                buffer
            }
        };
        Ok(Self {
            input,
            diff: cmd.diff,
            output_path: cmd.output.clone(),
            json_stats_path: cmd.json_stats.clone(),
            no_summary: cmd.no_summary,
            rule_table: cmd.rule_table,
            quiet,
        })
    }
}

/// Helper for printing info messages to stderr.
pub fn info_msg(msg: impl AsRef<str>, theme: &ThemeMap) {
    let stderr_supports_color = io::stderr().is_terminal();
    let _ = output_format::print_info_message(&mut io::stderr(), msg.as_ref(), theme, stderr_supports_color);
}

/// Helper for printing error messages to stderr.
pub fn error_msg(msg: impl AsRef<str>, theme: &ThemeMap) {
    let stderr_supports_color = io::stderr().is_terminal();
    let _ = output_format::print_error_message(&mut io::stderr(), msg.as_ref(), theme, stderr_supports_color);
}

/// Runs one scrub and reports it.
pub fn run_scrub_opts(sanitizer: &Sanitizer, opts: ScrubOptions, theme_map: &ThemeMap) -> Result<RunStats> {
    info!("Starting scrub operation.");

    let (scrubbed, stats) = sanitize_html(sanitizer, &opts.input).context("Scrubbing failed")?;
    debug!(
        "Page scrubbed. Original length: {}, scrubbed length: {}",
        opts.input.len(),
        scrubbed.len()
    );

    handle_primary_output(&opts, &scrubbed, theme_map)?;

    if let Some(path) = &opts.json_stats_path {
        write_json_stats(&stats, path)?;
        if !opts.quiet {
            info_msg(format!("Run statistics written to {}", path.display()), theme_map);
        }
    }

    handle_run_summary(sanitizer, &stats, &opts, theme_map)?;

    info!("Scrub operation completed.");
    Ok(stats)
}

fn handle_primary_output(opts: &ScrubOptions, scrubbed: &str, theme_map: &ThemeMap) -> Result<()> {
    if let Some(path) = &opts.output_path {
        if !opts.quiet {
            info_msg(format!("Writing scrubbed content to file: {}", path.display()), theme_map);
        }
        let mut file = fs::File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        if opts.diff {
            diff_viewer::print_diff(&opts.input, scrubbed, &mut file, theme_map, false)?;
        } else {
            file.write_all(scrubbed.as_bytes())?;
        }
    } else {
        let stdout = io::stdout();
        let supports_color = stdout.is_terminal();
        let mut writer = stdout.lock();
        if opts.diff {
            diff_viewer::print_diff(&opts.input, scrubbed, &mut writer, theme_map, supports_color)?;
        } else {
            writer.write_all(scrubbed.as_bytes())?;
        }
        writer.flush()?;
    }
    Ok(())
}

fn write_json_stats(stats: &RunStats, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(stats).context("Failed to serialize run statistics")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write run statistics to {}", path.display()))
}

fn handle_run_summary(
    sanitizer: &Sanitizer,
    stats: &RunStats,
    opts: &ScrubOptions,
    theme_map: &ThemeMap,
) -> Result<()> {
    if !opts.no_summary && !opts.quiet {
        let stderr_supports_color = io::stderr().is_terminal();
        run_summary::print_summary(
            stats,
            sanitizer.rules(),
            opts.rule_table,
            &mut io::stderr(),
            theme_map,
            stderr_supports_color,
        )?;
    }
    Ok(())
}
