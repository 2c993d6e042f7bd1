//! Terminal output: colors, messages, diffs and the run summary.

pub mod diff_viewer;
pub mod output_format;
pub mod run_summary;
pub mod theme;
