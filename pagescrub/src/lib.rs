// pagescrub/src/lib.rs
//! # pagescrub CLI
//!
//! Command-line front end for `pagescrub-core`: reads a saved HTML page,
//! scrubs it, and writes the result along with a short report.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;
