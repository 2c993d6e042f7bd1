// pagescrub/src/logger.rs
//! Logger setup for the binary and the tests.
//!
//! `RUST_LOG` is honored unless a level is forced by the caller, which is how
//! `--quiet` and `--debug` take effect.

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Initializes `env_logger` on stderr. Safe to call more than once.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    builder.target(Target::Stderr).format_timestamp(None);
    if let Some(level) = level {
        builder.filter_level(level);
    }
    let _ = builder.try_init();
}
