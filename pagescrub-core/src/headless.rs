// File: pagescrub-core/src/headless.rs

//! `headless.rs`
//! Convenience wrappers for one-shot, non-interactive use: markup in,
//! scrubbed markup and counters out.

use anyhow::{Context, Result};
use log::debug;

use crate::dom::{Document, DocumentTree};
use crate::sanitizer::{RunStats, Sanitizer};

/// Parses `html`, scrubs it from the document root and serializes it again.
pub fn sanitize_html(sanitizer: &Sanitizer, html: &str) -> Result<(String, RunStats)> {
    let mut doc = Document::parse_html(html).context("Failed to read HTML input")?;
    let root = doc.root();
    let stats = sanitizer.sanitize(&mut doc, root);
    let output = doc.to_html();
    debug!(
        "Headless run complete. Input length: {}, output length: {}",
        html.len(),
        output.len()
    );
    Ok((output, stats))
}

/// [`sanitize_html`] with the built-in rule list.
pub fn headless_sanitize_html(html: &str) -> Result<(String, RunStats)> {
    let sanitizer = Sanitizer::with_default_rules().context("Failed to prepare default rules")?;
    sanitize_html(&sanitizer, html)
}
