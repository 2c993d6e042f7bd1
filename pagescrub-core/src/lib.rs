// pagescrub-core/src/lib.rs
//! # pagescrub Core Library
//!
//! `pagescrub-core` removes sensitive identifiers (tenant names, GUIDs,
//! certificate thumbprints, resource names, usernames) from a document tree so
//! that screenshots, recordings and saved page snapshots can be shared.
//!
//! The library holds a fixed, ordered list of pattern/replacement rules and a
//! depth-first walk that applies them to text nodes, descriptive attributes,
//! form control values and the lines of embedded code editors. It works over
//! the [`DocumentTree`] trait, so any DOM-like structure can be scrubbed; the
//! in-memory [`Document`] with its HTML reader is provided.
//!
//! ## Modules
//!
//! * `config`: `ScrubRule`, `RuleSet` and the embedded default rule list.
//! * `sanitizers`: rule compilation, ordered application and caching.
//! * `dom`: the `DocumentTree` trait, selectors, `Document` and HTML I/O.
//! * `sanitizer`: the `Sanitizer` walk and its `RunStats`.
//! * `headless`: one-shot helpers over HTML strings.
//! * `redaction_log`: debug logging that masks original text.
//! * `errors`: the `ScrubError` type.
//!
//! ## Usage Example
//!
//! ```rust
//! use pagescrub_core::{Document, DocumentTree, Sanitizer};
//!
//! fn main() -> anyhow::Result<()> {
//!     let sanitizer = Sanitizer::with_default_rules()?;
//!     let mut doc = Document::parse_html(r#"<p title="owner: jagilber">jagilber</p>"#)?;
//!     let root = doc.root();
//!     let stats = sanitizer.sanitize(&mut doc, root);
//!
//!     assert_eq!(doc.to_html(), r#"<p title="owner: cloudadmin">cloudadmin</p>"#);
//!     assert_eq!(stats.substitutions, 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Loading and compiling rules and reading markup return errors
//! (`anyhow::Error`, [`ScrubError`], [`DomError`]). The walk itself never
//! fails: a node that cannot be read or written is skipped.
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod config;
pub mod dom;
pub mod errors;
pub mod headless;
pub mod redaction_log;
pub mod sanitizer;
pub mod sanitizers;

pub use config::{validate_rules, RuleSet, ScrubRule, MAX_PATTERN_LENGTH};

pub use errors::ScrubError;

pub use dom::{Document, DocumentTree, DomError, NodeId, NodeKind, SimpleSelector};

pub use sanitizer::{EditorWidget, RunStats, Sanitizer, DESCRIPTIVE_ATTRIBUTES, VALUE_CONTROL_TAGS};

pub use sanitizers::compiler::{
    compile_rules, find_shadowed_rules, get_or_compile_rules, CompiledRule, CompiledRules, RuleHits,
};

pub use headless::{headless_sanitize_html, sanitize_html};
