//! The tree-walking sanitizer.
//!
//! [`Sanitizer::sanitize`] runs the compiled rules over every in-scope string
//! reachable from a root node and mutates the tree in place:
//!
//! 1. text nodes, counted once per node that changed;
//! 2. the descriptive attributes in [`DESCRIPTIVE_ATTRIBUTES`];
//! 3. the live value of `input` and `textarea` controls;
//! 4. children, in document order.
//!
//! A second pass handles embedded code editors, whose lines are split into
//! styling spans. Rules run over each line's serialized markup so that an
//! identifier cut across two spans still matches.
//!
//! Failures to read or write a single node are logged and skipped. Nothing in
//! here returns an error.

use log::{debug, info};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::config::RuleSet;
use crate::dom::{query_all, query_first, DocumentTree, NodeKind, SimpleSelector};
use crate::errors::ScrubError;
use crate::redaction_log::log_scrub_debug;
use crate::sanitizers::compiler::{get_or_compile_rules, CompiledRules, RuleHits};

/// Attributes that carry user-visible descriptive text.
pub const DESCRIPTIVE_ATTRIBUTES: [&str; 5] = ["aria-label", "title", "placeholder", "value", "data-original-title"];

/// Tags whose live value is scrubbed.
pub const VALUE_CONTROL_TAGS: [&str; 2] = ["input", "textarea"];

/// Counters accumulated over one [`Sanitizer::sanitize`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Text nodes and editor lines whose content changed.
    pub substitutions: usize,
    /// Editor lines and hidden editor inputs whose content changed.
    pub widget_regions_modified: usize,
    /// Matches per rule that actually altered text.
    pub rule_hits: RuleHits,
}

impl RunStats {
    pub fn is_clean(&self) -> bool {
        self.substitutions == 0 && self.widget_regions_modified == 0
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "✓ Sanitized {} items, {} editor regions",
            self.substitutions, self.widget_regions_modified
        )
    }
}

/// Selectors locating an embedded code editor and its parts.
#[derive(Debug, Clone)]
pub struct EditorWidget {
    pub container: SimpleSelector,
    pub lines_container: SimpleSelector,
    pub line: SimpleSelector,
    pub hidden_input: SimpleSelector,
}

impl EditorWidget {
    /// The Monaco editor markup used by the portal's JSON views.
    pub fn monaco() -> Self {
        Self {
            container: selector(None, "monaco-editor"),
            lines_container: selector(None, "view-lines"),
            line: selector(None, "view-line"),
            hidden_input: selector(Some("textarea"), "inputarea"),
        }
    }
}

impl Default for EditorWidget {
    fn default() -> Self {
        Self::monaco()
    }
}

fn selector(tag: Option<&str>, class: &str) -> SimpleSelector {
    SimpleSelector {
        tag: tag.map(str::to_string),
        classes: vec![class.to_string()],
    }
}

/// Applies an ordered rule list to a document tree.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    rules: Arc<CompiledRules>,
    widget: EditorWidget,
}

impl Sanitizer {
    pub fn new(rules: Arc<CompiledRules>) -> Self {
        Self {
            rules,
            widget: EditorWidget::default(),
        }
    }

    /// A sanitizer over the built-in rule list.
    pub fn with_default_rules() -> Result<Self, ScrubError> {
        let rule_set = RuleSet::load_default_rules()?;
        Ok(Self::new(get_or_compile_rules(&rule_set)?))
    }

    pub fn with_widget(mut self, widget: EditorWidget) -> Self {
        self.widget = widget;
        self
    }

    pub fn rules(&self) -> &CompiledRules {
        &self.rules
    }

    /// Scrubs everything reachable from `root` and returns the counters.
    pub fn sanitize<T: DocumentTree + ?Sized>(&self, tree: &mut T, root: T::Node) -> RunStats {
        let mut stats = RunStats::default();
        self.walk(tree, root, &mut stats);
        self.scrub_widgets(tree, root, &mut stats);
        info!(
            "Sanitize run finished: {} substitutions, {} editor regions.",
            stats.substitutions, stats.widget_regions_modified
        );
        stats
    }

    fn walk<T: DocumentTree + ?Sized>(&self, tree: &mut T, root: T::Node, stats: &mut RunStats) {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            let kind = match tree.kind(node) {
                Ok(kind) => kind,
                Err(e) => {
                    debug!("Skipping unreadable node: {}", e);
                    continue;
                }
            };
            match kind {
                NodeKind::Text => self.scrub_text(tree, node, stats),
                NodeKind::Element => {
                    self.scrub_attributes(tree, node, stats);
                    self.scrub_control_value(tree, node, stats);
                }
                NodeKind::Document => {}
                NodeKind::Comment | NodeKind::Doctype => continue,
            }
            match tree.children(node) {
                Ok(children) => stack.extend(children.into_iter().rev()),
                Err(e) => debug!("Skipping children of unreadable node: {}", e),
            }
        }
    }

    fn scrub_text<T: DocumentTree + ?Sized>(&self, tree: &mut T, node: T::Node, stats: &mut RunStats) {
        let original = match tree.text(node) {
            Ok(text) => text,
            Err(e) => {
                debug!("Skipping text node: {}", e);
                return;
            }
        };
        let scrubbed = self.rules.apply_counted(&original, &mut stats.rule_hits);
        if scrubbed == original {
            return;
        }
        log_scrub_debug("text", &original, &scrubbed);
        match tree.set_text(node, &scrubbed) {
            Ok(()) => stats.substitutions += 1,
            Err(e) => debug!("Could not write text node: {}", e),
        }
    }

    /// Present whitelisted attributes are written back whether or not they changed.
    fn scrub_attributes<T: DocumentTree + ?Sized>(&self, tree: &mut T, node: T::Node, stats: &mut RunStats) {
        for name in DESCRIPTIVE_ATTRIBUTES {
            let value = match tree.attribute(node, name) {
                Ok(Some(value)) => value,
                Ok(None) => continue,
                Err(e) => {
                    debug!("Skipping attribute '{}': {}", name, e);
                    continue;
                }
            };
            let scrubbed = self.rules.apply_counted(&value, &mut stats.rule_hits);
            if let Err(e) = tree.set_attribute(node, name, &scrubbed) {
                debug!("Could not write attribute '{}': {}", name, e);
            }
        }
    }

    fn scrub_control_value<T: DocumentTree + ?Sized>(&self, tree: &mut T, node: T::Node, stats: &mut RunStats) {
        match tree.tag_name(node) {
            Ok(tag) if VALUE_CONTROL_TAGS.contains(&tag.as_str()) => {}
            _ => return,
        }
        let value = match tree.control_value(node) {
            Ok(Some(value)) if !value.is_empty() => value,
            _ => return,
        };
        let scrubbed = self.rules.apply_counted(&value, &mut stats.rule_hits);
        if let Err(e) = tree.set_control_value(node, &scrubbed) {
            debug!("Could not write control value: {}", e);
        }
    }

    fn scrub_widgets<T: DocumentTree + ?Sized>(&self, tree: &mut T, root: T::Node, stats: &mut RunStats) {
        let mut editors = query_all(&*tree, root, &self.widget.container);
        if self.widget.container.matches(&*tree, root) {
            editors.insert(0, root);
        }
        debug!("Found {} editor widget(s).", editors.len());

        for editor in editors {
            if let Some(lines_container) = query_first(&*tree, editor, &self.widget.lines_container) {
                for line in query_all(&*tree, lines_container, &self.widget.line) {
                    self.scrub_line_markup(tree, line, stats);
                }
            }

            if let Some(input) = query_first(&*tree, editor, &self.widget.hidden_input) {
                self.scrub_hidden_input(tree, input, stats);
            }
        }
    }

    /// A changed line counts as a substitution and as a widget change.
    fn scrub_line_markup<T: DocumentTree + ?Sized>(&self, tree: &mut T, line: T::Node, stats: &mut RunStats) {
        let original = match tree.inner_markup(line) {
            Ok(markup) => markup,
            Err(e) => {
                debug!("Skipping editor line: {}", e);
                return;
            }
        };
        let scrubbed = self.rules.apply_counted(&original, &mut stats.rule_hits);
        if scrubbed == original {
            return;
        }
        log_scrub_debug("editor line", &original, &scrubbed);
        match tree.set_inner_markup(line, &scrubbed) {
            Ok(()) => {
                stats.widget_regions_modified += 1;
                stats.substitutions += 1;
            }
            Err(e) => debug!("Could not rewrite editor line: {}", e),
        }
    }

    /// A changed hidden input only counts as a widget change.
    fn scrub_hidden_input<T: DocumentTree + ?Sized>(&self, tree: &mut T, input: T::Node, stats: &mut RunStats) {
        let original = match tree.control_value(input) {
            Ok(Some(value)) if !value.is_empty() => value,
            _ => return,
        };
        let scrubbed = self.rules.apply_counted(&original, &mut stats.rule_hits);
        if scrubbed == original {
            return;
        }
        match tree.set_control_value(input, &scrubbed) {
            Ok(()) => stats.widget_regions_modified += 1,
            Err(e) => debug!("Could not write editor input: {}", e),
        }
    }
}
