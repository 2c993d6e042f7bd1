//! Minimal selectors: `tag`, `.class`, `tag.class.other`.
//!
//! Enough to find editor widgets and their parts without a CSS engine.

use std::fmt;
use std::str::FromStr;

use super::{DocumentTree, DomError, NodeKind};

/// A compound selector made of an optional tag and any number of classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleSelector {
    pub tag: Option<String>,
    pub classes: Vec<String>,
}

impl SimpleSelector {
    pub fn parse(selector: &str) -> Result<Self, DomError> {
        let invalid = || DomError::Selector(selector.to_string());
        let trimmed = selector.trim();
        if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
            return Err(invalid());
        }

        let mut parts = trimmed.split('.');
        let tag = match parts.next() {
            Some("") => None,
            Some(tag) if tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') => {
                Some(tag.to_ascii_lowercase())
            }
            _ => return Err(invalid()),
        };
        let classes: Vec<String> = parts.map(str::to_string).collect();
        if classes.iter().any(String::is_empty) {
            return Err(invalid());
        }
        Ok(Self { tag, classes })
    }

    pub fn matches<T: DocumentTree + ?Sized>(&self, tree: &T, node: T::Node) -> bool {
        if !matches!(tree.kind(node), Ok(NodeKind::Element)) {
            return false;
        }
        if let Some(tag) = &self.tag {
            match tree.tag_name(node) {
                Ok(name) if name == *tag => {}
                _ => return false,
            }
        }
        self.classes.iter().all(|class| tree.has_class(node, class))
    }
}

impl FromStr for SimpleSelector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(tag) = &self.tag {
            write!(f, "{}", tag)?;
        }
        for class in &self.classes {
            write!(f, ".{}", class)?;
        }
        Ok(())
    }
}

/// Every descendant of `scope` matching `selector`, in document order.
pub fn query_all<T: DocumentTree + ?Sized>(tree: &T, scope: T::Node, selector: &SimpleSelector) -> Vec<T::Node> {
    tree.descendants(scope)
        .into_iter()
        .filter(|&node| selector.matches(tree, node))
        .collect()
}

/// First descendant of `scope` matching `selector`.
pub fn query_first<T: DocumentTree + ?Sized>(
    tree: &T,
    scope: T::Node,
    selector: &SimpleSelector,
) -> Option<T::Node> {
    tree.descendants(scope)
        .into_iter()
        .find(|&node| selector.matches(tree, node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn parses_tag_and_classes() {
        let sel = SimpleSelector::parse("textarea.inputarea").unwrap();
        assert_eq!(sel.tag.as_deref(), Some("textarea"));
        assert_eq!(sel.classes, vec!["inputarea".to_string()]);
        assert_eq!(sel.to_string(), "textarea.inputarea");
        assert!(SimpleSelector::parse("div .x").is_err());
        assert!(SimpleSelector::parse("a..b").is_err());
    }

    #[test]
    fn class_match_is_token_based() {
        let doc = Document::parse_html(
            r#"<div class="view-lines"><div class="view-line x">a</div><div class="view-line">b</div></div>"#,
        )
        .unwrap();
        let line = SimpleSelector::parse(".view-line").unwrap();
        let lines = query_all(&doc, doc.root(), &line);
        assert_eq!(lines.len(), 2);
        let container = SimpleSelector::parse(".view-lines").unwrap();
        assert!(query_first(&doc, doc.root(), &container).is_some());
        assert!(query_first(&doc, lines[0], &container).is_none());
    }
}
