//! Document tree abstraction.
//!
//! The sanitizer never touches a concrete DOM. It walks any type implementing
//! [`DocumentTree`], which exposes just enough of a node: its kind, text,
//! attributes, children, the live value of form controls, and the serialized
//! markup of an element's content. [`Document`] is the in-memory
//! implementation used by the CLI and the tests; [`html`] reads and writes it.

use std::fmt;
use thiserror::Error;

pub mod document;
pub mod html;
pub mod query;

pub use document::{Document, ElementData, NodeData, NodeId};
pub use query::{query_all, query_first, SimpleSelector};

/// Discriminates the nodes a tree can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Doctype,
    Comment,
    Text,
    Element,
}

/// Failure to read or write a single node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DomError {
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Node {node} is not {expected}")]
    WrongKind { node: String, expected: &'static str },

    #[error("Invalid markup at byte {position}: {message}")]
    Markup { position: u64, message: String },

    #[error("Invalid selector '{0}'")]
    Selector(String),
}

/// Node-level access to a mutable document.
///
/// Handles are cheap copies; a handle that no longer resolves yields
/// [`DomError::UnknownNode`].
pub trait DocumentTree {
    type Node: Copy + Eq + fmt::Debug;

    /// The top of the tree.
    fn root(&self) -> Self::Node;

    fn kind(&self, node: Self::Node) -> Result<NodeKind, DomError>;

    /// Content of a text node.
    fn text(&self, node: Self::Node) -> Result<String, DomError>;

    fn set_text(&mut self, node: Self::Node, text: &str) -> Result<(), DomError>;

    /// Lowercase tag name of an element.
    fn tag_name(&self, node: Self::Node) -> Result<String, DomError>;

    fn attribute(&self, node: Self::Node, name: &str) -> Result<Option<String>, DomError>;

    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str) -> Result<(), DomError>;

    /// Child handles in document order.
    fn children(&self, node: Self::Node) -> Result<Vec<Self::Node>, DomError>;

    /// Live value of a form control; `None` for anything that holds no value.
    fn control_value(&self, node: Self::Node) -> Result<Option<String>, DomError>;

    fn set_control_value(&mut self, node: Self::Node, value: &str) -> Result<(), DomError>;

    /// Serialized markup of an element's children, structural wrappers included.
    fn inner_markup(&self, node: Self::Node) -> Result<String, DomError>;

    /// Replaces an element's children by parsing `markup`.
    fn set_inner_markup(&mut self, node: Self::Node, markup: &str) -> Result<(), DomError>;

    /// Whether the element's `class` attribute contains `class` as a token.
    fn has_class(&self, node: Self::Node, class: &str) -> bool {
        match self.attribute(node, "class") {
            Ok(Some(classes)) => classes.split_ascii_whitespace().any(|c| c == class),
            _ => false,
        }
    }

    /// All nodes below `node` in pre-order, `node` itself excluded.
    fn descendants(&self, node: Self::Node) -> Vec<Self::Node> {
        let mut found = Vec::new();
        let mut stack: Vec<Self::Node> = self.children(node).unwrap_or_default();
        stack.reverse();
        while let Some(current) = stack.pop() {
            found.push(current);
            if let Ok(children) = self.children(current) {
                stack.extend(children.into_iter().rev());
            }
        }
        found
    }
}
