//! In-memory document tree.
//!
//! Nodes live in an arena owned by [`Document`] and are addressed by
//! [`NodeId`]. Replacing an element's content detaches its old children; they
//! stay in the arena but are no longer reachable from the root.

use super::{html, DocumentTree, DomError, NodeKind};

/// Handle to a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Tag, attributes and live control value of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Lowercase tag name.
    pub name: String,
    /// Attributes in source order, values in their source (escaped) form.
    pub attrs: Vec<(String, String)>,
    /// Value written through [`DocumentTree::set_control_value`]; it wins over
    /// the markup when the element is serialized.
    pub live_value: Option<String>,
    /// Whether an end tag is written after the content. Parsed elements whose
    /// end tag was omitted keep it omitted.
    pub end_tag: bool,
}

impl ElementData {
    pub fn new(name: &str, attrs: Vec<(String, String)>) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs,
            live_value: None,
            end_tag: true,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attrs.push((name.to_ascii_lowercase(), value.to_string())),
        }
    }

    /// `input` and `textarea` hold a live value.
    pub fn is_value_control(&self) -> bool {
        matches!(self.name.as_str(), "input" | "textarea")
    }
}

/// Payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Doctype(String),
    Comment(String),
    Text(String),
    Element(ElementData),
}

impl NodeData {
    fn kind(&self) -> NodeKind {
        match self {
            NodeData::Document => NodeKind::Document,
            NodeData::Doctype(_) => NodeKind::Doctype,
            NodeData::Comment(_) => NodeKind::Comment,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Element(_) => NodeKind::Element,
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An arena-backed document. The root is always a [`NodeData::Document`].
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Slot>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document holding only its root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Slot {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Reads an HTML page or fragment.
    pub fn parse_html(markup: &str) -> Result<Self, DomError> {
        let mut doc = Self::new();
        let root = doc.root();
        html::parse_into(&mut doc, root, markup)?;
        Ok(doc)
    }

    /// Serializes the whole document back to HTML.
    pub fn to_html(&self) -> String {
        html::serialize_children(self, self.root())
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0).map(|slot| &slot.data)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|slot| slot.parent)
    }

    pub(crate) fn element_data_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.nodes.get_mut(id.0).map(|slot| &mut slot.data) {
            Some(NodeData::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn child_ids(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map_or(&[], |slot| slot.children.as_slice())
    }

    /// Appends a node under `parent`. Adjacent text nodes are kept apart, as
    /// in a live DOM after script edits.
    pub fn append(&mut self, parent: NodeId, data: NodeData) -> Result<NodeId, DomError> {
        match self.slot(parent)?.data {
            NodeData::Document | NodeData::Element(_) => {}
            _ => {
                return Err(DomError::WrongKind {
                    node: format!("{:?}", parent),
                    expected: "a container node",
                })
            }
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Slot {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.slot_mut(parent)?.children.push(id);
        Ok(id)
    }

    pub fn append_element(
        &mut self,
        parent: NodeId,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<NodeId, DomError> {
        let attrs = attrs
            .iter()
            .map(|(key, value)| (key.to_ascii_lowercase(), value.to_string()))
            .collect();
        self.append(parent, NodeData::Element(ElementData::new(name, attrs)))
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId, DomError> {
        self.append(parent, NodeData::Text(text.to_string()))
    }

    pub fn append_comment(&mut self, parent: NodeId, text: &str) -> Result<NodeId, DomError> {
        self.append(parent, NodeData::Comment(text.to_string()))
    }

    /// Concatenated text of all text nodes below (and including) `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match self.data(current) {
                Some(NodeData::Text(text)) => out.push_str(text),
                Some(NodeData::Element(_)) | Some(NodeData::Document) => {
                    stack.extend(self.child_ids(current).iter().rev().copied());
                }
                _ => {}
            }
        }
        out
    }

    fn slot(&self, id: NodeId) -> Result<&Slot, DomError> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| DomError::UnknownNode(format!("{:?}", id)))
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot, DomError> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| DomError::UnknownNode(format!("{:?}", id)))
    }

    fn element(&self, id: NodeId) -> Result<&ElementData, DomError> {
        match &self.slot(id)?.data {
            NodeData::Element(element) => Ok(element),
            _ => Err(wrong_kind(id, "an element")),
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        match &mut self.slot_mut(id)?.data {
            NodeData::Element(element) => Ok(element),
            _ => Err(wrong_kind(id, "an element")),
        }
    }
}

fn wrong_kind(id: NodeId, expected: &'static str) -> DomError {
    DomError::WrongKind {
        node: format!("{:?}", id),
        expected,
    }
}

impl DocumentTree for Document {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn kind(&self, node: NodeId) -> Result<NodeKind, DomError> {
        Ok(self.slot(node)?.data.kind())
    }

    fn text(&self, node: NodeId) -> Result<String, DomError> {
        match &self.slot(node)?.data {
            NodeData::Text(text) => Ok(text.clone()),
            _ => Err(wrong_kind(node, "a text node")),
        }
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        match &mut self.slot_mut(node)?.data {
            NodeData::Text(existing) => {
                *existing = text.to_string();
                Ok(())
            }
            _ => Err(wrong_kind(node, "a text node")),
        }
    }

    fn tag_name(&self, node: NodeId) -> Result<String, DomError> {
        Ok(self.element(node)?.name.clone())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, DomError> {
        Ok(self.element(node)?.attr(name).map(str::to_string))
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.element_mut(node)?.set_attr(name, value);
        Ok(())
    }

    fn children(&self, node: NodeId) -> Result<Vec<NodeId>, DomError> {
        Ok(self.slot(node)?.children.clone())
    }

    fn control_value(&self, node: NodeId) -> Result<Option<String>, DomError> {
        let element = match &self.slot(node)?.data {
            NodeData::Element(element) => element,
            _ => return Ok(None),
        };
        if let Some(live) = &element.live_value {
            return Ok(Some(live.clone()));
        }
        Ok(match element.name.as_str() {
            "input" => Some(element.attr("value").unwrap_or_default().to_string()),
            "textarea" => Some(self.text_content(node)),
            _ => None,
        })
    }

    fn set_control_value(&mut self, node: NodeId, value: &str) -> Result<(), DomError> {
        let element = self.element_mut(node)?;
        if !element.is_value_control() {
            return Err(wrong_kind(node, "a form control"));
        }
        element.live_value = Some(value.to_string());
        Ok(())
    }

    fn inner_markup(&self, node: NodeId) -> Result<String, DomError> {
        match self.slot(node)?.data {
            NodeData::Element(_) | NodeData::Document => Ok(html::serialize_children(self, node)),
            _ => Err(wrong_kind(node, "an element")),
        }
    }

    fn set_inner_markup(&mut self, node: NodeId, markup: &str) -> Result<(), DomError> {
        self.element(node)?;
        let previous = std::mem::take(&mut self.slot_mut(node)?.children);
        if let Err(e) = html::parse_into(self, node, markup) {
            self.slot_mut(node)?.children = previous;
            return Err(e);
        }
        for old in previous {
            if let Ok(slot) = self.slot_mut(old) {
                slot.parent = None;
            }
        }
        Ok(())
    }
}
