//! Lenient HTML reading and writing for [`Document`].
//!
//! The reader scans the page the way an HTML tokenizer does: a `<` only opens
//! markup when a letter, `/`, `!` or `?` follows it, so a bare `<` in text stays
//! text. Each start or end tag is then handed to `quick-xml` on its own to read
//! the name and the (possibly unquoted or valueless) attributes.
//!
//! Tree construction is forgiving:
//!
//! * void elements never take children;
//! * `script`, `style`, `textarea` and `title` bodies are raw text up to a
//!   case-insensitive matching end tag;
//! * the common implied end tags (`p`, `li`, `dt`/`dd`, `option`, table parts)
//!   are honored;
//! * a stray end tag closes the nearest open element of the same name or is
//!   ignored.
//!
//! Text and attribute values are stored exactly as written (entities are not
//! decoded), and elements remember whether their end tag was present, so an
//! untouched page is written back with the same structure and text.

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::document::{Document, ElementData, NodeData, NodeId};
use super::DomError;

/// Elements that never have content or an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is text, even if it looks like markup.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Start tags that end an open `p`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main", "menu",
    "nav", "ol", "p", "pre", "section", "table", "ul",
];

/// Elements an implied end tag never reaches past.
const SCOPE_BOUNDARIES: &[&str] = &[
    "applet", "button", "caption", "html", "marquee", "object", "table", "td", "template", "th",
];

const LIST_BOUNDARIES: &[&str] = &[
    "ol", "ul", "applet", "button", "caption", "html", "marquee", "object", "table", "td",
    "template", "th",
];

pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Parses `markup` and appends the resulting nodes under `parent`.
pub fn parse_into(doc: &mut Document, parent: NodeId, markup: &str) -> Result<(), DomError> {
    let mut open = vec![parent];
    let mut pos = 0;

    while pos < markup.len() {
        let current = open.last().copied().unwrap_or(parent);
        let Some(start) = next_markup_start(markup, pos) else {
            append_text(doc, current, &markup[pos..])?;
            break;
        };
        append_text(doc, current, &markup[pos..start])?;

        let Some(end) = markup_end(markup, start) else {
            debug!("Unterminated markup at byte {}; keeping the rest as text", start);
            append_text(doc, current, &markup[start..])?;
            break;
        };
        pos = read_markup(doc, &mut open, parent, markup, start, end)?;
    }
    Ok(())
}

/// Byte offset of the next `<` that opens a tag, comment or declaration.
fn next_markup_start(markup: &str, from: usize) -> Option<usize> {
    let bytes = markup.as_bytes();
    let mut at = from;
    while let Some(offset) = markup[at..].find('<') {
        let lt = at + offset;
        let opens = match bytes.get(lt + 1) {
            Some(c) if c.is_ascii_alphabetic() => true,
            Some(b'!') | Some(b'?') => true,
            Some(b'/') => bytes.get(lt + 2).is_some_and(|c| c.is_ascii_alphabetic()),
            _ => false,
        };
        if opens {
            return Some(lt);
        }
        at = lt + 1;
    }
    None
}

/// Exclusive end of the markup starting at `start`. Quotes only delimit
/// attribute values, so a `>` inside one does not end the tag.
fn markup_end(markup: &str, start: usize) -> Option<usize> {
    let rest = &markup[start..];
    if rest.starts_with("<!--") {
        return rest[4..].find("-->").map(|i| start + 4 + i + 3);
    }
    if rest.starts_with("<![CDATA[") {
        return rest.find("]]>").map(|i| start + i + 3);
    }
    if rest.starts_with("<!") || rest.starts_with("<?") {
        return rest.find('>').map(|i| start + i + 1);
    }

    let mut quote = None;
    let mut after_equals = false;
    for (i, &b) in rest.as_bytes().iter().enumerate().skip(1) {
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'>' => return Some(start + i + 1),
                b'"' | b'\'' if after_equals => quote = Some(b),
                b'=' => {
                    after_equals = true;
                    continue;
                }
                b if b.is_ascii_whitespace() && after_equals => continue,
                _ => {}
            },
        }
        after_equals = false;
    }
    None
}

/// Reads one piece of markup spanning `start..end` and returns where to resume.
fn read_markup(
    doc: &mut Document,
    open: &mut Vec<NodeId>,
    parent: NodeId,
    markup: &str,
    start: usize,
    end: usize,
) -> Result<usize, DomError> {
    let raw = &markup[start..end];
    let current = open.last().copied().unwrap_or(parent);

    if raw.starts_with("<!--") {
        doc.append(current, NodeData::Comment(raw[4..raw.len() - 3].to_string()))?;
        return Ok(end);
    }
    if raw.starts_with("<![CDATA[") {
        doc.append(current, NodeData::Text(raw.to_string()))?;
        return Ok(end);
    }
    if let Some(body) = raw.strip_prefix("<!") {
        let body = &body[..body.len() - 1];
        let node = match body.get(..7) {
            Some(keyword) if keyword.eq_ignore_ascii_case("doctype") => {
                NodeData::Doctype(body[7..].trim().to_string())
            }
            _ => NodeData::Comment(body.to_string()),
        };
        doc.append(current, node)?;
        return Ok(end);
    }
    if raw.starts_with("<?") {
        doc.append(current, NodeData::Comment(raw[1..raw.len() - 1].to_string()))?;
        return Ok(end);
    }

    let mut reader = Reader::from_str(raw);
    {
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
    }
    let event = reader
        .read_event()
        .map_err(|e| DomError::Markup {
            position: start as u64 + reader.error_position(),
            message: e.to_string(),
        })?;

    match event {
        Event::Start(tag) => open_element(doc, open, parent, element_data(&tag), markup, end, false),
        Event::Empty(tag) => open_element(doc, open, parent, element_data(&tag), markup, end, true),
        Event::End(tag) => {
            close_element(doc, open, &lowercase(tag.name().as_ref()));
            Ok(end)
        }
        other => {
            debug!("Ignoring unexpected markup event {:?}", other);
            Ok(end)
        }
    }
}

fn open_element(
    doc: &mut Document,
    open: &mut Vec<NodeId>,
    parent: NodeId,
    mut element: ElementData,
    markup: &str,
    pos: usize,
    self_closing: bool,
) -> Result<usize, DomError> {
    close_implied(doc, open, &element.name);

    let name = element.name.clone();
    // `<div/>` is written back as `<div></div>` so it cannot swallow its siblings.
    element.end_tag = self_closing && !is_void(&name);
    let current = open.last().copied().unwrap_or(parent);
    let id = doc.append(current, NodeData::Element(element))?;

    if self_closing || is_void(&name) {
        return Ok(pos);
    }
    if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
        return read_raw_text(doc, id, &name, markup, pos);
    }
    open.push(id);
    Ok(pos)
}

/// Appends everything up to the matching end tag as a single text node.
fn read_raw_text(doc: &mut Document, id: NodeId, name: &str, markup: &str, from: usize) -> Result<usize, DomError> {
    let Some(close) = find_end_tag(markup, from, name) else {
        append_text(doc, id, &markup[from..])?;
        return Ok(markup.len());
    };
    append_text(doc, id, &markup[from..close])?;
    mark_closed(doc, id);
    Ok(markup_end(markup, close).unwrap_or(markup.len()))
}

/// Offset of `</name` (any case) followed by whitespace, `/`, `>` or the end.
fn find_end_tag(markup: &str, from: usize, name: &str) -> Option<usize> {
    let lowered = markup[from..].to_ascii_lowercase();
    let needle = format!("</{}", name);
    let mut at = 0;
    while let Some(i) = lowered[at..].find(&needle) {
        let hit = at + i;
        match lowered.as_bytes().get(hit + needle.len()) {
            None | Some(b'>') | Some(b'/') => return Some(from + hit),
            Some(b) if b.is_ascii_whitespace() => return Some(from + hit),
            _ => at = hit + needle.len(),
        }
    }
    None
}

fn close_element(doc: &mut Document, open: &mut Vec<NodeId>, name: &str) {
    let tree: &Document = doc;
    let found = open.iter().skip(1).rposition(|&id| element_name(tree, id) == Some(name));
    match found {
        Some(pos) => {
            let index = pos + 1;
            mark_closed(doc, open[index]);
            open.truncate(index);
        }
        None => debug!("Ignoring unmatched end tag </{}>", name),
    }
}

/// Pops the elements a start tag for `name` implicitly ends.
fn close_implied(doc: &Document, open: &mut Vec<NodeId>, name: &str) {
    let target = match name {
        "li" => nearest_open(doc, open, &["li"], LIST_BOUNDARIES),
        "dt" | "dd" => nearest_open(doc, open, &["dt", "dd"], &["dl"]),
        "option" => nearest_open(doc, open, &["option"], &["select", "datalist", "optgroup"]),
        "optgroup" => nearest_open(doc, open, &["optgroup"], &["select"])
            .or_else(|| nearest_open(doc, open, &["option"], &["select"])),
        "tr" => nearest_open(doc, open, &["tr"], &["table"]),
        "td" | "th" => nearest_open(doc, open, &["td", "th"], &["tr", "table"]),
        "thead" | "tbody" | "tfoot" => nearest_open(doc, open, &["thead", "tbody", "tfoot"], &["table"]),
        _ if CLOSES_PARAGRAPH.contains(&name) => nearest_open(doc, open, &["p"], SCOPE_BOUNDARIES),
        _ => None,
    };
    if let Some(index) = target {
        open.truncate(index);
    }
}

/// Stack index of the innermost open element named in `names`, unless a
/// boundary element sits above it. The parse root is never returned.
fn nearest_open(doc: &Document, open: &[NodeId], names: &[&str], boundaries: &[&str]) -> Option<usize> {
    for index in (1..open.len()).rev() {
        let Some(name) = element_name(doc, open[index]) else {
            continue;
        };
        if names.contains(&name) {
            return Some(index);
        }
        if boundaries.contains(&name) {
            return None;
        }
    }
    None
}

fn element_name(doc: &Document, id: NodeId) -> Option<&str> {
    match doc.data(id) {
        Some(NodeData::Element(element)) => Some(element.name.as_str()),
        _ => None,
    }
}

fn mark_closed(doc: &mut Document, id: NodeId) {
    if let Some(element) = doc.element_data_mut(id) {
        element.end_tag = true;
    }
}

fn append_text(doc: &mut Document, parent: NodeId, text: &str) -> Result<(), DomError> {
    if !text.is_empty() {
        doc.append(parent, NodeData::Text(text.to_string()))?;
    }
    Ok(())
}

fn element_data(start: &BytesStart) -> ElementData {
    let name = lowercase(start.name().as_ref());
    let mut attrs = Vec::new();
    for attr in start.html_attributes() {
        match attr {
            Ok(attr) => attrs.push((
                lowercase(attr.key.as_ref()),
                String::from_utf8_lossy(&attr.value).into_owned(),
            )),
            Err(e) => debug!("Skipping malformed attribute on <{}>: {}", name, e),
        }
    }
    ElementData::new(&name, attrs)
}

fn lowercase(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

/// Serializes the children of `node`.
pub fn serialize_children(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    for &child in doc.child_ids(node) {
        write_node(doc, child, &mut out);
    }
    out
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    match doc.data(id) {
        Some(NodeData::Text(text)) => out.push_str(text),
        Some(NodeData::Comment(comment)) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        Some(NodeData::Doctype(doctype)) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(doctype);
            out.push('>');
        }
        Some(NodeData::Element(element)) => write_element(doc, id, element, out),
        Some(NodeData::Document) => {
            for &child in doc.child_ids(id) {
                write_node(doc, child, out);
            }
        }
        None => {}
    }
}

fn write_element(doc: &Document, id: NodeId, element: &ElementData, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);

    let live_input_value = match (&element.live_value, element.name.as_str()) {
        (Some(value), "input") => Some(value.as_str()),
        _ => None,
    };
    for (key, value) in &element.attrs {
        if key == "value" && live_input_value.is_some() {
            continue;
        }
        write_attribute(key, value, out);
    }
    if let Some(value) = live_input_value {
        write_attribute("value", value, out);
    }
    out.push('>');

    if is_void(&element.name) {
        return;
    }

    match (&element.live_value, element.name.as_str()) {
        (Some(value), "textarea") => out.push_str(value),
        _ => {
            for &child in doc.child_ids(id) {
                write_node(doc, child, out);
            }
        }
    }

    if element.end_tag {
        out.push_str("</");
        out.push_str(&element.name);
        out.push('>');
    }
}

fn write_attribute(key: &str, value: &str, out: &mut String) {
    out.push(' ');
    out.push_str(key);
    out.push_str("=\"");
    out.push_str(&value.replace('"', "&quot;"));
    out.push('"');
}
