//! Minimal XML document tree.
//!
//! Manifests are small, so the whole document is materialized as nested
//! [`XmlNode`]s; unit parsing then walks the tree by element name.

use std::path::Path;

use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

use super::DescriptorError;

/// One XML element with its attributes, text and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All child elements with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value, falling back to the text of a child element.
    ///
    /// Manifests carry identity either as `<commercetheme name="x">` or as
    /// `<commercetheme><name>x</name></commercetheme>`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.attr(name)
            .or_else(|| self.child(name).map(XmlNode::text))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Trimmed text content of this element.
    pub fn text(&self) -> &str {
        self.text.trim()
    }
}

/// Parse an XML string into its root element.
pub fn parse_str(xml: &str) -> Result<XmlNode, String> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(element(&e)?),
            Ok(Event::Empty(e)) => attach(&mut stack, &mut root, element(&e)?),
            Ok(Event::End(_)) => {
                let node = stack.pop().ok_or("unexpected closing tag")?;
                attach(&mut stack, &mut root, node);
            }
            Ok(Event::Text(t)) => push_text(&mut stack, &String::from_utf8_lossy(&t)),
            Ok(Event::CData(c)) => push_text(&mut stack, &String::from_utf8_lossy(&c)),
            Ok(Event::GeneralRef(r)) => {
                let name = String::from_utf8_lossy(&r);
                let resolved = resolve_entity(&name)
                    .ok_or_else(|| format!("unknown entity `&{name};`"))?;
                push_text(&mut stack, &resolved);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!("{} (at byte {})", e, reader.error_position()));
            }
        }
    }

    if !stack.is_empty() {
        return Err(format!("unclosed element <{}>", stack[stack.len() - 1].name));
    }
    root.ok_or_else(|| "document has no root element".to_string())
}

/// Read and parse an XML file.
pub fn parse_file(path: &Path) -> Result<XmlNode, DescriptorError> {
    let content = std::fs::read_to_string(path).map_err(|source| DescriptorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_str(&content).map_err(|message| DescriptorError::Xml {
        path: path.to_path_buf(),
        message,
    })
}

fn element(start: &BytesStart<'_>) -> Result<XmlNode, String> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| format!("bad attribute on <{name}>: {e}"))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw = String::from_utf8_lossy(&attr.value);
        let value = quick_xml::escape::unescape(&raw)
            .map_err(|e| format!("bad attribute `{key}` on <{name}>: {e}"))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(XmlNode {
        name,
        attributes,
        ..XmlNode::default()
    })
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}

fn push_text(stack: &mut [XmlNode], text: &str) {
    if let Some(top) = stack.last_mut() {
        top.text.push_str(text);
    }
}

/// Resolve a predefined or numeric character entity.
fn resolve_entity(name: &str) -> Option<String> {
    let predefined = match name {
        "amp" => Some("&"),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "quot" => Some("\""),
        "apos" => Some("'"),
        _ => None,
    };
    if let Some(s) = predefined {
        return Some(s.to_string());
    }

    let numeric = name.strip_prefix('#')?;
    let code = match numeric.strip_prefix('x').or_else(|| numeric.strip_prefix('X')) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => numeric.parse().ok()?,
    };
    char::from_u32(code).map(String::from)
}
