//! A small structured XML builder.
//!
//! Parts are assembled as trees of [`XmlNode`] and serialized through
//! `quick_xml::Writer`, so attribute and child order is exactly insertion
//! order and escaping is handled in one place.

use deckgen_core::{Error, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::{Cursor, Write};

/// Declaration written at the top of every part.
pub const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n";

/// A child of an element.
#[derive(Debug, Clone, PartialEq)]
enum XmlChild {
    Node(XmlNode),
    /// Text to be escaped on output.
    Text(String),
    /// Pre-escaped markup copied verbatim.
    Raw(String),
}

/// An element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlNode {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlChild>,
}

impl XmlNode {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of an attribute, if set.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Child elements, in order.
    pub fn child_nodes(&self) -> impl Iterator<Item = &XmlNode> {
        self.children.iter().filter_map(|c| match c {
            XmlChild::Node(n) => Some(n),
            _ => None,
        })
    }

    /// Append an attribute.
    pub fn attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push((key.into(), value.to_string()));
        self
    }

    /// Append an attribute when a value is present.
    pub fn attr_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.attr(key, v),
            None => self,
        }
    }

    /// Append a child element.
    pub fn child(mut self, node: XmlNode) -> Self {
        self.children.push(XmlChild::Node(node));
        self
    }

    /// Append a child element when present.
    pub fn child_opt(self, node: Option<XmlNode>) -> Self {
        match node {
            Some(n) => self.child(n),
            None => self,
        }
    }

    /// Append several child elements.
    pub fn children(mut self, nodes: impl IntoIterator<Item = XmlNode>) -> Self {
        self.children
            .extend(nodes.into_iter().map(XmlChild::Node));
        self
    }

    /// Append escaped text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlChild::Text(text.into()));
        self
    }

    /// Append a pre-escaped markup fragment.
    pub fn raw(mut self, fragment: impl Into<String>) -> Self {
        self.children.push(XmlChild::Raw(fragment.into()));
        self
    }

    /// Append a child element in place.
    pub fn push(&mut self, node: XmlNode) {
        self.children.push(XmlChild::Node(node));
    }

    /// Serialize into an existing writer.
    pub fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            return writer.write_event(Event::Empty(start)).map_err(xml_error);
        }

        writer.write_event(Event::Start(start)).map_err(xml_error)?;
        for child in &self.children {
            match child {
                XmlChild::Node(node) => node.write_to(writer)?,
                XmlChild::Text(text) => writer
                    .write_event(Event::Text(BytesText::new(text)))
                    .map_err(xml_error)?,
                XmlChild::Raw(fragment) => writer
                    .get_mut()
                    .write_all(fragment.as_bytes())
                    .map_err(|e| Error::XmlError(e.to_string()))?,
            }
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(xml_error)
    }

    /// Serialize this element alone, without a declaration.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        self.write_to(&mut writer)?;
        into_string(writer)
    }

    /// Serialize as a complete part: declaration, CRLF, then the element.
    pub fn to_document(&self) -> Result<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_error)?;
        writer
            .get_mut()
            .write_all(b"\r\n")
            .map_err(|e| Error::XmlError(e.to_string()))?;
        self.write_to(&mut writer)?;
        into_string(writer)
    }
}

fn into_string(writer: Writer<Cursor<Vec<u8>>>) -> Result<String> {
    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| Error::XmlError(format!("Invalid UTF-8 in XML: {}", e)))
}

fn xml_error(e: quick_xml::Error) -> Error {
    Error::XmlError(e.to_string())
}
