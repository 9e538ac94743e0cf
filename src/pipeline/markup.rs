//! Generic tag tree over `roxmltree`.
//!
//! The ingestion code only needs four things from a node: its tag name, its
//! attributes, its child elements and a text value. [`XmlNode`] is an owned
//! copy of exactly that, so callers never juggle `roxmltree` lifetimes.
//!
//! Multi-line text must not be read from [`XmlNode::value`] when fidelity
//! matters (it is trimmed and joined); use [`inner_text_from_source`] to
//! re-slice the original document instead.

use once_cell::sync::Lazy;
use regex::Regex;
use roxmltree::{Document, ParsingOptions};

/// One element of the parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    /// Trimmed concatenation of the element's direct text children.
    pub value: String,
}

impl XmlNode {
    /// First element named `tag` (ASCII case-insensitive), searching this
    /// node and then its descendants in document order.
    pub fn find_first(&self, tag: &str) -> Option<&XmlNode> {
        if self.name.eq_ignore_ascii_case(tag) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_first(tag))
    }

    /// Value of the first `tag` element, when it is non-empty.
    pub fn first_value(&self, tag: &str) -> Option<&str> {
        self.find_first(tag)
            .map(|n| n.value.as_str())
            .filter(|v| !v.is_empty())
    }
}

/// Parse `text` into an owned tag tree rooted at the document element.
pub fn parse(text: &str) -> Result<XmlNode, roxmltree::Error> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(text, options)?;
    Ok(convert(doc.root_element()))
}

fn convert(node: roxmltree::Node<'_, '_>) -> XmlNode {
    let attributes = node
        .attributes()
        .map(|a| (a.name().to_string(), a.value().to_string()))
        .collect();

    let mut value = String::new();
    let mut children = Vec::new();
    for child in node.children() {
        if child.is_element() {
            children.push(convert(child));
        } else if child.is_text() {
            if let Some(t) = child.text() {
                value.push_str(t);
            }
        }
    }

    XmlNode {
        name: node.tag_name().name().to_string(),
        attributes,
        children,
        value: value.trim().to_string(),
    }
}

static RE_CUSTOM_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<CustomText>(.*?)</CustomText>").unwrap());

/// Raw inner text of the first `<CustomText>` element, sliced straight from
/// the source document so embedded newlines survive untouched.
pub fn inner_text_from_source(source: &str) -> Option<&str> {
    RE_CUSTOM_TEXT
        .captures(source)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}
