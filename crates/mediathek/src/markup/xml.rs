//! A small owned XML tree built from `quick-xml` events.
//!
//! Supports first-match and all-matches lookup by tag name (recursive
//! descent) and slash-separated path queries, which is all the legacy API
//! documents need.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::resolver::error::ResolveError;

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub nodes: Vec<XmlNode>,
}

impl XmlElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn children(&self) -> impl Iterator<Item = &XmlElement> {
        self.nodes.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// Concatenated text of this element and all descendants, trimmed.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out.trim().to_string()
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.nodes {
            match node {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(element) => element.collect_text(out),
            }
        }
    }

    /// First descendant named `tag`, depth-first in document order.
    pub fn find_first(&self, tag: &str) -> Option<&XmlElement> {
        for child in self.children() {
            if child.name == tag {
                return Some(child);
            }
            if let Some(found) = child.find_first(tag) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants named `tag`. Matches are not searched for nested matches.
    pub fn find_all(&self, tag: &str) -> Vec<&XmlElement> {
        let mut result = Vec::new();
        self.collect_all(tag, &mut result);
        result
    }

    fn collect_all<'a>(&'a self, tag: &str, result: &mut Vec<&'a XmlElement>) {
        for child in self.children() {
            if child.name == tag {
                result.push(child);
            } else {
                child.collect_all(tag, result);
            }
        }
    }

    /// Follows `a/b/c` through direct children, taking the first match at each step.
    pub fn path(&self, path: &str) -> Option<&XmlElement> {
        path.split('/')
            .filter(|step| !step.is_empty())
            .try_fold(self, |current, step| {
                current.children().find(|child| child.name == step)
            })
    }

    pub fn path_text(&self, path: &str) -> Option<String> {
        self.path(path)
            .map(XmlElement::text)
            .filter(|text| !text.is_empty())
    }

    /// `value` attribute of the first `param` child whose `name` attribute matches.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.children()
            .filter(|child| child.name == "param")
            .find(|child| child.attr("name") == Some(name))
            .and_then(|child| child.attr("value"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    pub fn parse(content: &str) -> Result<Self, ResolveError> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => stack.push(element_from_start(e)?),
                Event::Empty(ref e) => {
                    let element = element_from_start(e)?;
                    attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        ResolveError::XmlError("unbalanced closing tag".to_string())
                    })?;
                    attach(&mut stack, &mut root, element);
                }
                Event::Text(e) => {
                    if let Some(current) = stack.last_mut() {
                        current.nodes.push(XmlNode::Text(e.unescape()?.into_owned()));
                    }
                }
                Event::CData(e) => {
                    if let Some(current) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                        current.nodes.push(XmlNode::Text(text));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(ResolveError::XmlError("unexpected end of document".to_string()));
        }
        root.map(|root| Self { root })
            .ok_or_else(|| ResolveError::XmlError("document has no root element".to_string()))
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// First element named `tag`, the root included.
    pub fn find_first(&self, tag: &str) -> Option<&XmlElement> {
        if self.root.name == tag {
            return Some(&self.root);
        }
        self.root.find_first(tag)
    }

    pub fn find_all(&self, tag: &str) -> Vec<&XmlElement> {
        if self.root.name == tag {
            return vec![&self.root];
        }
        self.root.find_all(tag)
    }

    /// Evaluates an absolute (`/root/child`) or document-relative (`child/leaf`)
    /// path. Relative paths start at the first element matching their first step.
    pub fn query(&self, path: &str) -> Option<&XmlElement> {
        if let Some(absolute) = path.strip_prefix('/') {
            let (first, rest) = absolute.split_once('/').unwrap_or((absolute, ""));
            return (self.root.name == first)
                .then_some(&self.root)
                .and_then(|root| root.path(rest));
        }
        let (first, rest) = path.split_once('/').unwrap_or((path, ""));
        self.find_first(first).and_then(|start| start.path(rest))
    }

    pub fn query_text(&self, path: &str) -> Option<String> {
        self.query(path)
            .map(XmlElement::text)
            .filter(|text| !text.is_empty())
    }
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.nodes.push(XmlNode::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, ResolveError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ResolveError::XmlError(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name,
        attributes,
        nodes: Vec::new(),
    })
}
