//! Namespace-aware XML document tree.
//!
//! The reader works over a fully materialized element tree rather than a
//! streaming event feed, so every resolver can be a pure, restartable
//! read of the same immutable document. This module is the only place
//! that touches quick-xml.

use std::fmt::Write as _;

use quick_xml::events::attributes::AttrError;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use thiserror::Error;

/// Error from materializing a document tree.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed XML: {0}")]
    Malformed(#[from] quick_xml::Error),
    #[error("malformed XML attribute: {0}")]
    Attribute(#[from] AttrError),
    #[error("document has no root element")]
    NoRoot,
}

/// One element of the tree: resolved namespace, local name, attributes,
/// child elements and concatenated text content.
#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    namespace: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    /// Local (unqualified) element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved namespace URI, if the element is namespace-qualified.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Attribute value by exact, case-sensitive name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated, whitespace-trimmed text content.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// All child elements in document order.
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter()
    }

    /// Child elements matching a qualified name, in document order.
    pub fn children_named<'a>(
        &'a self,
        namespace: Option<&'a str>,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children
            .iter()
            .filter(move |child| child.name == name && child.namespace.as_deref() == namespace)
    }

    /// First child element matching a qualified name.
    pub fn child(&self, namespace: Option<&str>, name: &str) -> Option<&Element> {
        self.children
            .iter()
            .find(|child| child.name == name && child.namespace.as_deref() == namespace)
    }

    /// Serialized opening-tag form, used in diagnostics.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            let _ = write!(out, " {}=\"{}\"", key, value);
        }
        out.push_str(" />");
        out
    }
}

/// An immutable parsed document.
#[derive(Debug, Clone)]
pub struct Document {
    root: Element,
}

impl Document {
    /// Materialize a tree from XML text.
    pub fn parse(xml: &str) -> Result<Self, DocumentError> {
        let mut reader = NsReader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_resolved_event()? {
                (resolve, Event::Start(start)) => {
                    let element = open_element(&resolve, &start)?;
                    stack.push(element);
                }
                (_, Event::End(_)) => {
                    if let Some(element) = stack.pop() {
                        attach(element, &mut stack, &mut root);
                    }
                }
                (resolve, Event::Empty(start)) => {
                    let element = open_element(&resolve, &start)?;
                    attach(element, &mut stack, &mut root);
                }
                (_, Event::Text(text)) => {
                    if let Some(parent) = stack.last_mut() {
                        push_text(parent, &text.unescape().map_err(quick_xml::Error::from)?);
                    }
                }
                (_, Event::CData(cdata)) => {
                    if let Some(parent) = stack.last_mut() {
                        push_text(parent, &String::from_utf8_lossy(&cdata.into_inner()));
                    }
                }
                (_, Event::Eof) => break,
                _ => {}
            }
        }

        root.map(|root| Document { root })
            .ok_or(DocumentError::NoRoot)
    }

    /// The document's root element.
    pub fn root(&self) -> &Element {
        &self.root
    }
}

fn open_element(
    resolve: &ResolveResult<'_>,
    start: &quick_xml::events::BytesStart<'_>,
) -> Result<Element, DocumentError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let namespace = match resolve {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.0).into_owned()),
        _ => None,
    };

    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let value = attribute
            .unescape_value()
            .map_err(quick_xml::Error::from)?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(Element {
        name,
        namespace,
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

fn attach(element: Element, stack: &mut Vec<Element>, root: &mut Option<Element>) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_none() {
        *root = Some(element);
    }
}

fn push_text(parent: &mut Element, text: &str) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return;
    }
    if !parent.text.is_empty() {
        parent.text.push(' ');
    }
    parent.text.push_str(trimmed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_tree() {
        let doc = Document::parse(
            r#"<package><metadata><id>demo</id><version>1.0.0</version></metadata></package>"#,
        )
        .unwrap();

        let root = doc.root();
        assert_eq!(root.name(), "package");
        assert_eq!(root.namespace(), None);

        let metadata = root.child(None, "metadata").unwrap();
        assert_eq!(metadata.child(None, "id").unwrap().text(), "demo");
        assert_eq!(metadata.child(None, "version").unwrap().text(), "1.0.0");
    }

    #[test]
    fn test_default_namespace_is_resolved() {
        let doc = Document::parse(
            r#"<package xmlns="urn:example"><metadata><id>demo</id></metadata></package>"#,
        )
        .unwrap();

        let root = doc.root();
        assert_eq!(root.namespace(), Some("urn:example"));

        let metadata = root.child(Some("urn:example"), "metadata").unwrap();
        assert_eq!(metadata.namespace(), Some("urn:example"));
        assert!(root.child(None, "metadata").is_none());
        assert_eq!(metadata.child(Some("urn:example"), "id").unwrap().text(), "demo");
    }

    #[test]
    fn test_attributes_and_empty_elements() {
        let doc = Document::parse(
            r#"<group targetFramework="net45"><dependency id="a" version="1.0" /></group>"#,
        )
        .unwrap();

        let group = doc.root();
        assert_eq!(group.attribute("targetFramework"), Some("net45"));

        let dep = group.children().next().unwrap();
        assert_eq!(dep.name(), "dependency");
        assert_eq!(dep.attribute("id"), Some("a"));
        assert_eq!(dep.attribute("version"), Some("1.0"));
        assert_eq!(dep.attribute("missing"), None);
    }

    #[test]
    fn test_xmlns_attributes_are_hidden() {
        let doc = Document::parse(r#"<root xmlns="urn:x" xmlns:y="urn:y" keep="1" />"#).unwrap();
        assert_eq!(doc.root().attribute("keep"), Some("1"));
        assert_eq!(doc.root().attribute("xmlns"), None);
    }

    #[test]
    fn test_text_unescaping() {
        let doc = Document::parse(r#"<license>MIT OR Apache-2.0 &amp; more</license>"#).unwrap();
        assert_eq!(doc.root().text(), "MIT OR Apache-2.0 & more");

        let doc = Document::parse(r#"<file>NOTICE &amp; LICENSE.txt</file>"#).unwrap();
        assert_eq!(doc.root().text(), "NOTICE & LICENSE.txt");
    }

    #[test]
    fn test_child_lookup_outlives_key_strings() {
        let doc = Document::parse(
            r#"<package xmlns="urn:x"><metadata><id>demo</id></metadata></package>"#,
        )
        .unwrap();

        let metadata = {
            let ns = String::from("urn:x");
            let name = String::from("metadata");
            doc.root().child(Some(&ns), &name)
        };
        assert_eq!(metadata.unwrap().name(), "metadata");
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        assert!(Document::parse("<a><b></a>").is_err());
        assert!(matches!(
            Document::parse("  "),
            Err(DocumentError::NoRoot)
        ));
    }

    #[test]
    fn test_describe_includes_attributes() {
        let doc = Document::parse(r#"<files include="**/*.cs" flatten="maybe" />"#).unwrap();
        let described = doc.root().describe();
        assert!(described.contains("<files"));
        assert!(described.contains("include=\"**/*.cs\""));
        assert!(described.contains("flatten=\"maybe\""));
    }
}
