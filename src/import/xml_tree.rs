//! Minimal XML element tree built on quick-xml
//!
//! The GML/XSD and XMI extractors both need tree navigation (nested path
//! lookups, descendant scans) that a flat event loop cannot express cleanly,
//! so the event stream is materialized into this small DOM first. Tag names
//! are stored without their namespace prefix; attribute names are kept
//! verbatim.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::ImportError;

/// One parsed XML element.
#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    /// Local tag name (namespace prefix stripped)
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    pub text: String,
}

impl XmlElement {
    fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Attribute value by exact name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First direct child with the given local tag name.
    pub fn child(&self, tag: &str) -> Option<&XmlElement> {
        self.children.iter().find(|element| element.tag == tag)
    }

    /// All direct children with the given local tag name.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |element| element.tag == tag)
    }

    /// Follow a chain of direct-child tag names.
    pub fn find_path(&self, path: &[&str]) -> Option<&XmlElement> {
        let mut current = self;
        for tag in path {
            current = current.child(tag)?;
        }
        Some(current)
    }

    /// All descendants (depth first) with the given local tag name.
    pub fn descendants<'a>(&'a self, tag: &'a str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        for child in &self.children {
            if child.tag == tag {
                found.push(child);
            }
            found.extend(child.descendants(tag));
        }
        found
    }
}

fn local_name(qualified: &[u8]) -> String {
    let text = String::from_utf8_lossy(qualified);
    match text.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => text.into_owned(),
    }
}

fn element_from(start: &BytesStart) -> Result<XmlElement, ImportError> {
    let mut element = XmlElement::new(local_name(start.name().as_ref()));
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|err| ImportError::Xml(err.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|err| ImportError::Xml(err.to_string()))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn top_of(stack: &mut [XmlElement]) -> Result<&mut XmlElement, ImportError> {
    stack
        .last_mut()
        .ok_or_else(|| ImportError::Xml("unbalanced document".to_string()))
}

/// Parse an XML document into its root element. Malformed XML is fatal.
pub fn parse_xml_tree(text: &str) -> Result<XmlElement, ImportError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = vec![XmlElement::new("#document")];

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref start)) => {
                stack.push(element_from(start)?);
            }
            Ok(Event::Empty(ref start)) => {
                let element = element_from(start)?;
                top_of(&mut stack)?.children.push(element);
            }
            Ok(Event::End(_)) => match stack.pop() {
                // The document node at the bottom of the stack never closes.
                Some(element) if !stack.is_empty() => {
                    top_of(&mut stack)?.children.push(element);
                }
                _ => return Err(ImportError::Xml("unexpected closing tag".to_string())),
            },
            Ok(Event::Text(ref text_event)) => {
                let text = text_event
                    .unescape()
                    .map_err(|err| ImportError::Xml(err.to_string()))?;
                top_of(&mut stack)?.text.push_str(&text);
            }
            Ok(Event::CData(ref cdata)) => {
                let text = String::from_utf8_lossy(cdata.as_ref()).into_owned();
                top_of(&mut stack)?.text.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(ImportError::Xml(format!(
                    "error at position {}: {}",
                    reader.error_position(),
                    err
                )));
            }
            _ => {}
        }
    }

    let mut document = stack.pop().ok_or_else(|| {
        ImportError::Xml("empty document".to_string())
    })?;
    if !stack.is_empty() {
        return Err(ImportError::Xml("unclosed element".to_string()));
    }

    document
        .children
        .drain(..)
        .find(|element| !element.tag.starts_with('#'))
        .ok_or_else(|| ImportError::Xml("document has no root element".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_nested_elements_and_strips_prefixes() {
        let root = parse_xml_tree(
            r#"<UML:Model xmlns:UML="omg.org/UML1.3">
                 <UML:Class name="A" xmi.id="c1">
                   <UML:ModelElement.taggedValue>
                     <UML:TaggedValue tag="documentation" value="Docs &amp; more"/>
                   </UML:ModelElement.taggedValue>
                 </UML:Class>
               </UML:Model>"#,
        )
        .unwrap();

        assert_eq!(root.tag, "Model");
        let class = root.child("Class").unwrap();
        assert_eq!(class.attr("name"), Some("A"));
        let tagged = class
            .find_path(&["ModelElement.taggedValue", "TaggedValue"])
            .unwrap();
        assert_eq!(tagged.attr("value"), Some("Docs & more"));
    }

    #[test]
    fn test_descendants_scan() {
        let root = parse_xml_tree("<a><b><c/><c/></b><c/></a>").unwrap();
        assert_eq!(root.descendants("c").len(), 3);
    }

    #[test]
    fn test_malformed_xml_is_fatal() {
        assert!(matches!(
            parse_xml_tree("<a><b></a>"),
            Err(ImportError::Xml(_))
        ));
    }

    #[test]
    fn test_element_text() {
        let root = parse_xml_tree("<doc><p>hello</p></doc>").unwrap();
        assert_eq!(root.child("p").unwrap().text, "hello");
    }
}
