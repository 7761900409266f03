//! Minimal element tree over quick-xml events.
//!
//! Responses are small, so they are read into a tree of local names and
//! queried by path. Namespace prefixes are dropped.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, Default)]
pub(crate) struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// First element anywhere below `self` (or `self`) whose trailing
    /// element names match `path`.
    pub fn find(&self, path: &[&str]) -> Option<&Element> {
        let mut found = Vec::new();
        self.collect(path, &mut found, true);
        found.into_iter().next()
    }

    /// All such elements in document order.
    pub fn find_all(&self, path: &[&str]) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect(path, &mut found, false);
        found
    }

    fn collect<'a>(&'a self, path: &[&str], found: &mut Vec<&'a Element>, first_only: bool) {
        if first_only && !found.is_empty() {
            return;
        }
        if let Some((head, rest)) = path.split_first() {
            if self.name == *head {
                self.collect_below(rest, found, first_only);
            }
        }
        for child in &self.children {
            child.collect(path, found, first_only);
        }
    }

    fn collect_below<'a>(&'a self, rest: &[&str], found: &mut Vec<&'a Element>, first_only: bool) {
        match rest.split_first() {
            None => {
                if !(first_only && !found.is_empty()) {
                    found.push(self);
                }
            }
            Some((head, tail)) => {
                for child in self.children.iter().filter(|c| c.name == *head) {
                    child.collect_below(tail, found, first_only);
                }
            }
        }
    }
}

fn local_name(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn open_element(e: &BytesStart<'_>) -> Result<Element, String> {
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        attributes.push((local_name(attr.key.local_name().as_ref()), value.into_owned()));
    }
    Ok(Element {
        name: local_name(e.local_name().as_ref()),
        attributes,
        ..Default::default()
    })
}

/// Parse a document into its root element.
pub(crate) fn parse(xml: &str) -> Result<Element, String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => stack.push(open_element(&e)?),
            Ok(Event::Empty(e)) => {
                let element = open_element(&e)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&t.unescape().map_err(|e| e.to_string())?);
                }
            }
            Ok(Event::CData(t)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| "unbalanced end tag".to_string())?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "XML parsing error at position {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err("unexpected end of document".to_string());
    }
    root.ok_or_else(|| "empty document".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0"?>
<a:Root xmlns:a="urn:a" xmlns:b="urn:b">
  <a:Group><b:Item b:id="1">one</b:Item><b:Item id="2">two</b:Item></a:Group>
  <a:Other><b:Item>three</b:Item></a:Other>
  <a:Empty flag="yes"/>
</a:Root>"#;

    #[test]
    fn test_parse_tree() {
        let root = parse(DOC).unwrap();
        assert_eq!(root.name, "Root");
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.child("Empty").unwrap().attr("flag"), Some("yes"));
    }

    #[test]
    fn test_find_paths() {
        let root = parse(DOC).unwrap();
        let texts: Vec<_> = root.find_all(&["Item"]).iter().map(|e| e.text.clone()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);

        let grouped = root.find_all(&["Group", "Item"]);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].attr("id"), Some("1"));

        assert_eq!(root.find(&["Other", "Item"]).unwrap().text, "three");
        assert!(root.find(&["Group", "Missing"]).is_none());
    }

    #[test]
    fn test_malformed_document() {
        assert!(parse("<a><b></a>").is_err());
        assert!(parse("").is_err());
    }
}
