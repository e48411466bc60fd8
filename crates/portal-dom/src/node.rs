//! DOM Node
//!
//! Nodes are linked through `NodeId`s into the arena owned by `DomTree`.

use crate::{DOMTokenList, NodeId};

/// Arena node. Links are `NodeId::NONE` when absent.
#[derive(Debug, Clone)]
pub struct Node {
    pub parent: NodeId,
    pub first_child: NodeId,
    /// Kept for O(1) append
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
    pub data: NodeData,
}

impl Node {
    fn with_data(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    /// Create a new element node
    pub fn element(tag: &str) -> Self {
        Self::with_data(NodeData::Element(ElementData::new(tag)))
    }

    /// Create a new text node
    pub fn text(content: &str) -> Self {
        Self::with_data(NodeData::Text(content.to_string()))
    }

    /// Create a document node
    pub fn document() -> Self {
        Self::with_data(NodeData::Document)
    }

    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
}

/// Attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Element-specific data
///
/// The `class` attribute lives in `classes`; every other attribute in `attrs`.
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Lowercased tag name
    pub tag: String,
    pub attrs: Vec<Attribute>,
    pub classes: DOMTokenList,
    /// Inline style properties in insertion order
    pub style: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            classes: DOMTokenList::new(),
            style: Vec::new(),
        }
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        if name.eq_ignore_ascii_case("class") {
            return !self.classes.is_empty();
        }
        self.get_attr(name).is_some()
    }

    /// Set an attribute
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if name.eq_ignore_ascii_case("class") {
            self.classes.set_value(value);
            return;
        }
        match self.attrs.iter_mut().find(|a| a.name.eq_ignore_ascii_case(name)) {
            Some(attr) => attr.value = value.to_string(),
            None => self.attrs.push(Attribute {
                name: name.to_ascii_lowercase(),
                value: value.to_string(),
            }),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        if name.eq_ignore_ascii_case("class") {
            self.classes = DOMTokenList::new();
            return;
        }
        self.attrs.retain(|a| !a.name.eq_ignore_ascii_case(name));
    }

    /// Value of the `id` attribute
    pub fn id(&self) -> Option<&str> {
        self.get_attr("id")
    }

    pub fn style_property(&self, name: &str) -> Option<&str> {
        self.style
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_style_property(&mut self, name: &str, value: &str) {
        match self.style.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.style.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_style_property(&mut self, name: &str) {
        self.style.retain(|(k, _)| k != name);
    }

    /// `display: none` or the `hidden` attribute
    pub fn is_hidden(&self) -> bool {
        self.style_property("display") == Some("none") || self.has_attr("hidden")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_attribute_goes_to_token_list() {
        let mut elem = ElementData::new("DIV");
        elem.set_attr("class", "modal open");
        assert_eq!(elem.tag, "div");
        assert!(elem.classes.contains("modal"));
        assert!(elem.has_attr("class"));
        assert!(elem.get_attr("class").is_none());
    }

    #[test]
    fn test_attribute_overwrite() {
        let mut elem = ElementData::new("button");
        elem.set_attr("aria-expanded", "true");
        elem.set_attr("ARIA-EXPANDED", "false");
        assert_eq!(elem.attrs.len(), 1);
        assert_eq!(elem.get_attr("aria-expanded"), Some("false"));
    }

    #[test]
    fn test_hidden() {
        let mut elem = ElementData::new("div");
        assert!(!elem.is_hidden());
        elem.set_style_property("display", "none");
        assert!(elem.is_hidden());
        elem.remove_style_property("display");
        elem.set_attr("hidden", "");
        assert!(elem.is_hidden());
    }
}
