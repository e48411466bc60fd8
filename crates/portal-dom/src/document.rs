//! Document - High-level document API
//!
//! Wraps the tree with the html/head/body skeleton, selector queries and
//! the focus pointer (`document.activeElement`).

use crate::{
    DOMTokenList, DomError, DomTree, FocusOptions, FocusRecord, NodeId, SelectorList, TabIndex,
};

/// HTML Document
#[derive(Debug, Clone)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL
    url: String,
    html_element: NodeId,
    head_element: NodeId,
    body_element: NodeId,
    active_element: Option<NodeId>,
    focus_log: Vec<FocusRecord>,
    last_scrolled: Option<NodeId>,
}

impl Document {
    /// Create a document with `<html><head/><body/></html>`
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        // Fresh detached nodes under a fresh root: these cannot fail.
        let _ = tree.append_child(tree.root(), html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);

        Self {
            tree,
            url: url.to_string(),
            html_element: html,
            head_element: head,
            body_element: body,
            active_element: None,
            focus_log: Vec::new(),
            last_scrolled: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get <head> element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    // ---- construction ----

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.tree.create_element(tag)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.tree.append_child(parent, child)
    }

    /// Create an element with attributes and append it under `parent`
    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: &[(&str, &str)],
    ) -> Result<NodeId, DomError> {
        let id = self.tree.create_element(tag);
        if let Some(elem) = self.tree.element_mut(id) {
            for (name, value) in attrs {
                elem.set_attr(name, value);
            }
        }
        self.tree.append_child(parent, id)?;
        Ok(id)
    }

    /// Append a text node under `parent`
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId, DomError> {
        let id = self.tree.create_text(text);
        self.tree.append_child(parent, id)?;
        Ok(id)
    }

    /// Detach a subtree. Focus inside it is lost, as in a browser.
    pub fn remove(&mut self, node: NodeId) {
        if let Some(active) = self.active_element {
            if self.tree.contains(node, active) {
                tracing::debug!("Focused node {} removed with subtree {}", active, node);
                self.active_element = None;
            }
        }
        self.tree.detach(node);
    }

    // ---- queries ----

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .descendants(self.tree.root())
            .into_iter()
            .find(|&n| self.tree.element(n).and_then(|e| e.id()) == Some(id))
    }

    fn parse_selector(selector: &str) -> Option<SelectorList> {
        match SelectorList::parse(selector) {
            Ok(list) => Some(list),
            Err(err) => {
                tracing::warn!("{}", err);
                None
            }
        }
    }

    /// First element in document order matching `selector`
    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.query_selector_in(self.tree.root(), selector)
    }

    /// First descendant of `root` matching `selector`
    pub fn query_selector_in(&self, root: NodeId, selector: &str) -> Option<NodeId> {
        let list = Self::parse_selector(selector)?;
        self.tree
            .descendants(root)
            .into_iter()
            .find(|&n| list.matches(&self.tree, n))
    }

    pub fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        self.query_selector_all_in(self.tree.root(), selector)
    }

    /// All descendants of `root` matching `selector`, in document order
    pub fn query_selector_all_in(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        let Some(list) = Self::parse_selector(selector) else {
            return Vec::new();
        };
        self.tree
            .descendants(root)
            .into_iter()
            .filter(|&n| list.matches(&self.tree, n))
            .collect()
    }

    /// Check if element matches selector
    pub fn matches(&self, node: NodeId, selector: &str) -> bool {
        Self::parse_selector(selector).is_some_and(|list| list.matches(&self.tree, node))
    }

    /// Closest inclusive ancestor matching selector
    pub fn closest(&self, node: NodeId, selector: &str) -> Option<NodeId> {
        let list = Self::parse_selector(selector)?;
        std::iter::once(node)
            .chain(self.tree.ancestors(node))
            .find(|&n| list.matches(&self.tree, n))
    }

    /// Inclusive containment
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.tree.contains(ancestor, node)
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.tree.is_connected(node)
    }

    // ---- attributes, classes, style ----

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.tree.element(node)?.get_attr(name)
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.tree.element(node).is_some_and(|e| e.has_attr(name))
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.tree
            .element_mut(node)
            .ok_or(DomError::NotAnElement(node))?
            .set_attr(name, value);
        self.drop_unrendered_focus();
        Ok(())
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
        self.tree
            .element_mut(node)
            .ok_or(DomError::NotAnElement(node))?
            .remove_attr(name);
        self.drop_unrendered_focus();
        Ok(())
    }

    pub fn class_list(&self, node: NodeId) -> Option<&DOMTokenList> {
        self.tree.element(node).map(|e| &e.classes)
    }

    pub fn class_list_mut(&mut self, node: NodeId) -> Option<&mut DOMTokenList> {
        self.tree.element_mut(node).map(|e| &mut e.classes)
    }

    pub fn style_property(&self, node: NodeId, name: &str) -> Option<&str> {
        self.tree.element(node)?.style_property(name)
    }

    pub fn set_style_property(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.tree
            .element_mut(node)
            .ok_or(DomError::NotAnElement(node))?
            .set_style_property(name, value);
        self.drop_unrendered_focus();
        Ok(())
    }

    pub fn remove_style_property(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
        self.tree
            .element_mut(node)
            .ok_or(DomError::NotAnElement(node))?
            .remove_style_property(name);
        self.drop_unrendered_focus();
        Ok(())
    }

    pub fn text_content(&self, node: NodeId) -> String {
        self.tree.text_content(node)
    }

    pub fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        self.tree.set_text_content(node, text)?;
        self.drop_unrendered_focus();
        Ok(())
    }

    /// Connected and neither the node nor an ancestor is hidden
    pub fn is_rendered(&self, node: NodeId) -> bool {
        if !self.tree.is_connected(node) {
            return false;
        }
        std::iter::once(node)
            .chain(self.tree.ancestors(node))
            .filter_map(|n| self.tree.element(n))
            .all(|e| !e.is_hidden())
    }

    // ---- focus ----

    pub fn tab_index(&self, node: NodeId) -> Option<TabIndex> {
        self.get_attribute(node, "tabindex").and_then(TabIndex::parse)
    }

    /// Whether `focus()` would succeed on this node
    pub fn is_focusable(&self, node: NodeId) -> bool {
        let Some(elem) = self.tree.element(node) else {
            return false;
        };
        if !self.is_rendered(node) || elem.has_attr("disabled") {
            return false;
        }
        if self.tab_index(node).is_some() {
            return true;
        }
        match elem.tag.as_str() {
            "a" | "area" => elem.has_attr("href"),
            "input" => elem.get_attr("type") != Some("hidden"),
            "button" | "select" | "textarea" => true,
            _ => false,
        }
    }

    /// Move focus to `node`. Returns false (focus unchanged) if not focusable.
    pub fn focus(&mut self, node: NodeId, options: FocusOptions) -> bool {
        if !self.is_focusable(node) {
            tracing::debug!("Node {} is not focusable", node);
            return false;
        }
        self.active_element = Some(node);
        self.focus_log.push(FocusRecord { node, prevent_scroll: options.prevent_scroll });
        if !options.prevent_scroll {
            self.last_scrolled = Some(node);
        }
        true
    }

    /// Focus falls back to the body once the focused node stops rendering
    fn drop_unrendered_focus(&mut self) {
        if let Some(active) = self.active_element {
            if !self.is_rendered(active) {
                tracing::debug!("Focused node {} is no longer rendered", active);
                self.active_element = None;
            }
        }
    }

    pub fn blur(&mut self) {
        self.active_element = None;
    }

    /// Currently focused element (`None` means the body)
    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element
    }

    pub fn scroll_into_view(&mut self, node: NodeId) {
        if self.tree.is_connected(node) {
            self.last_scrolled = Some(node);
        }
    }

    pub fn last_scrolled(&self) -> Option<NodeId> {
        self.last_scrolled
    }

    /// Every successful focus transfer, oldest first
    pub fn focus_history(&self) -> &[FocusRecord] {
        &self.focus_log
    }
}
