//! CSS Selector subset
//!
//! Supported grammar:
//! - type (`main`), universal (`*`), `#id`, `.class`
//! - attribute presence `[aria-live]` and equality `[role="dialog"]`
//! - negation of a compound `:not([tabindex="-1"])`
//! - descendant (` `) and child (`>`) combinators
//! - selector lists separated by `,`

use crate::{DomError, DomTree, NodeId};

/// Parsed selector list (`a, b, c`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
    negations: Vec<Compound>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    value: Option<String>,
}

impl SelectorList {
    /// Parse a selector list
    pub fn parse(input: &str) -> Result<Self, DomError> {
        let mut parser = Parser::new(input);
        let mut selectors = Vec::new();
        loop {
            parser.skip_ws();
            selectors.push(parser.complex()?);
            parser.skip_ws();
            match parser.peek() {
                Some(',') => parser.bump(),
                None => break,
                Some(_) => return Err(parser.error("unexpected character")),
            }
        }
        Ok(Self { selectors })
    }

    /// Whether `node` matches any selector of the list
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.selectors.iter().any(|s| s.matches_at(tree, node, s.compounds.len() - 1))
    }
}

impl ComplexSelector {
    fn matches_at(&self, tree: &DomTree, node: NodeId, idx: usize) -> bool {
        if !self.compounds[idx].matches(tree, node) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match self.combinators[idx - 1] {
            Combinator::Child => tree
                .parent(node)
                .is_some_and(|p| self.matches_at(tree, p, idx - 1)),
            Combinator::Descendant => tree
                .ancestors(node)
                .into_iter()
                .any(|a| self.matches_at(tree, a, idx - 1)),
        }
    }
}

impl Compound {
    fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some(elem) = tree.element(node) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if elem.tag != *tag {
                return false;
            }
        }
        if !self.ids.iter().all(|id| elem.id() == Some(id.as_str())) {
            return false;
        }
        if !self.classes.iter().all(|c| elem.classes.contains(c)) {
            return false;
        }
        let attrs_ok = self.attrs.iter().all(|a| match &a.value {
            None => elem.has_attr(&a.name),
            Some(v) if a.name == "class" => elem.classes.value() == *v,
            Some(v) => elem.get_attr(&a.name) == Some(v.as_str()),
        });
        attrs_ok && !self.negations.iter().any(|n| n.matches(tree, node))
    }

    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.ids.is_empty()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.negations.is_empty()
    }
}

struct Parser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, chars: input.chars().collect(), pos: 0 }
    }

    fn error(&self, reason: &'static str) -> DomError {
        DomError::InvalidSelector { selector: self.input.to_string(), reason }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn expect(&mut self, c: char, reason: &'static str) -> Result<(), DomError> {
        if self.peek() == Some(c) {
            self.bump();
            Ok(())
        } else {
            Err(self.error(reason))
        }
    }

    /// Returns whether any whitespace was skipped
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos > start
    }

    fn ident(&mut self) -> Result<String, DomError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii())
        {
            self.bump();
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn complex(&mut self) -> Result<ComplexSelector, DomError> {
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.bump();
                    self.skip_ws();
                    combinators.push(Combinator::Child);
                }
                Some(_) if had_ws => combinators.push(Combinator::Descendant),
                Some(_) => return Err(self.error("unexpected character")),
            }
            compounds.push(self.compound()?);
        }
        Ok(ComplexSelector { compounds, combinators })
    }

    fn compound(&mut self) -> Result<Compound, DomError> {
        let mut compound = Compound::default();
        let mut universal = false;
        match self.peek() {
            Some('*') => {
                self.bump();
                universal = true;
            }
            Some(c) if c.is_alphabetic() => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.ids.push(self.ident()?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.bump();
                    compound.attrs.push(self.attribute()?);
                }
                Some(':') => {
                    self.bump();
                    if self.ident()? != "not" {
                        return Err(self.error("only :not() is supported"));
                    }
                    self.expect('(', "expected '(' after :not")?;
                    self.skip_ws();
                    let inner = self.compound()?;
                    self.skip_ws();
                    self.expect(')', "unclosed :not(")?;
                    compound.negations.push(inner);
                }
                _ => break,
            }
        }
        if compound.is_empty() && !universal {
            return Err(self.error("empty compound selector"));
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<AttrSelector, DomError> {
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();
        let value = if self.peek() == Some('=') {
            self.bump();
            self.skip_ws();
            Some(self.attr_value()?)
        } else {
            None
        };
        self.skip_ws();
        self.expect(']', "unclosed attribute selector")?;
        Ok(AttrSelector { name, value })
    }

    fn attr_value(&mut self) -> Result<String, DomError> {
        match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.bump();
                let start = self.pos;
                while self.peek().is_some_and(|c| c != q) {
                    self.bump();
                }
                let value = self.chars[start..self.pos].iter().collect();
                self.expect(q, "unterminated string")?;
                Ok(value)
            }
            _ => self.ident(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_dialog() -> (DomTree, NodeId, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let main = tree.create_element("main");
        let dialog = tree.create_element("div");
        let button = tree.create_element("button");
        tree.append_child(tree.root(), main).unwrap();
        tree.append_child(main, dialog).unwrap();
        tree.append_child(dialog, button).unwrap();
        let d = tree.element_mut(dialog).unwrap();
        d.set_attr("role", "dialog");
        d.set_attr("aria-hidden", "false");
        d.set_attr("class", "modal");
        tree.element_mut(button).unwrap().set_attr("class", "modal-close");
        (tree, main, dialog, button)
    }

    #[test]
    fn test_compound_attribute_match() {
        let (tree, _, dialog, _) = tree_with_dialog();
        let sel = SelectorList::parse(r#"[role="dialog"][aria-hidden="false"]"#).unwrap();
        assert!(sel.matches(&tree, dialog));
        let sel = SelectorList::parse("div.modal[role=dialog]").unwrap();
        assert!(sel.matches(&tree, dialog));
    }

    #[test]
    fn test_selector_list() {
        let (tree, _, _, button) = tree_with_dialog();
        let sel = SelectorList::parse("[data-close], .close, .modal-close").unwrap();
        assert!(sel.matches(&tree, button));
    }

    #[test]
    fn test_combinators() {
        let (tree, main, dialog, button) = tree_with_dialog();
        assert!(SelectorList::parse("main button").unwrap().matches(&tree, button));
        assert!(!SelectorList::parse("main > button").unwrap().matches(&tree, button));
        assert!(SelectorList::parse("main > div > button").unwrap().matches(&tree, button));
        assert!(!SelectorList::parse("main div").unwrap().matches(&tree, main));
        assert!(SelectorList::parse("main div").unwrap().matches(&tree, dialog));
    }

    #[test]
    fn test_negation() {
        let mut tree = DomTree::new();
        let a = tree.create_element("span");
        let b = tree.create_element("span");
        tree.append_child(tree.root(), a).unwrap();
        tree.append_child(tree.root(), b).unwrap();
        tree.element_mut(a).unwrap().set_attr("tabindex", "0");
        tree.element_mut(b).unwrap().set_attr("tabindex", "-1");

        let sel = SelectorList::parse(r#"[tabindex]:not([tabindex="-1"])"#).unwrap();
        assert!(sel.matches(&tree, a));
        assert!(!sel.matches(&tree, b));
    }

    #[test]
    fn test_invalid_selectors() {
        assert!(SelectorList::parse("").is_err());
        assert!(SelectorList::parse("div,").is_err());
        assert!(SelectorList::parse("[role=\"dialog\"").is_err());
        assert!(SelectorList::parse("a:hover").is_err());
        assert!(SelectorList::parse("#").is_err());
    }
}
