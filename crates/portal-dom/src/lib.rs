//! Portal DOM - Document Object Model
//!
//! Arena-based document tree used by the accessibility core.
//!
//! Features:
//! - Linked arena nodes (parent / first child / siblings)
//! - classList token lists and inline style properties
//! - CSS selector subset for querySelector, matches and closest
//! - Focus pointer with tabindex-aware focusability

mod classlist;
mod document;
mod focus;
mod node;
mod selector;
mod tree;

pub use classlist::DOMTokenList;
pub use document::Document;
pub use focus::{FocusOptions, FocusRecord, TabIndex};
pub use node::{Attribute, ElementData, Node, NodeData};
pub use selector::SelectorList;
pub use tree::DomTree;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check that this is not the sentinel
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// DOM error
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: &'static str },

    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    #[error("Node {0} cannot be inserted under its own descendant")]
    HierarchyRequest(NodeId),

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),
}
