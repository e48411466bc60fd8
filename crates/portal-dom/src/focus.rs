//! Focus primitives
//!
//! tabindex parsing and the options/records of `Document::focus`.

use crate::NodeId;

/// Tab index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabIndex {
    /// tabindex="-1": focusable by script only
    Programmatic,
    /// tabindex="0" or positive
    Sequential(i32),
}

impl TabIndex {
    /// Parse an attribute value; garbage yields `None` (attribute ignored)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().parse::<i32>() {
            Ok(n) if n < 0 => Some(Self::Programmatic),
            Ok(n) => Some(Self::Sequential(n)),
            Err(_) => None,
        }
    }

    /// Reachable with the Tab key
    pub fn is_sequential(&self) -> bool {
        matches!(self, Self::Sequential(_))
    }
}

/// Options for `Document::focus`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusOptions {
    pub prevent_scroll: bool,
}

/// A completed focus transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusRecord {
    pub node: NodeId,
    pub prevent_scroll: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_index() {
        assert_eq!(TabIndex::parse("-1"), Some(TabIndex::Programmatic));
        assert!(TabIndex::parse("0").unwrap().is_sequential());
        assert!(TabIndex::parse(" 5 ").unwrap().is_sequential());
        assert_eq!(TabIndex::parse("abc"), None);
    }
}
