//! DOMTokenList (classList)
//!
//! Ordered, duplicate-free class tokens of an element. Insertion order is
//! kept so the serialized `class` attribute is stable.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DOMTokenList {
    tokens: Vec<String>,
}

impl DOMTokenList {
    /// Empty token list
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the list has no tokens
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Exact, case-sensitive token match
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Append tokens not already present; empty tokens are ignored
    pub fn add(&mut self, tokens: &[&str]) {
        for &token in tokens {
            let token = token.trim();
            if token.is_empty() || self.contains(token) {
                continue;
            }
            self.tokens.push(token.to_string());
        }
    }

    /// Remove every listed token; absent ones are ignored
    pub fn remove(&mut self, tokens: &[&str]) {
        self.tokens.retain(|t| !tokens.contains(&t.as_str()));
    }

    /// Serialized `class` attribute
    pub fn value(&self) -> String {
        self.tokens.join(" ")
    }

    /// Replace every token with the whitespace-separated `value`
    pub fn set_value(&mut self, value: &str) {
        self.tokens.clear();
        let parsed: Vec<&str> = value.split_whitespace().collect();
        self.add(&parsed);
    }

    /// Tokens in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}

impl std::fmt::Display for DOMTokenList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value())
    }
}
