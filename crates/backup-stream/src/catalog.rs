//! Error code → message lookup.

use std::collections::HashMap;

/// Message used when a code is absent or not in the catalog
pub const UNKNOWN_ERROR: &str = "Unknown error. Check logs.";

/// Maps backup tool error codes to user-facing messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCatalog {
    messages: HashMap<i32, String>,
    fallback: String,
}

impl ErrorCatalog {
    /// Empty catalog with the default fallback
    pub fn new() -> Self {
        Self {
            messages: HashMap::new(),
            fallback: UNKNOWN_ERROR.to_string(),
        }
    }

    /// Catalog pre-filled with `messages`
    pub fn with_messages<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = (i32, S)>,
        S: Into<String>,
    {
        let mut catalog = Self::new();
        catalog
            .messages
            .extend(messages.into_iter().map(|(code, msg)| (code, msg.into())));
        catalog
    }

    /// Add or replace one mapping
    pub fn insert(&mut self, code: i32, message: impl Into<String>) {
        self.messages.insert(code, message.into());
    }

    /// Message for `code`, or the fallback
    pub fn resolve(&self, code: Option<i32>) -> &str {
        code.and_then(|c| self.messages.get(&c))
            .map_or(self.fallback.as_str(), String::as_str)
    }

    /// Number of mapped codes
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether no codes are mapped
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for ErrorCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_and_unknown() {
        let catalog = ErrorCatalog::with_messages([(14, "Wrong device password.")]);
        assert_eq!(catalog.resolve(Some(14)), "Wrong device password.");
        assert_eq!(catalog.resolve(Some(15)), UNKNOWN_ERROR);
        assert_eq!(catalog.resolve(None), UNKNOWN_ERROR);
    }

    #[test]
    fn test_insert_replaces() {
        let mut catalog = ErrorCatalog::new();
        catalog.insert(-13, "first");
        catalog.insert(-13, "second");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.resolve(Some(-13)), "second");
    }
}
