//! In-memory registration map behind [`SymbolResolver`].

use crate::domain::identity::Identity;
use crate::domain::label::Label;
use crate::ports::symbol_port::SymbolResolver;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Ticker registrations shared by every proxy of a conversion.
///
/// Lookups try the ticker as given, then upper-cased, then fall back to
/// parsing the key as a unique-form identity.
#[derive(Debug, Default)]
pub struct SymbolCache {
    entries: RwLock<HashMap<String, Identity>>,
}

impl SymbolCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, Identity)>) -> Self {
        let cache = Self::new();
        for (ticker, identity) in entries {
            cache.set(ticker, identity);
        }
        cache
    }

    fn lookup(&self, key: &str) -> Option<Identity> {
        let entries = self.entries.read();
        entries
            .get(key)
            .or_else(|| entries.get(&key.to_uppercase()))
            .cloned()
    }
}

impl SymbolResolver for SymbolCache {
    fn resolve(&self, key: &Label) -> Option<Identity> {
        match key {
            Label::Identity(identity) => Some(identity.clone()),
            Label::Text(text) => self.lookup(text).or_else(|| text.parse().ok()),
            _ => None,
        }
    }

    fn set(&self, ticker: &str, identity: Identity) {
        self.entries.write().insert(ticker.to_string(), identity);
    }

    fn clear(&self) {
        self.entries.write().clear();
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}
