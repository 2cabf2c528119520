//! Run-scoped lookup cache

use std::collections::HashMap;

use crate::api::RecordId;

/// `(lookup, name) -> id` resolutions made during one run
///
/// Entries are never invalidated: once a name is resolved it stays
/// authoritative until the run ends, even if the remote record changes.
#[derive(Debug, Default)]
pub struct LookupCache {
    entries: HashMap<(String, String), RecordId>,
    hits: usize,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, lookup: &str, name: &str) -> Option<RecordId> {
        let id = self
            .entries
            .get(&(lookup.to_string(), name.to_string()))
            .copied();
        if id.is_some() {
            self.hits += 1;
        }
        id
    }

    pub fn insert(&mut self, lookup: &str, name: &str, id: RecordId) {
        self.entries
            .insert((lookup.to_string(), name.to_string()), id);
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of lookups answered without a remote search
    pub fn hits(&self) -> usize {
        self.hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_per_lookup() {
        let mut cache = LookupCache::new();
        cache.insert("partner", "Acme", 7);

        assert_eq!(cache.get("partner", "Acme"), Some(7));
        assert_eq!(cache.get("route", "Acme"), None);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.entry_count(), 1);
    }
}
