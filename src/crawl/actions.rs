// src/crawl/actions.rs
// =============================================================================
// Collects every URL that carries a non-empty `action` query parameter.
//
// Keys are the full URL (query included), stored in a set, so a URL that is
// rediscovered on a hundred pages is still reported once. The final list is
// sorted so the output is stable between runs.
// =============================================================================

use std::collections::HashSet;
use url::Url;

use crate::extract::action_key_of;

#[derive(Debug, Default)]
pub struct ActionCollector {
    keys: HashSet<String>,
}

impl ActionCollector {
    /// Records `url` if it is an action URL. Returns true if it was new.
    pub fn record(&mut self, url: &Url) -> bool {
        match action_key_of(url) {
            Some(key) => self.keys.insert(key),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Consumes the collector and returns the keys in ascending order.
    pub fn into_sorted(self) -> Vec<String> {
        let mut actions: Vec<String> = self.keys.into_iter().collect();
        actions.sort_unstable();
        actions
    }
}
