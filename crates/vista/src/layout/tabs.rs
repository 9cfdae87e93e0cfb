//! Per-card tab lists for tabbed repeatable cards.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::bucket::Bucket;

use super::card::generate_tab_id;
use super::key::{is_tab_id, CardKey};

/// Tab lists and selected tab per card.
///
/// A cover-test card can hold several parallel records of the same type, one
/// per tab. Tab ids never contain `-`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTabs {
    #[serde(default)]
    tabs: IndexMap<String, Vec<String>>,
    #[serde(default)]
    selected: IndexMap<String, usize>,
}

impl CardTabs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild tab lists from the cover-test keys present in a bucket.
    pub fn from_bucket(bucket: &Bucket) -> Self {
        let mut tabs = Self::new();
        tabs.absorb_bucket(bucket);
        tabs
    }

    /// Tab ids of a card, in order.
    pub fn tabs_for(&self, card_id: &str) -> &[String] {
        self.tabs.get(card_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Add a new tab to a card and select it.
    pub fn add_tab(&mut self, card_id: &str) -> String {
        let tab_id = generate_tab_id();
        let tabs = self.tabs.entry(card_id.to_string()).or_default();
        tabs.push(tab_id.clone());
        self.selected.insert(card_id.to_string(), tabs.len() - 1);
        tab_id
    }

    /// Register an existing tab id if the card does not have it yet.
    ///
    /// Returns false, registering nothing, for ids containing `-`.
    pub fn insert_tab(&mut self, card_id: &str, tab_id: &str) -> bool {
        if !is_tab_id(tab_id) {
            warn!(card = card_id, tab = tab_id, "Ignoring malformed tab id");
            return false;
        }
        let tabs = self.tabs.entry(card_id.to_string()).or_default();
        if !tabs.iter().any(|t| t == tab_id) {
            tabs.push(tab_id.to_string());
        }
        true
    }

    /// Select a tab by index. Returns false when the index is out of range.
    pub fn select(&mut self, card_id: &str, index: usize) -> bool {
        if index >= self.tabs_for(card_id).len() {
            return false;
        }
        self.selected.insert(card_id.to_string(), index);
        true
    }

    /// Index of the selected tab (defaults to the first).
    pub fn selected_index(&self, card_id: &str) -> usize {
        self.selected.get(card_id).copied().unwrap_or(0)
    }

    /// The active tab id of a card, if it has any tabs.
    pub fn active_tab(&self, card_id: &str) -> Option<&str> {
        self.tabs_for(card_id)
            .get(self.selected_index(card_id))
            .map(String::as_str)
    }

    /// Remove a tab; the selection moves to the previous tab when needed.
    pub fn remove_tab(&mut self, card_id: &str, tab_id: &str) -> bool {
        let Some(tabs) = self.tabs.get_mut(card_id) else {
            return false;
        };
        let Some(position) = tabs.iter().position(|t| t == tab_id) else {
            return false;
        };

        tabs.remove(position);
        let remaining = tabs.len();
        let selected = self.selected.entry(card_id.to_string()).or_insert(0);
        if *selected >= remaining {
            *selected = remaining.saturating_sub(1);
        } else if *selected > position {
            *selected -= 1;
        }
        true
    }

    /// Forget every tab of a card.
    pub fn remove_card(&mut self, card_id: &str) {
        self.tabs.shift_remove(card_id);
        self.selected.shift_remove(card_id);
    }

    /// Register every cover-test tab found in a bucket.
    pub fn absorb_bucket(&mut self, bucket: &Bucket) {
        for key in bucket.keys() {
            if let CardKey::CoverTest { card_id, tab_id } = key {
                self.insert_tab(card_id, tab_id);
            }
        }
    }

    /// Card ids that have tab lists.
    pub fn cards(&self) -> impl Iterator<Item = &str> {
        self.tabs.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ComponentRecord;

    #[test]
    fn test_add_and_select_tabs() {
        let mut tabs = CardTabs::new();
        assert_eq!(tabs.active_tab("c1"), None);

        let first = tabs.add_tab("c1");
        let second = tabs.add_tab("c1");
        assert_eq!(tabs.tabs_for("c1"), &[first.clone(), second.clone()]);
        assert_eq!(tabs.active_tab("c1"), Some(second.as_str()));

        assert!(tabs.select("c1", 0));
        assert_eq!(tabs.active_tab("c1"), Some(first.as_str()));
        assert!(!tabs.select("c1", 5));
    }

    #[test]
    fn test_remove_tab_adjusts_selection() {
        let mut tabs = CardTabs::new();
        let a = tabs.add_tab("c1");
        let b = tabs.add_tab("c1");
        let c = tabs.add_tab("c1");

        // Selected is the last tab; removing it selects the new last
        assert!(tabs.remove_tab("c1", &c));
        assert_eq!(tabs.active_tab("c1"), Some(b.as_str()));

        tabs.select("c1", 1);
        assert!(tabs.remove_tab("c1", &a));
        assert_eq!(tabs.active_tab("c1"), Some(b.as_str()));

        assert!(!tabs.remove_tab("c1", "missing"));
    }

    #[test]
    fn test_absorb_bucket() {
        let mut bucket = Bucket::new();
        bucket.insert(CardKey::cover_test("c1", "t1"), ComponentRecord::new());
        bucket.insert(CardKey::cover_test("c1", "t2"), ComponentRecord::new());
        bucket.insert(CardKey::notes("n1"), ComponentRecord::new());

        let tabs = CardTabs::from_bucket(&bucket);

        assert_eq!(tabs.tabs_for("c1"), &["t1".to_string(), "t2".to_string()]);
        assert_eq!(tabs.active_tab("c1"), Some("t1"));
        assert_eq!(tabs.cards().count(), 1);
    }

    #[test]
    fn test_hyphenated_tab_ids_are_ignored() {
        let mut tabs = CardTabs::new();
        assert!(!tabs.insert_tab("c1", "b-c"));
        assert!(tabs.tabs_for("c1").is_empty());
        assert!(tabs.insert_tab("c1", "t1"));

        let mut bucket = Bucket::new();
        bucket.insert(CardKey::cover_test("c2", "b-c"), ComponentRecord::new());
        bucket.insert(CardKey::cover_test("c2", "t2"), ComponentRecord::new());

        tabs.absorb_bucket(&bucket);
        assert_eq!(tabs.tabs_for("c2"), &["t2".to_string()]);
    }
}
