//! Catalog storage
//!
//! Holds the effective menu: canonical items from the remote or fallback
//! source plus the user's custom items. Categories keep first-seen order and
//! items keep insertion order within their category.

mod csv;
mod loader;

pub use csv::parse_catalog_text;
pub use loader::{load_catalog, CatalogLoad, CatalogOrigin};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::types::{ItemOrigin, ItemStatus, MenuItem};

/// The effective menu, at most one item per (category, name)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogStore {
    categories: IndexMap<String, IndexMap<String, MenuItem>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from items, later duplicates overwrite earlier ones
    pub fn from_items(items: impl IntoIterator<Item = MenuItem>) -> Self {
        let mut store = Self::new();
        store.replace(items);
        store
    }

    /// Replace the whole catalog
    ///
    /// A key seen twice keeps its first position and the last record.
    pub fn replace(&mut self, items: impl IntoIterator<Item = MenuItem>) {
        self.categories.clear();
        for item in items {
            self.upsert(item);
        }
        info!(items = self.len(), categories = self.categories.len(), "Catalog replaced");
    }

    fn upsert(&mut self, item: MenuItem) {
        self.categories
            .entry(item.category.clone())
            .or_default()
            .insert(item.name.clone(), item);
    }

    /// Merge locally stored custom items
    ///
    /// Items whose key is absent are appended. When the key already exists
    /// (the remote returned a copy synced earlier) no second entry is
    /// created: the existing entry keeps its position but takes the custom
    /// record and origin. Returns the number of newly appended items.
    pub fn merge(&mut self, custom: impl IntoIterator<Item = MenuItem>) -> usize {
        let mut added = 0;
        for mut item in custom {
            item.origin = ItemOrigin::Custom;
            match self.get_mut(&item.category, &item.name) {
                Some(existing) => {
                    debug!(category = %item.category, name = %item.name, "Custom item already in catalog, adopting existing entry");
                    // The remote copy may carry a newer status
                    item.status = existing.status;
                    *existing = item;
                }
                None => {
                    self.upsert(item);
                    added += 1;
                }
            }
        }
        added
    }

    /// Remove a custom item; catalog-origin items are never removed
    pub fn remove(&mut self, category: &str, name: &str) -> Option<MenuItem> {
        let items = self.categories.get_mut(category)?;
        if !items.get(name).is_some_and(MenuItem::is_custom) {
            debug!(category = %category, name = %name, "Refusing to remove non-custom item");
            return None;
        }
        let removed = items.shift_remove(name);
        if items.is_empty() {
            self.categories.shift_remove(category);
        }
        removed
    }

    /// Insert a custom item without touching existing entries
    ///
    /// Returns false when the key is already taken.
    pub fn insert_custom(&mut self, mut item: MenuItem) -> bool {
        if self.contains(&item.category, &item.name) {
            return false;
        }
        item.origin = ItemOrigin::Custom;
        self.upsert(item);
        true
    }

    /// Mirror a status change onto the stored item
    pub fn set_status(&mut self, category: &str, name: &str, status: ItemStatus) -> bool {
        match self.get_mut(category, name) {
            Some(item) => {
                item.status = status;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, category: &str, name: &str) -> Option<&MenuItem> {
        self.categories.get(category)?.get(name)
    }

    fn get_mut(&mut self, category: &str, name: &str) -> Option<&mut MenuItem> {
        self.categories.get_mut(category)?.get_mut(name)
    }

    pub fn contains(&self, category: &str, name: &str) -> bool {
        self.get(category, name).is_some()
    }

    /// Item exists and is not discontinued
    pub fn is_active(&self, category: &str, name: &str) -> bool {
        self.get(category, name).is_some_and(|item| !item.is_discontinued())
    }

    /// Categories in first-seen order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Items of one category in insertion order
    pub fn items_in<'a>(&'a self, category: &str) -> impl Iterator<Item = &'a MenuItem> + use<'a> {
        self.categories
            .get(category)
            .into_iter()
            .flat_map(|items| items.values())
    }

    pub fn items(&self) -> impl Iterator<Item = &MenuItem> {
        self.categories.values().flat_map(|items| items.values())
    }

    pub fn custom_items(&self) -> impl Iterator<Item = &MenuItem> {
        self.items().filter(|item| item.is_custom())
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curry() -> MenuItem {
        MenuItem::new("Main", "Curry", 10.0, 20.0, 60.0, 500.0)
    }

    fn salad() -> MenuItem {
        MenuItem::new("Main", "Salad", 2.0, 1.0, 10.0, 100.0)
    }

    #[test]
    fn test_replace_keeps_one_item_per_key() {
        let mut updated = curry();
        updated.calories = 650.0;
        let store = CatalogStore::from_items(vec![curry(), salad(), updated]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("Main", "Curry").unwrap().calories, 650.0);
        // First position is kept
        let names: Vec<_> = store.items_in("Main").map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Curry", "Salad"]);
    }

    #[test]
    fn test_merge_appends_new_custom_items() {
        let mut store = CatalogStore::from_items(vec![curry()]);
        let added = store.merge(vec![MenuItem::custom("Side", "Pickles", 0.0, 0.0, 2.0, 10.0)]);

        assert_eq!(added, 1);
        assert!(store.get("Side", "Pickles").unwrap().is_custom());
        let categories: Vec<_> = store.categories().collect();
        assert_eq!(categories, vec!["Main", "Side"]);
    }

    #[test]
    fn test_merge_does_not_double_count_synced_custom_item() {
        // Remote already holds the custom item from an earlier sync
        let synced = MenuItem::new("Side", "Pickles", 0.0, 0.0, 2.0, 10.0);
        let mut store = CatalogStore::from_items(vec![curry(), synced]);

        let added = store.merge(vec![MenuItem::custom("Side", "Pickles", 0.0, 0.0, 2.0, 10.0)]);

        assert_eq!(added, 0);
        assert_eq!(store.len(), 2);
        // Custom record takes precedence so the author can still delete it
        assert!(store.get("Side", "Pickles").unwrap().is_custom());
    }

    #[test]
    fn test_merge_keeps_remote_status() {
        let synced = MenuItem::new("Side", "Pickles", 0.0, 0.0, 2.0, 10.0)
            .with_status(ItemStatus::Discontinued);
        let mut store = CatalogStore::from_items(vec![synced]);
        store.merge(vec![MenuItem::custom("Side", "Pickles", 0.0, 0.0, 2.0, 10.0)]);

        assert!(store.get("Side", "Pickles").unwrap().is_discontinued());
    }

    #[test]
    fn test_remove_catalog_item_is_noop() {
        let mut store = CatalogStore::from_items(vec![curry(), salad()]);
        let before = store.clone();

        assert!(store.remove("Main", "Curry").is_none());
        assert_eq!(store, before);
    }

    #[test]
    fn test_remove_custom_item_drops_empty_category() {
        let mut store = CatalogStore::from_items(vec![curry()]);
        assert!(store.insert_custom(MenuItem::new("Side", "Pickles", 0.0, 0.0, 2.0, 10.0)));

        let removed = store.remove("Side", "Pickles").unwrap();
        assert_eq!(removed.name, "Pickles");
        assert!(!store.categories().any(|c| c == "Side"));
    }

    #[test]
    fn test_insert_custom_refuses_existing_key() {
        let mut store = CatalogStore::from_items(vec![curry()]);
        assert!(!store.insert_custom(MenuItem::custom("Main", "Curry", 1.0, 1.0, 1.0, 1.0)));
        assert!(!store.get("Main", "Curry").unwrap().is_custom());
    }

    #[test]
    fn test_is_active_respects_status() {
        let mut store = CatalogStore::from_items(vec![curry()]);
        assert!(store.is_active("Main", "Curry"));

        store.set_status("Main", "Curry", ItemStatus::Discontinued);
        assert!(!store.is_active("Main", "Curry"));
        assert!(!store.is_active("Main", "Missing"));
    }
}
