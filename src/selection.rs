//! Per-category selection state and cardinality policy
//!
//! Each category maps to an insertion-ordered set of selected item names.
//! SingleSelect categories never hold more than one name.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::catalog::CatalogStore;
use crate::overlay::LifecycleOverlay;

/// How many items a category may have selected at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Zero or one item; picking another replaces it
    SingleSelect,
    /// Any number of items, toggled independently
    #[default]
    MultiSelect,
}

/// Fixed policy table, built once from configuration
#[derive(Debug, Clone, Default)]
pub struct SelectionPolicies {
    overrides: HashMap<String, SelectionPolicy>,
    default: SelectionPolicy,
}

impl SelectionPolicies {
    /// Every category MultiSelect except the listed single-select ones
    pub fn with_single_select<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            overrides: categories
                .into_iter()
                .map(|c| (c.into(), SelectionPolicy::SingleSelect))
                .collect(),
            default: SelectionPolicy::MultiSelect,
        }
    }

    pub fn policy_for(&self, category: &str) -> SelectionPolicy {
        self.overrides.get(category).copied().unwrap_or(self.default)
    }
}

/// Selected item names per category
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SelectionState {
    categories: IndexMap<String, IndexSet<String>>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the selection of `name` under the category's policy
    ///
    /// Returns true when the item is selected afterwards. For SingleSelect,
    /// clicking the sole selected item clears the slot.
    pub fn toggle(&mut self, category: &str, name: &str, policy: SelectionPolicy) -> bool {
        let selected = self.categories.entry(category.to_string()).or_default();

        match policy {
            SelectionPolicy::SingleSelect => {
                let was_sole = selected.len() == 1 && selected.contains(name);
                selected.clear();
                if was_sole {
                    false
                } else {
                    selected.insert(name.to_string());
                    true
                }
            }
            SelectionPolicy::MultiSelect => {
                if selected.shift_remove(name) {
                    false
                } else {
                    selected.insert(name.to_string());
                    true
                }
            }
        }
    }

    /// Empty one category's selection
    pub fn clear(&mut self, category: &str) {
        if let Some(selected) = self.categories.get_mut(category) {
            selected.clear();
        }
    }

    pub fn clear_all(&mut self) {
        for selected in self.categories.values_mut() {
            selected.clear();
        }
    }

    /// Deselect one item; returns whether it was selected
    pub fn remove(&mut self, category: &str, name: &str) -> bool {
        self.categories
            .get_mut(category)
            .is_some_and(|selected| selected.shift_remove(name))
    }

    /// Drop every name that no longer resolves to an active item
    ///
    /// Returns the number of dropped names.
    pub fn reconcile(&mut self, catalog: &CatalogStore, overlay: &LifecycleOverlay) -> usize {
        let mut dropped = 0;
        for (category, selected) in self.categories.iter_mut() {
            let before = selected.len();
            selected.retain(|name| {
                catalog.is_active(category, name) && !overlay.is_discontinued(category, name)
            });
            if selected.len() != before {
                debug!(category = %category, dropped = before - selected.len(), "Dropped stale selections");
            }
            dropped += before - selected.len();
        }
        if dropped > 0 {
            info!(dropped = dropped, "Selection reconciled against catalog");
        }
        dropped
    }

    /// Trim SingleSelect categories holding several names down to the latest one
    pub fn enforce_policies(&mut self, policies: &SelectionPolicies) {
        for (category, selected) in self.categories.iter_mut() {
            if policies.policy_for(category) == SelectionPolicy::SingleSelect && selected.len() > 1 {
                let keep = selected.pop();
                selected.clear();
                selected.extend(keep);
                debug!(category = %category, "Trimmed single-select category to its latest pick");
            }
        }
    }

    pub fn is_selected(&self, category: &str, name: &str) -> bool {
        self.categories
            .get(category)
            .is_some_and(|selected| selected.contains(name))
    }

    /// Selected names of one category, in selection order
    pub fn selected<'a>(&'a self, category: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.categories
            .get(category)
            .into_iter()
            .flat_map(|selected| selected.iter().map(String::as_str))
    }

    /// (category, name) pairs in category then selection order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.categories.iter().flat_map(|(category, selected)| {
            selected.iter().map(move |name| (category.as_str(), name.as_str()))
        })
    }

    pub fn count(&self, category: &str) -> usize {
        self.categories.get(category).map_or(0, IndexSet::len)
    }

    pub fn total(&self) -> usize {
        self.categories.values().map(IndexSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl<'de> Deserialize<'de> for SelectionState {
    /// Accepts both `{cat: [names]}` and the older `{cat: "name" | null}` form
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Slot {
            Many(Vec<String>),
            One(Option<String>),
        }

        let raw = IndexMap::<String, Slot>::deserialize(deserializer)?;
        let categories = raw
            .into_iter()
            .map(|(category, slot)| {
                let names: IndexSet<String> = match slot {
                    Slot::Many(names) => names.into_iter().collect(),
                    Slot::One(name) => name.into_iter().filter(|n| !n.is_empty()).collect(),
                };
                (category, names)
            })
            .collect();

        Ok(Self { categories })
    }
}
