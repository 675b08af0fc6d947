//! Lifecycle flags layered over the catalog
//!
//! `custom` lists user-authored items (deletable), `discontinued` lists items
//! that stay visible but cannot be selected.

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::catalog::CatalogStore;

type NameSets = IndexMap<String, IndexSet<String>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LifecycleOverlay {
    custom: NameSets,
    discontinued: NameSets,
}

impl LifecycleOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(custom: NameSets, discontinued: NameSets) -> Self {
        Self {
            custom,
            discontinued,
        }
    }

    pub fn mark_custom(&mut self, category: &str, name: &str) {
        insert(&mut self.custom, category, name);
    }

    pub fn is_custom(&self, category: &str, name: &str) -> bool {
        contains(&self.custom, category, name)
    }

    /// Set or clear the discontinued flag; returns whether anything changed
    pub fn set_discontinued_flag(&mut self, category: &str, name: &str, flag: bool) -> bool {
        if flag {
            insert(&mut self.discontinued, category, name)
        } else {
            remove(&mut self.discontinued, category, name)
        }
    }

    pub fn is_discontinued(&self, category: &str, name: &str) -> bool {
        contains(&self.discontinued, category, name)
    }

    /// Drop every flag for an item
    pub fn forget(&mut self, category: &str, name: &str) {
        remove(&mut self.custom, category, name);
        remove(&mut self.discontinued, category, name);
    }

    /// Flag every item the catalog reports as discontinued
    ///
    /// Local flags on items the catalog reports as active are kept: the
    /// remote may not have received that update yet.
    pub fn absorb_catalog_status(&mut self, catalog: &CatalogStore) -> usize {
        let mut flagged = 0;
        for item in catalog.items().filter(|item| item.is_discontinued()) {
            if insert(&mut self.discontinued, &item.category, &item.name) {
                flagged += 1;
            }
        }
        if flagged > 0 {
            debug!(flagged = flagged, "Discontinued flags taken from catalog");
        }
        flagged
    }

    pub fn custom(&self) -> &NameSets {
        &self.custom
    }

    pub fn discontinued(&self) -> &NameSets {
        &self.discontinued
    }

    pub fn discontinued_in<'a>(&'a self, category: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.discontinued
            .get(category)
            .into_iter()
            .flat_map(|names| names.iter().map(String::as_str))
    }
}

fn insert(sets: &mut NameSets, category: &str, name: &str) -> bool {
    sets.entry(category.to_string())
        .or_default()
        .insert(name.to_string())
}

fn remove(sets: &mut NameSets, category: &str, name: &str) -> bool {
    let Some(names) = sets.get_mut(category) else {
        return false;
    };
    let removed = names.shift_remove(name);
    if names.is_empty() {
        sets.shift_remove(category);
    }
    removed
}

fn contains(sets: &NameSets, category: &str, name: &str) -> bool {
    sets.get(category).is_some_and(|names| names.contains(name))
}
