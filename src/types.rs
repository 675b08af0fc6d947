//! Domain types shared by the catalog, selection and persistence layers

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::wire;

/// Where a menu item came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemOrigin {
    /// Canonical menu data (remote or fallback file)
    #[default]
    Catalog,
    /// Authored locally by the user
    Custom,
}

/// Sale status of a menu item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    #[serde(alias = "販売中")]
    Active,
    #[serde(alias = "販売中止")]
    Discontinued,
}

impl ItemStatus {
    /// Label used in remote documents
    pub fn as_wire(&self) -> &'static str {
        match self {
            ItemStatus::Active => wire::STATUS_ACTIVE,
            ItemStatus::Discontinued => wire::STATUS_DISCONTINUED,
        }
    }

    /// Parse a remote label; anything unrecognised counts as on sale
    pub fn from_wire(s: &str) -> Self {
        match s.trim() {
            wire::STATUS_DISCONTINUED | "discontinued" => ItemStatus::Discontinued,
            _ => ItemStatus::Active,
        }
    }

    pub fn from_flag(discontinued: bool) -> Self {
        if discontinued {
            ItemStatus::Discontinued
        } else {
            ItemStatus::Active
        }
    }
}

/// Identity of a menu item: (category, name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub category: String,
    pub name: String,
}

impl ItemKey {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }

    /// Remote document id, `{category}_{name}`
    pub fn document_id(&self) -> String {
        format!("{}_{}", self.category, self.name)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

/// A single dish on the menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub category: String,
    /// Older local data stores this as `dish`
    #[serde(alias = "dish")]
    pub name: String,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub calories: f64,
    #[serde(default, alias = "image")]
    pub image_ref: String,
    #[serde(default)]
    pub origin: ItemOrigin,
    #[serde(default)]
    pub status: ItemStatus,
}

impl MenuItem {
    /// Create an active catalog item
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        protein: f64,
        fat: f64,
        carbs: f64,
        calories: f64,
    ) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            protein,
            fat,
            carbs,
            calories,
            image_ref: String::new(),
            origin: ItemOrigin::Catalog,
            status: ItemStatus::Active,
        }
    }

    /// Create a user-authored item
    pub fn custom(
        category: impl Into<String>,
        name: impl Into<String>,
        protein: f64,
        fat: f64,
        carbs: f64,
        calories: f64,
    ) -> Self {
        Self {
            origin: ItemOrigin::Custom,
            ..Self::new(category, name, protein, fat, carbs, calories)
        }
    }

    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = image_ref.into();
        self
    }

    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.category.clone(), self.name.clone())
    }

    pub fn is_custom(&self) -> bool {
        self.origin == ItemOrigin::Custom
    }

    pub fn is_discontinued(&self) -> bool {
        self.status == ItemStatus::Discontinued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_labels() {
        assert_eq!(ItemStatus::Discontinued.as_wire(), "販売中止");
        assert_eq!(ItemStatus::from_wire("販売中止"), ItemStatus::Discontinued);
        assert_eq!(ItemStatus::from_wire("販売中"), ItemStatus::Active);
        // Unknown labels are treated as on sale
        assert_eq!(ItemStatus::from_wire("sold out?"), ItemStatus::Active);
    }

    #[test]
    fn test_custom_constructor_sets_origin() {
        let item = MenuItem::custom("副菜", "Kimchi", 1.0, 0.5, 3.0, 20.0);
        assert!(item.is_custom());
        assert!(!item.is_discontinued());
        assert_eq!(item.key(), ItemKey::new("副菜", "Kimchi"));
    }

    #[test]
    fn test_document_id() {
        assert_eq!(ItemKey::new("主菜", "Curry").document_id(), "主菜_Curry");
    }

    #[test]
    fn test_deserialize_legacy_local_record() {
        // Shape written by older builds: `dish` and `image`, no origin/status
        let json = r#"{"category":"主菜","dish":"Curry","protein":10,"fat":20,"carbs":60,"calories":500,"image":"data:image/png;base64,AAAA"}"#;
        let item: MenuItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.name, "Curry");
        assert_eq!(item.image_ref, "data:image/png;base64,AAAA");
        assert_eq!(item.origin, ItemOrigin::Catalog);
        assert_eq!(item.status, ItemStatus::Active);
    }

    #[test]
    fn test_status_accepts_wire_label_in_json() {
        let json = r#"{"category":"主菜","name":"Curry","status":"販売中止"}"#;
        let item: MenuItem = serde_json::from_str(json).unwrap();
        assert!(item.is_discontinued());
        assert_eq!(item.calories, 0.0);
    }
}
