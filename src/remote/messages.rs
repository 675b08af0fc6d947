//! Remote document shape for menu items

use serde::{Deserialize, Serialize};

use crate::types::{ItemOrigin, ItemStatus, MenuItem};

/// One menu item as stored on the remote
///
/// Field names follow the remote collection; older documents used the
/// short local names, which are accepted as aliases.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDocument {
    pub category: String,

    #[serde(alias = "dish")]
    pub dish_name: String,

    #[serde(default)]
    pub protein: f64,

    #[serde(default)]
    pub fat: f64,

    #[serde(default, alias = "carbs")]
    pub carbohydrates: f64,

    #[serde(default, alias = "calories")]
    pub total_calories: f64,

    #[serde(default, alias = "image")]
    pub image_url: String,

    /// Sale status label (`販売中` / `販売中止`)
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i64>,
}

/// Partial update sent when only the sale status changes
#[derive(Serialize, Debug, Clone)]
pub struct StatusPatch<'a> {
    pub status: &'a str,
}

impl RemoteDocument {
    pub fn into_item(self) -> MenuItem {
        MenuItem {
            category: self.category,
            name: self.dish_name,
            protein: self.protein,
            fat: self.fat,
            carbs: self.carbohydrates,
            calories: self.total_calories,
            image_ref: self.image_url,
            origin: ItemOrigin::Catalog,
            status: self
                .status
                .as_deref()
                .map(ItemStatus::from_wire)
                .unwrap_or_default(),
        }
    }
}

impl From<&MenuItem> for RemoteDocument {
    fn from(item: &MenuItem) -> Self {
        Self {
            category: item.category.clone(),
            dish_name: item.name.clone(),
            protein: item.protein,
            fat: item.fat,
            carbohydrates: item.carbs,
            total_calories: item.calories,
            image_url: item.image_ref.clone(),
            status: Some(item.status.as_wire().to_string()),
            display_order: None,
        }
    }
}

/// Convert fetched documents to items, honouring `displayOrder` when present
///
/// The sort is stable; documents without an order keep their relative
/// position after the ordered ones.
pub(crate) fn documents_to_items(mut docs: Vec<RemoteDocument>) -> Vec<MenuItem> {
    docs.sort_by_key(|doc| (doc.display_order.is_none(), doc.display_order.unwrap_or_default()));
    docs.into_iter().map(RemoteDocument::into_item).collect()
}
