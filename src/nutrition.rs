//! Nutrition totals derived from the catalog and the current selection
//!
//! Pure functions: no I/O, no state. Totals are never persisted.

use serde::Serialize;

use crate::catalog::CatalogStore;
use crate::constants::nutrition::{CARBS_KCAL_PER_GRAM, FAT_KCAL_PER_GRAM, PROTEIN_KCAL_PER_GRAM};
use crate::selection::SelectionState;
use crate::types::MenuItem;

/// Energy split between protein, fat and carbohydrate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PfcBreakdown {
    pub protein_kcal: f64,
    pub fat_kcal: f64,
    pub carbs_kcal: f64,
    pub protein_percent: f64,
    pub fat_percent: f64,
    pub carbs_percent: f64,
}

impl PfcBreakdown {
    /// Percentages are all zero when the macros carry no energy
    pub fn from_grams(protein: f64, fat: f64, carbs: f64) -> Self {
        let protein_kcal = protein * PROTEIN_KCAL_PER_GRAM;
        let fat_kcal = fat * FAT_KCAL_PER_GRAM;
        let carbs_kcal = carbs * CARBS_KCAL_PER_GRAM;
        let total = protein_kcal + fat_kcal + carbs_kcal;

        let percent = |kcal: f64| if total > 0.0 { kcal / total * 100.0 } else { 0.0 };

        Self {
            protein_kcal,
            fat_kcal,
            carbs_kcal,
            protein_percent: percent(protein_kcal),
            fat_percent: percent(fat_kcal),
            carbs_percent: percent(carbs_kcal),
        }
    }

    pub fn total_kcal(&self) -> f64 {
        self.protein_kcal + self.fat_kcal + self.carbs_kcal
    }
}

/// Summed macros of every selected item
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NutritionTotals {
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub calories: f64,
    pub pfc: PfcBreakdown,
}

/// Sum the selected items' macros
///
/// Names that do not resolve in the catalog contribute nothing.
pub fn compute_totals(catalog: &CatalogStore, selection: &SelectionState) -> NutritionTotals {
    let mut totals = NutritionTotals::default();

    for item in selected_items(catalog, selection) {
        totals.protein += item.protein;
        totals.fat += item.fat;
        totals.carbs += item.carbs;
        totals.calories += item.calories;
    }

    totals.pfc = PfcBreakdown::from_grams(totals.protein, totals.fat, totals.carbs);
    totals
}

/// Resolve the selection to catalog items, in selection order
pub fn selected_items<'a>(catalog: &'a CatalogStore, selection: &'a SelectionState) -> impl Iterator<Item = &'a MenuItem> {
    selection
        .iter()
        .filter_map(|(category, name)| catalog.get(category, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::SelectionPolicy;

    fn catalog() -> CatalogStore {
        CatalogStore::from_items(vec![
            MenuItem::new("Main", "Curry", 10.0, 20.0, 60.0, 500.0),
            MenuItem::new("Main", "Salad", 2.0, 1.0, 10.0, 100.0),
            MenuItem::new("Side", "A", 1.0, 1.0, 1.0, 100.0),
            MenuItem::new("Side", "B", 1.0, 1.0, 1.0, 50.0),
        ])
    }

    #[test]
    fn test_empty_selection_is_all_zero() {
        let totals = compute_totals(&catalog(), &SelectionState::new());
        assert_eq!(totals, NutritionTotals::default());
        assert_eq!(totals.pfc.protein_percent, 0.0);
    }

    #[test]
    fn test_single_select_scenario() {
        let catalog = catalog();
        let mut selection = SelectionState::new();

        selection.toggle("Main", "Curry", SelectionPolicy::SingleSelect);
        let totals = compute_totals(&catalog, &selection);
        assert_eq!((totals.calories, totals.protein, totals.fat, totals.carbs), (500.0, 10.0, 20.0, 60.0));

        selection.toggle("Main", "Salad", SelectionPolicy::SingleSelect);
        let totals = compute_totals(&catalog, &selection);
        assert_eq!((totals.calories, totals.protein, totals.fat, totals.carbs), (100.0, 2.0, 1.0, 10.0));
    }

    #[test]
    fn test_multi_select_scenario() {
        let catalog = catalog();
        let mut selection = SelectionState::new();

        selection.toggle("Side", "A", SelectionPolicy::MultiSelect);
        selection.toggle("Side", "B", SelectionPolicy::MultiSelect);
        assert_eq!(compute_totals(&catalog, &selection).calories, 150.0);

        selection.toggle("Side", "A", SelectionPolicy::MultiSelect);
        assert_eq!(compute_totals(&catalog, &selection).calories, 50.0);
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let catalog = catalog();
        let mut selection = SelectionState::new();
        selection.toggle("Main", "Curry", SelectionPolicy::MultiSelect);
        selection.toggle("Side", "B", SelectionPolicy::MultiSelect);

        let pfc = compute_totals(&catalog, &selection).pfc;
        let sum = pfc.protein_percent + pfc.fat_percent + pfc.carbs_percent;
        assert!((sum - 100.0).abs() < 1e-9, "sum was {sum}");
        // Curry + B: protein 11g, fat 21g, carbs 61g
        assert_eq!(pfc.protein_kcal, 44.0);
        assert_eq!(pfc.fat_kcal, 189.0);
        assert_eq!(pfc.carbs_kcal, 244.0);
    }

    #[test]
    fn test_calories_without_macros_gives_zero_percentages() {
        let catalog = CatalogStore::from_items(vec![MenuItem::new("DRINK", "Tea", 0.0, 0.0, 0.0, 5.0)]);
        let mut selection = SelectionState::new();
        selection.toggle("DRINK", "Tea", SelectionPolicy::MultiSelect);

        let totals = compute_totals(&catalog, &selection);
        assert_eq!(totals.calories, 5.0);
        assert_eq!(totals.pfc, PfcBreakdown::default());
    }

    #[test]
    fn test_is_pure_and_deterministic() {
        let catalog = catalog();
        let mut selection = SelectionState::new();
        for name in ["A", "B"] {
            selection.toggle("Side", name, SelectionPolicy::MultiSelect);
        }
        selection.toggle("Main", "Curry", SelectionPolicy::SingleSelect);

        let first = compute_totals(&catalog, &selection);
        let second = compute_totals(&catalog, &selection);
        assert_eq!(first.calories.to_bits(), second.calories.to_bits());
        assert_eq!(first.pfc.fat_percent.to_bits(), second.pfc.fat_percent.to_bits());
        assert_eq!(first, second);
    }

    #[test]
    fn test_stale_reference_contributes_nothing() {
        let mut selection = SelectionState::new();
        selection.toggle("Main", "Curry", SelectionPolicy::SingleSelect);
        selection.toggle("Side", "A", SelectionPolicy::MultiSelect);

        // Catalog without Curry
        let reduced = CatalogStore::from_items(vec![MenuItem::new("Side", "A", 1.0, 1.0, 1.0, 100.0)]);
        let totals = compute_totals(&reduced, &selection);
        assert_eq!(totals.calories, 100.0);
        assert_eq!(totals.protein, 1.0);
    }

    #[test]
    fn test_selected_items_follow_selection_order() {
        let catalog = catalog();
        let mut selection = SelectionState::new();
        selection.toggle("Side", "B", SelectionPolicy::MultiSelect);
        selection.toggle("Side", "Missing", SelectionPolicy::MultiSelect);
        selection.toggle("Side", "A", SelectionPolicy::MultiSelect);

        let names: Vec<_> = selected_items(&catalog, &selection).map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }
}
