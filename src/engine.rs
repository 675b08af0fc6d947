//! Menu engine: one session's catalog, selection and lifecycle flags
//!
//! All mutations go through `MenuEngine` and are persisted before the call
//! returns. Remote writes are handed back as a [`RemoteWrite`] future; the
//! caller decides whether to await it or detach it onto the runtime.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::catalog::{load_catalog, CatalogOrigin, CatalogStore};
use crate::config::{CategoryLabel, MenuConfig};
use crate::error::{MenuError, MenuResult};
use crate::nutrition::{self, NutritionTotals};
use crate::overlay::LifecycleOverlay;
use crate::persistence::{PersistenceBridge, RestoreOutcome};
use crate::remote::{CatalogSource, RemoteSink};
use crate::selection::{SelectionPolicies, SelectionPolicy, SelectionState};
use crate::types::{ItemKey, ItemOrigin, ItemStatus, MenuItem};

// ===== Remote write handle =====

type WriteFuture = Pin<Box<dyn Future<Output = MenuResult<()>> + Send + 'static>>;

/// Pending best-effort write to the remote store
///
/// The local change it belongs to has already been applied and persisted.
/// Resolves to `MenuError::RemoteWrite` on failure.
#[must_use = "remote writes do nothing unless awaited or detached"]
pub struct RemoteWrite {
    action: &'static str,
    key: ItemKey,
    future: WriteFuture,
}

impl RemoteWrite {
    fn new<F>(action: &'static str, key: ItemKey, future: F) -> Self
    where
        F: Future<Output = MenuResult<()>> + Send + 'static,
    {
        Self {
            action,
            key,
            future: Box::pin(future),
        }
    }

    pub fn action(&self) -> &'static str {
        self.action
    }

    pub fn key(&self) -> &ItemKey {
        &self.key
    }

    /// Run the write in the background, logging a failure
    ///
    /// Must be called from within a tokio runtime.
    pub fn detach(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let _ = self.await;
        })
    }
}

impl Future for RemoteWrite {
    type Output = MenuResult<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.future.as_mut().poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(())) => {
                debug!(action = self.action, item = %self.key, "Remote write completed");
                Poll::Ready(Ok(()))
            }
            Poll::Ready(Err(e)) => {
                warn!(action = self.action, item = %self.key, error = %e, "Remote write failed, local change kept");
                Poll::Ready(Err(MenuError::RemoteWrite {
                    action: self.action,
                    reason: e.to_string(),
                }))
            }
        }
    }
}

impl std::fmt::Debug for RemoteWrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteWrite")
            .field("action", &self.action)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Result of a selection toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Selected,
    Deselected,
    /// Item is discontinued and cannot be picked
    Blocked,
    /// No such item in the catalog
    Unknown,
}

// ===== Engine =====

pub struct MenuEngine {
    config: MenuConfig,
    policies: SelectionPolicies,
    /// Last installed catalog, before custom items are merged in
    canonical: Vec<MenuItem>,
    catalog_installed: bool,
    catalog: CatalogStore,
    selection: SelectionState,
    overlay: LifecycleOverlay,
    persistence: PersistenceBridge,
    remote: Arc<dyn RemoteSink>,
}

impl MenuEngine {
    /// Create the engine and load local state
    ///
    /// The catalog holds only custom items until `refresh_catalog` or
    /// `install_catalog` runs; selections are not reconciled before that.
    pub fn new(config: MenuConfig, persistence: PersistenceBridge, remote: Arc<dyn RemoteSink>) -> Self {
        let policies = config.policies();
        let mut engine = Self {
            config,
            policies,
            canonical: Vec::new(),
            catalog_installed: false,
            catalog: CatalogStore::new(),
            selection: SelectionState::new(),
            overlay: LifecycleOverlay::new(),
            persistence,
            remote,
        };
        engine.reload_local_state();
        engine
    }

    // ===== Catalog =====

    /// Fetch the catalog, falling back to the secondary source
    ///
    /// When both sources fail the current catalog is kept as is.
    pub async fn refresh_catalog(
        &mut self,
        primary: &dyn CatalogSource,
        fallback: &dyn CatalogSource,
    ) -> CatalogOrigin {
        let load = load_catalog(primary, fallback).await;
        if load.origin == CatalogOrigin::Empty {
            warn!(items = self.catalog.len(), "No catalog source available, keeping current catalog");
            return load.origin;
        }
        self.install_catalog(load.items);
        load.origin
    }

    /// Replace the canonical catalog and reconcile local state against it
    pub fn install_catalog(&mut self, items: Vec<MenuItem>) {
        self.canonical = items;
        self.catalog_installed = true;

        let custom: Vec<MenuItem> = self.catalog.custom_items().cloned().collect();
        let before = self.selection.clone();
        self.rebuild(custom);

        if self.selection != before {
            self.persist();
        }
    }

    /// Rebuild the effective catalog and bring selection and flags in line
    fn rebuild(&mut self, custom: Vec<MenuItem>) {
        self.catalog.replace(self.canonical.iter().cloned());
        let merged = self.catalog.merge(custom);

        self.overlay.absorb_catalog_status(&self.catalog);
        let flagged: Vec<(String, String)> = self
            .overlay
            .discontinued()
            .iter()
            .flat_map(|(category, names)| names.iter().map(move |name| (category.clone(), name.clone())))
            .collect();
        for (category, name) in flagged {
            self.catalog.set_status(&category, &name, ItemStatus::Discontinued);
        }

        // Stale names go first so the single-select trim keeps a live pick.
        // Neither runs until a catalog says which names are live.
        if self.catalog_installed {
            self.selection.reconcile(&self.catalog, &self.overlay);
            self.selection.enforce_policies(&self.policies);
        }

        info!(
            items = self.catalog.len(),
            custom_added = merged,
            selected = self.selection.total(),
            "Catalog rebuilt"
        );
    }

    // ===== Selection =====

    /// Toggle an item under its category's policy
    pub fn toggle(&mut self, category: &str, name: &str) -> ToggleOutcome {
        if !self.catalog.contains(category, name) {
            debug!(category = %category, name = %name, "Toggle ignored, item not in catalog");
            return ToggleOutcome::Unknown;
        }
        if !self.is_selectable(category, name) {
            debug!(category = %category, name = %name, "Toggle blocked, item discontinued");
            return ToggleOutcome::Blocked;
        }

        let policy = self.policy_for(category);
        let selected = self.selection.toggle(category, name, policy);
        self.persist();

        if selected {
            info!(category = %category, name = %name, policy = ?policy, "Item selected");
            ToggleOutcome::Selected
        } else {
            info!(category = %category, name = %name, "Item deselected");
            ToggleOutcome::Deselected
        }
    }

    pub fn clear(&mut self, category: &str) {
        self.selection.clear(category);
        self.persist();
        info!(category = %category, "Category selection cleared");
    }

    pub fn clear_all(&mut self) {
        self.selection.clear_all();
        self.persist();
        info!("All selections cleared");
    }

    // ===== Lifecycle =====

    /// Set or clear the discontinued flag on an item
    ///
    /// Setting the flag evicts the item from the selection; clearing it does
    /// not restore a previous selection.
    pub fn set_discontinued(&mut self, category: &str, name: &str, flag: bool) -> MenuResult<RemoteWrite> {
        if !self.catalog.contains(category, name) {
            return Err(MenuError::Validation(format!("unknown item {category}/{name}")));
        }

        let status = ItemStatus::from_flag(flag);
        self.overlay.set_discontinued_flag(category, name, flag);
        self.catalog.set_status(category, name, status);
        if flag && self.selection.remove(category, name) {
            info!(category = %category, name = %name, "Discontinued item removed from selection");
        }
        self.persist();
        info!(category = %category, name = %name, discontinued = flag, "Item status changed");

        let remote = Arc::clone(&self.remote);
        let (c, n) = (category.to_string(), name.to_string());
        Ok(RemoteWrite::new("status update", ItemKey::new(category, name), async move {
            remote.set_status(&c, &n, status).await
        }))
    }

    /// Add a user-authored item
    ///
    /// Nothing changes when validation fails.
    pub fn add_custom(&mut self, mut item: MenuItem) -> MenuResult<RemoteWrite> {
        self.validate_custom(&item)?;

        item.name = item.name.trim().to_string();
        item.category = item.category.trim().to_string();
        item.origin = ItemOrigin::Custom;
        let key = item.key();

        if !self.catalog.insert_custom(item.clone()) {
            return Err(MenuError::Validation(format!("{key} already exists")));
        }
        self.overlay.mark_custom(&item.category, &item.name);
        self.persist();
        info!(category = %item.category, name = %item.name, calories = item.calories, "Custom item added");

        let remote = Arc::clone(&self.remote);
        Ok(RemoteWrite::new("upsert", key, async move { remote.upsert_item(&item).await }))
    }

    fn validate_custom(&self, item: &MenuItem) -> MenuResult<()> {
        let category = item.category.trim();
        let name = item.name.trim();
        if category.is_empty() {
            return Err(MenuError::Validation("category is required".to_string()));
        }
        if name.is_empty() {
            return Err(MenuError::Validation("name is required".to_string()));
        }
        if !(item.calories.is_finite() && item.calories > 0.0) {
            return Err(MenuError::Validation("calories must be greater than zero".to_string()));
        }
        for (field, value) in [("protein", item.protein), ("fat", item.fat), ("carbs", item.carbs)] {
            if !value.is_finite() || value < 0.0 {
                return Err(MenuError::Validation(format!("{field} must be a non-negative number")));
            }
        }
        if self.catalog.contains(category, name) {
            return Err(MenuError::Validation(format!("{category}/{name} already exists")));
        }
        Ok(())
    }

    /// Delete a custom item from catalog, selection and flags together
    ///
    /// Returns None, changing nothing, when the item is not custom.
    pub fn delete_custom(&mut self, category: &str, name: &str) -> Option<RemoteWrite> {
        if !self.catalog.get(category, name).is_some_and(MenuItem::is_custom) {
            warn!(category = %category, name = %name, "Refusing to delete non-custom item");
            return None;
        }

        self.catalog.remove(category, name)?;
        self.selection.remove(category, name);
        self.overlay.forget(category, name);
        self.persist();
        info!(category = %category, name = %name, "Custom item deleted");

        let remote = Arc::clone(&self.remote);
        let (c, n) = (category.to_string(), name.to_string());
        Some(RemoteWrite::new("delete", ItemKey::new(category, name), async move {
            remote.delete_item(&c, &n).await
        }))
    }

    // ===== Recovery =====

    pub fn detect_reset_and_offer(&self) -> bool {
        self.persistence.detect_reset_and_offer()
    }

    /// Copy the session backup into the durable store
    ///
    /// In-memory state is untouched; call `reload_local_state` when the
    /// outcome asks for it.
    pub fn restore_backup(&self) -> MenuResult<RestoreOutcome> {
        self.persistence.restore()
    }

    /// Replace selection, flags and custom items with the durable store's
    pub fn reload_local_state(&mut self) {
        let snapshot = self.persistence.load();
        self.selection = snapshot.selection;
        self.overlay = snapshot.overlay;
        self.rebuild(snapshot.custom_items);
    }

    // ===== Read accessors =====

    pub fn totals(&self) -> NutritionTotals {
        nutrition::compute_totals(&self.catalog, &self.selection)
    }

    pub fn selected_items(&self) -> impl Iterator<Item = &MenuItem> {
        nutrition::selected_items(&self.catalog, &self.selection)
    }

    /// Catalog categories in display order
    pub fn ordered_categories(&self) -> Vec<String> {
        self.config.ordered_categories(self.catalog.categories())
    }

    pub fn label_for(&self, category: &str) -> CategoryLabel {
        self.config.label_for(category)
    }

    pub fn policy_for(&self, category: &str) -> SelectionPolicy {
        self.policies.policy_for(category)
    }

    pub fn is_selectable(&self, category: &str, name: &str) -> bool {
        self.catalog.is_active(category, name) && !self.overlay.is_discontinued(category, name)
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn overlay(&self) -> &LifecycleOverlay {
        &self.overlay
    }

    pub fn config(&self) -> &MenuConfig {
        &self.config
    }

    fn persist(&self) {
        let custom: Vec<MenuItem> = self.catalog.custom_items().cloned().collect();
        if let Err(e) = self.persistence.save(&self.selection, &self.overlay, &custom) {
            error!(error = %e, "Failed to persist local state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::storage::{CUSTOM_ITEMS, SELECTION};
    use crate::remote::fake::FakeRemote;
    use crate::remote::CsvCatalog;
    use crate::storage::{KeyValueStore, MemoryStore};

    struct Harness {
        durable: MemoryStore,
        session: MemoryStore,
        remote: FakeRemote,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_remote(FakeRemote::default())
        }

        fn with_remote(remote: FakeRemote) -> Self {
            Self {
                durable: MemoryStore::new(),
                session: MemoryStore::new(),
                remote,
            }
        }

        /// Engine over the shared stores, catalog installed
        fn engine(&self) -> MenuEngine {
            let mut engine = self.bare_engine();
            engine.install_catalog(menu());
            engine
        }

        fn bare_engine(&self) -> MenuEngine {
            let config = MenuConfig {
                single_select_categories: vec!["Main".to_string()],
                ..MenuConfig::default()
            };
            let persistence =
                PersistenceBridge::new(Box::new(self.durable.clone()), Box::new(self.session.clone()));
            MenuEngine::new(config, persistence, Arc::new(self.remote.clone()))
        }
    }

    fn menu() -> Vec<MenuItem> {
        vec![
            MenuItem::new("Main", "Curry", 10.0, 20.0, 60.0, 500.0),
            MenuItem::new("Main", "Salad", 2.0, 1.0, 10.0, 100.0),
            MenuItem::new("Side", "A", 1.0, 1.0, 1.0, 100.0),
            MenuItem::new("Side", "B", 1.0, 1.0, 1.0, 50.0),
        ]
    }

    fn pickles() -> MenuItem {
        MenuItem::custom("Side", "Pickles", 0.5, 0.0, 2.0, 15.0)
    }

    #[test]
    fn test_single_select_scenario() {
        let harness = Harness::new();
        let mut engine = harness.engine();

        assert_eq!(engine.toggle("Main", "Curry"), ToggleOutcome::Selected);
        let totals = engine.totals();
        assert_eq!((totals.calories, totals.protein, totals.fat, totals.carbs), (500.0, 10.0, 20.0, 60.0));

        assert_eq!(engine.toggle("Main", "Salad"), ToggleOutcome::Selected);
        let selected: Vec<_> = engine.selection().selected("Main").collect();
        assert_eq!(selected, vec!["Salad"]);
        assert_eq!(engine.totals().calories, 100.0);
    }

    #[test]
    fn test_multi_select_scenario() {
        let harness = Harness::new();
        let mut engine = harness.engine();

        engine.toggle("Side", "A");
        engine.toggle("Side", "B");
        assert_eq!(engine.totals().calories, 150.0);

        assert_eq!(engine.toggle("Side", "A"), ToggleOutcome::Deselected);
        assert_eq!(engine.totals().calories, 50.0);
    }

    #[test]
    fn test_toggle_unknown_item_is_noop() {
        let harness = Harness::new();
        let mut engine = harness.engine();

        assert_eq!(engine.toggle("Main", "Pizza"), ToggleOutcome::Unknown);
        assert!(engine.selection().is_empty());
        assert!(harness.durable.is_empty());
    }

    #[tokio::test]
    async fn test_discontinue_evicts_and_blocks() {
        let harness = Harness::new();
        let mut engine = harness.engine();
        engine.toggle("Main", "Curry");

        let write = engine.set_discontinued("Main", "Curry", true).unwrap();
        assert_eq!(engine.selection().count("Main"), 0);
        assert!(engine.catalog().get("Main", "Curry").unwrap().is_discontinued());

        write.await.unwrap();
        assert_eq!(harness.remote.calls(), vec!["status Main/Curry 販売中止"]);

        assert_eq!(engine.toggle("Main", "Curry"), ToggleOutcome::Blocked);
        assert_eq!(engine.selection().count("Main"), 0);
    }

    #[tokio::test]
    async fn test_reactivating_does_not_restore_selection() {
        let harness = Harness::new();
        let mut engine = harness.engine();
        engine.toggle("Side", "A");

        engine.set_discontinued("Side", "A", true).unwrap().await.unwrap();
        engine.set_discontinued("Side", "A", false).unwrap().await.unwrap();

        assert!(!engine.selection().is_selected("Side", "A"));
        assert!(engine.is_selectable("Side", "A"));
        assert_eq!(engine.toggle("Side", "A"), ToggleOutcome::Selected);
    }

    #[test]
    fn test_set_discontinued_unknown_item_is_rejected() {
        let harness = Harness::new();
        let mut engine = harness.engine();

        let err = engine.set_discontinued("Main", "Pizza", true).unwrap_err();
        assert!(matches!(err, MenuError::Validation(_)));
        assert!(engine.overlay().discontinued().is_empty());
    }

    #[test]
    fn test_delete_catalog_item_is_refused() {
        let harness = Harness::new();
        let mut engine = harness.engine();
        engine.toggle("Main", "Curry");

        let catalog = engine.catalog().clone();
        let selection = engine.selection().clone();
        let overlay = engine.overlay().clone();

        assert!(engine.delete_custom("Main", "Curry").is_none());
        assert_eq!(engine.catalog(), &catalog);
        assert_eq!(engine.selection(), &selection);
        assert_eq!(engine.overlay(), &overlay);
        assert!(harness.remote.calls().is_empty());
    }

    #[test]
    fn test_add_custom_validation_changes_nothing() {
        let harness = Harness::new();
        let mut engine = harness.engine();
        let before = engine.catalog().clone();

        let cases = [
            MenuItem::custom("Side", "  ", 1.0, 1.0, 1.0, 10.0),
            MenuItem::custom("", "Pickles", 1.0, 1.0, 1.0, 10.0),
            MenuItem::custom("Side", "Pickles", 1.0, 1.0, 1.0, 0.0),
            MenuItem::custom("Side", "Pickles", -1.0, 1.0, 1.0, 10.0),
            MenuItem::custom("Side", "Pickles", 1.0, f64::NAN, 1.0, 10.0),
            MenuItem::custom("Side", "A", 1.0, 1.0, 1.0, 10.0),
        ];
        for item in cases {
            let err = engine.add_custom(item.clone()).unwrap_err();
            assert!(matches!(err, MenuError::Validation(_)), "{item:?} gave {err:?}");
        }

        assert_eq!(engine.catalog(), &before);
        assert!(harness.durable.is_empty());
    }

    #[tokio::test]
    async fn test_add_and_delete_custom() {
        let harness = Harness::new();
        let mut engine = harness.engine();

        engine.add_custom(pickles()).unwrap().await.unwrap();
        assert!(engine.overlay().is_custom("Side", "Pickles"));
        assert!(harness.durable.get(CUSTOM_ITEMS).unwrap().contains("Pickles"));

        engine.toggle("Side", "Pickles");
        assert_eq!(engine.totals().calories, 15.0);

        engine.delete_custom("Side", "Pickles").unwrap().await.unwrap();
        assert!(!engine.catalog().contains("Side", "Pickles"));
        assert!(!engine.selection().is_selected("Side", "Pickles"));
        assert!(!engine.overlay().is_custom("Side", "Pickles"));
        assert_eq!(engine.totals().calories, 0.0);

        assert_eq!(harness.remote.calls(), vec!["upsert Side/Pickles", "delete Side/Pickles"]);
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_local_change() {
        let harness = Harness::with_remote(FakeRemote::failing());
        let mut engine = harness.engine();

        let err = engine.add_custom(pickles()).unwrap().await.unwrap_err();
        assert!(matches!(err, MenuError::RemoteWrite { action: "upsert", .. }));
        assert!(err.to_string().contains("local change kept"));

        assert!(engine.catalog().contains("Side", "Pickles"));
        assert!(harness.durable.get(CUSTOM_ITEMS).unwrap().contains("Pickles"));
    }

    #[tokio::test]
    async fn test_detached_write_runs_to_completion() {
        let harness = Harness::new();
        let mut engine = harness.engine();

        let handle = engine.set_discontinued("Side", "B", true).unwrap().detach();
        handle.await.unwrap();
        assert_eq!(harness.remote.calls(), vec!["status Side/B 販売中止"]);
    }

    #[test]
    fn test_state_survives_new_session() {
        let harness = Harness::new();
        {
            let mut engine = harness.engine();
            engine.toggle("Main", "Salad");
            engine.toggle("Side", "B");
            engine.toggle("Side", "A");
            let _ = engine.add_custom(pickles()).unwrap();
            let _ = engine.set_discontinued("Main", "Curry", true).unwrap();
        }

        let engine = harness.engine();
        assert!(engine.selection().is_selected("Main", "Salad"));
        let side: Vec<_> = engine.selection().selected("Side").collect();
        assert_eq!(side, vec!["B", "A"]);
        assert!(engine.catalog().get("Side", "Pickles").unwrap().is_custom());
        assert!(!engine.is_selectable("Main", "Curry"));
    }

    #[tokio::test]
    async fn test_refresh_reconciles_stale_selection() {
        let harness = Harness::new();
        let mut engine = harness.engine();
        engine.toggle("Side", "A");
        engine.toggle("Side", "B");
        engine.add_custom(pickles()).unwrap().await.unwrap();

        // Remote no longer lists A and reports B as discontinued
        let remote = FakeRemote::with_catalog(vec![
            MenuItem::new("Main", "Curry", 10.0, 20.0, 60.0, 500.0),
            MenuItem::new("Side", "B", 1.0, 1.0, 1.0, 50.0).with_status(ItemStatus::Discontinued),
        ]);
        let fallback = CsvCatalog::from_text("");
        let origin = engine.refresh_catalog(&remote, &fallback).await;

        assert_eq!(origin, CatalogOrigin::Remote);
        assert_eq!(engine.selection().count("Side"), 0);
        assert!(engine.overlay().is_discontinued("Side", "B"));
        // Custom items survive a catalog refresh
        assert!(engine.catalog().contains("Side", "Pickles"));
        assert_eq!(harness.durable.get(SELECTION).as_deref(), Some(r#"{"Side":[]}"#));
    }

    #[tokio::test]
    async fn test_refresh_with_no_source_keeps_state() {
        let harness = Harness::new();
        let mut engine = harness.engine();
        engine.toggle("Main", "Curry");

        let missing = CsvCatalog::from_path("/nonexistent/menu.csv");
        let origin = engine.refresh_catalog(&FakeRemote::failing(), &missing).await;

        assert_eq!(origin, CatalogOrigin::Empty);
        assert!(engine.selection().is_selected("Main", "Curry"));
        assert_eq!(engine.catalog().len(), 4);
    }

    #[tokio::test]
    async fn test_unusable_fallback_keeps_selection_and_backup() {
        let harness = Harness::new();
        let mut engine = harness.engine();
        engine.toggle("Main", "Curry");
        engine.toggle("Side", "A");
        let durable_before = harness.durable.get(SELECTION);
        let session_before = harness.session.get(SELECTION);

        let header_only = CsvCatalog::from_text("h\nbad,row\n");
        let origin = engine.refresh_catalog(&FakeRemote::failing(), &header_only).await;

        assert_eq!(origin, CatalogOrigin::Empty);
        assert_eq!(engine.catalog().len(), 4);
        assert!(engine.selection().is_selected("Main", "Curry"));
        assert!(engine.selection().is_selected("Side", "A"));
        assert_eq!(harness.durable.get(SELECTION), durable_before);
        assert_eq!(harness.session.get(SELECTION), session_before);
    }

    #[test]
    fn test_single_select_trim_skips_stale_names() {
        let harness = Harness::new();
        harness.durable.set(SELECTION, r#"{"Main":["Curry","Stale"]}"#).unwrap();

        let mut engine = harness.bare_engine();
        assert_eq!(engine.selection().count("Main"), 2);
        engine.install_catalog(vec![MenuItem::new("Main", "Curry", 10.0, 20.0, 60.0, 500.0)]);

        let selected: Vec<_> = engine.selection().selected("Main").collect();
        assert_eq!(selected, vec!["Curry"]);
    }

    #[tokio::test]
    async fn test_refresh_uses_fallback() {
        let harness = Harness::new();
        let mut engine = harness.bare_engine();

        let fallback = CsvCatalog::from_text("category,name,p,f,c,kcal,image\nMain,\"Curry, Large\",12,25,80,650,\n");
        let origin = engine.refresh_catalog(&FakeRemote::failing(), &fallback).await;

        assert_eq!(origin, CatalogOrigin::Fallback);
        assert_eq!(engine.toggle("Main", "Curry, Large"), ToggleOutcome::Selected);
        assert_eq!(engine.totals().calories, 650.0);
    }

    #[test]
    fn test_selection_kept_until_catalog_installed() {
        let harness = Harness::new();
        harness.durable.set(SELECTION, r#"{"Main":"Curry"}"#).unwrap();

        let mut engine = harness.bare_engine();
        assert!(engine.selection().is_selected("Main", "Curry"));

        engine.install_catalog(menu());
        assert!(engine.selection().is_selected("Main", "Curry"));
        assert_eq!(engine.totals().calories, 500.0);
    }

    #[test]
    fn test_reset_detection_and_restore() {
        let harness = Harness::new();
        {
            let mut engine = harness.engine();
            engine.toggle("Main", "Salad");
            let _ = engine.add_custom(pickles()).unwrap();
        }

        harness.durable.clear();
        let mut engine = harness.engine();
        assert!(engine.selection().is_empty());
        assert!(engine.detect_reset_and_offer());

        let outcome = engine.restore_backup().unwrap();
        assert!(outcome.requires_reload());
        // Nothing changes in memory until the caller reloads
        assert!(engine.selection().is_empty());

        engine.reload_local_state();
        assert!(engine.selection().is_selected("Main", "Salad"));
        assert!(engine.catalog().contains("Side", "Pickles"));
        assert!(!engine.detect_reset_and_offer());
    }

    #[test]
    fn test_clear_and_clear_all_persist() {
        let harness = Harness::new();
        let mut engine = harness.engine();
        engine.toggle("Main", "Curry");
        engine.toggle("Side", "A");

        engine.clear("Side");
        assert_eq!(engine.selection().count("Side"), 0);
        assert!(engine.selection().is_selected("Main", "Curry"));

        engine.clear_all();
        assert!(engine.selection().is_empty());
        assert_eq!(harness.durable.get(SELECTION).as_deref(), Some(r#"{"Main":[],"Side":[]}"#));
    }

    #[test]
    fn test_ordered_categories_and_selected_items() {
        let harness = Harness::new();
        let mut engine = harness.engine();
        engine.toggle("Side", "B");
        engine.toggle("Main", "Curry");

        assert_eq!(engine.ordered_categories(), vec!["Main", "Side"]);
        assert_eq!(engine.label_for("Side").en, "SIDE");

        let names: Vec<_> = engine.selected_items().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["B", "Curry"]);
    }
}
