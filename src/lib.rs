//! Menu configurator core
//!
//! Category-based menu selection with per-category cardinality policies,
//! custom and discontinued item lifecycle, nutrition totals and local
//! persistence with session backup. `MenuEngine` ties the pieces together.

#![forbid(unsafe_code)]

pub mod catalog;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod nutrition;
pub mod overlay;
pub mod persistence;
pub mod remote;
pub mod selection;
pub mod storage;
pub mod types;

pub use catalog::{CatalogOrigin, CatalogStore};
pub use config::MenuConfig;
pub use engine::{MenuEngine, RemoteWrite, ToggleOutcome};
pub use error::{MenuError, MenuResult};
pub use nutrition::{compute_totals, NutritionTotals, PfcBreakdown};
pub use overlay::LifecycleOverlay;
pub use persistence::{LocalSnapshot, PersistenceBridge, RestoreOutcome};
pub use selection::{SelectionPolicies, SelectionPolicy, SelectionState};
pub use types::{ItemKey, ItemOrigin, ItemStatus, MenuItem};
