use tracing::{error, info, warn};

use crate::remote::CatalogSource;
use crate::types::MenuItem;

/// Which source produced the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOrigin {
    Remote,
    Fallback,
    /// Both sources failed; the catalog is empty
    Empty,
}

/// Result of a catalog load
#[derive(Debug, Clone)]
pub struct CatalogLoad {
    pub items: Vec<MenuItem>,
    pub origin: CatalogOrigin,
}

/// Load the catalog from the primary source, falling back on any failure
///
/// An error or an empty response from the primary source switches to the
/// fallback. A fallback with no usable rows counts as unavailable. Errors
/// are logged, never returned.
pub async fn load_catalog(primary: &dyn CatalogSource, fallback: &dyn CatalogSource) -> CatalogLoad {
    match primary.fetch_catalog().await {
        Ok(items) if !items.is_empty() => {
            info!(source = primary.name(), count = items.len(), "Catalog loaded");
            return CatalogLoad {
                items,
                origin: CatalogOrigin::Remote,
            };
        }
        Ok(_) => {
            warn!(source = primary.name(), "Catalog source returned no items, using fallback");
        }
        Err(e) => {
            warn!(source = primary.name(), error = %e, "Catalog fetch failed, using fallback");
        }
    }

    match fallback.fetch_catalog().await {
        Ok(items) if !items.is_empty() => {
            info!(source = fallback.name(), count = items.len(), "Fallback catalog loaded");
            CatalogLoad {
                items,
                origin: CatalogOrigin::Fallback,
            }
        }
        Ok(_) => {
            error!(source = fallback.name(), "Fallback catalog has no usable rows, continuing with empty catalog");
            CatalogLoad {
                items: Vec::new(),
                origin: CatalogOrigin::Empty,
            }
        }
        Err(e) => {
            error!(source = fallback.name(), error = %e, "Fallback catalog unavailable, continuing with empty catalog");
            CatalogLoad {
                items: Vec::new(),
                origin: CatalogOrigin::Empty,
            }
        }
    }
}
