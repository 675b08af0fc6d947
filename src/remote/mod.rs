//! Remote collaborators
//!
//! The engine only talks to these traits. `HttpRemote` is the networked
//! implementation, `CsvCatalog` reads the fallback text resource and
//! `OfflineRemote` stands in when no remote is configured.

mod http;
mod messages;

pub use http::HttpRemote;
pub use messages::RemoteDocument;

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use crate::catalog::parse_catalog_text;
use crate::error::{MenuError, MenuResult};
use crate::types::{ItemStatus, MenuItem};

/// Something that can produce the full menu catalog
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &str;

    async fn fetch_catalog(&self) -> MenuResult<Vec<MenuItem>>;
}

/// Write side of the remote menu store
#[async_trait]
pub trait RemoteSink: Send + Sync {
    async fn upsert_item(&self, item: &MenuItem) -> MenuResult<()>;

    async fn delete_item(&self, category: &str, name: &str) -> MenuResult<()>;

    async fn set_status(&self, category: &str, name: &str, status: ItemStatus) -> MenuResult<()>;
}

/// Catalog backed by the fallback text resource
#[derive(Debug, Clone)]
pub enum CsvCatalog {
    File(PathBuf),
    Text(String),
}

impl CsvCatalog {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        CsvCatalog::File(path.into())
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        CsvCatalog::Text(text.into())
    }
}

#[async_trait]
impl CatalogSource for CsvCatalog {
    fn name(&self) -> &str {
        match self {
            CsvCatalog::File(_) => "csv-file",
            CsvCatalog::Text(_) => "csv-text",
        }
    }

    async fn fetch_catalog(&self) -> MenuResult<Vec<MenuItem>> {
        match self {
            CsvCatalog::File(path) => {
                let text = tokio::fs::read_to_string(path).await.map_err(|e| {
                    MenuError::TransientFetch(format!("cannot read {}: {e}", path.display()))
                })?;
                Ok(parse_catalog_text(&text))
            }
            CsvCatalog::Text(text) => Ok(parse_catalog_text(text)),
        }
    }
}

/// Remote stand-in used when no endpoint is configured
///
/// Fetching always fails so the fallback is used; writes are local-only no-ops.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRemote;

#[async_trait]
impl CatalogSource for OfflineRemote {
    fn name(&self) -> &str {
        "offline"
    }

    async fn fetch_catalog(&self) -> MenuResult<Vec<MenuItem>> {
        Err(MenuError::TransientFetch("no remote configured".to_string()))
    }
}

#[async_trait]
impl RemoteSink for OfflineRemote {
    async fn upsert_item(&self, item: &MenuItem) -> MenuResult<()> {
        debug!(category = %item.category, name = %item.name, "Remote disabled, upsert kept local");
        Ok(())
    }

    async fn delete_item(&self, category: &str, name: &str) -> MenuResult<()> {
        debug!(category = %category, name = %name, "Remote disabled, delete kept local");
        Ok(())
    }

    async fn set_status(&self, category: &str, name: &str, status: ItemStatus) -> MenuResult<()> {
        debug!(category = %category, name = %name, status = ?status, "Remote disabled, status kept local");
        Ok(())
    }
}
