//! HTTP/JSON adapter for the remote menu store

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::messages::{documents_to_items, RemoteDocument, StatusPatch};
use super::{CatalogSource, RemoteSink};
use crate::constants::wire;
use crate::error::{MenuError, MenuResult};
use crate::types::{ItemKey, ItemStatus, MenuItem};

/// Remote store reachable over HTTP
///
/// `GET {base}/items` lists documents; single documents live at
/// `{base}/items/{category}_{name}`.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    base_url: String,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.base_url, wire::ITEMS_PATH)
    }

    fn document_url(&self, category: &str, name: &str) -> String {
        let id = ItemKey::new(category, name).document_id();
        format!("{}/{}", self.collection_url(), urlencoding::encode(&id))
    }
}

#[async_trait]
impl CatalogSource for HttpRemote {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn fetch_catalog(&self) -> MenuResult<Vec<MenuItem>> {
        let url = self.collection_url();
        debug!(url = %url, "Fetching remote catalog");

        let body = self.client.get(&url).send().await?.error_for_status()?.text().await?;
        parse_catalog_body(&body)
    }
}

/// Decode a collection listing; a body that is not a document array is malformed
fn parse_catalog_body(body: &str) -> MenuResult<Vec<MenuItem>> {
    let docs: Vec<RemoteDocument> =
        serde_json::from_str(body).map_err(|e| MenuError::malformed("remote catalog", e))?;
    Ok(documents_to_items(docs))
}

#[async_trait]
impl RemoteSink for HttpRemote {
    async fn upsert_item(&self, item: &MenuItem) -> MenuResult<()> {
        let url = self.document_url(&item.category, &item.name);
        self.client
            .put(&url)
            .json(&RemoteDocument::from(item))
            .send()
            .await?
            .error_for_status()?;
        info!(category = %item.category, name = %item.name, "Item saved to remote");
        Ok(())
    }

    async fn delete_item(&self, category: &str, name: &str) -> MenuResult<()> {
        let url = self.document_url(category, name);
        self.client.delete(&url).send().await?.error_for_status()?;
        info!(category = %category, name = %name, "Item deleted from remote");
        Ok(())
    }

    async fn set_status(&self, category: &str, name: &str, status: ItemStatus) -> MenuResult<()> {
        let url = self.document_url(category, name);
        self.client
            .patch(&url)
            .json(&StatusPatch {
                status: status.as_wire(),
            })
            .send()
            .await?
            .error_for_status()?;
        info!(category = %category, name = %name, status = status.as_wire(), "Item status updated on remote");
        Ok(())
    }
}
