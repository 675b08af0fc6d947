//! Local persistence of selection, lifecycle flags and custom items
//!
//! The durable store is the source of truth across sessions. Every save is
//! mirrored into a session-scoped shadow store together with a timestamp so
//! that a wiped durable store can be recovered while the session lasts.

use chrono::{DateTime, TimeZone, Utc};
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::constants::storage::{BACKUP_TIMESTAMP, CUSTOM_ITEMS, DISCONTINUED, MIRRORED, SELECTION};
use crate::error::{MenuError, MenuResult};
use crate::overlay::LifecycleOverlay;
use crate::selection::SelectionState;
use crate::storage::KeyValueStore;
use crate::types::{ItemOrigin, MenuItem};

/// State recovered from the durable store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalSnapshot {
    pub selection: SelectionState,
    pub overlay: LifecycleOverlay,
    pub custom_items: Vec<MenuItem>,
}

/// What `restore` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Keys were copied back; in-memory state must be reloaded
    Restored { keys: usize },
    /// The shadow store held nothing to copy
    NothingToRestore,
}

impl RestoreOutcome {
    pub fn requires_reload(&self) -> bool {
        matches!(self, RestoreOutcome::Restored { .. })
    }
}

pub struct PersistenceBridge {
    durable: Box<dyn KeyValueStore>,
    session: Box<dyn KeyValueStore>,
}

impl PersistenceBridge {
    pub fn new(durable: Box<dyn KeyValueStore>, session: Box<dyn KeyValueStore>) -> Self {
        Self { durable, session }
    }

    // ===== Save =====

    /// Write all three keys to the durable store and mirror them
    ///
    /// Durable write failures are returned. Shadow write failures are only
    /// logged: the shadow is a recovery aid, not a second source of truth.
    pub fn save(
        &self,
        selection: &SelectionState,
        overlay: &LifecycleOverlay,
        custom_items: &[MenuItem],
    ) -> MenuResult<()> {
        let payload = [
            (CUSTOM_ITEMS, encode(&group_by_category(custom_items))?),
            (SELECTION, encode(selection)?),
            (DISCONTINUED, encode(overlay.discontinued())?),
        ];

        let entries: Vec<(&str, &str)> = payload.iter().map(|(key, value)| (*key, value.as_str())).collect();
        self.durable.set_many(&entries)?;

        let now = Utc::now().timestamp_millis().to_string();
        let mut shadow = entries;
        shadow.push((BACKUP_TIMESTAMP, now.as_str()));
        if let Err(e) = self.session.set_many(&shadow) {
            warn!(error = %e, "Failed to mirror local state to session store");
        }

        debug!(
            selected = selection.total(),
            custom = custom_items.len(),
            "Local state saved"
        );
        Ok(())
    }

    // ===== Load =====

    /// Read the durable store, discarding malformed keys one at a time
    pub fn load(&self) -> LocalSnapshot {
        let selection = self
            .read_key::<SelectionState>(SELECTION)
            .unwrap_or_default();
        let discontinued = self
            .read_key::<IndexMap<String, IndexSet<String>>>(DISCONTINUED)
            .unwrap_or_default();
        let custom_items = self.read_custom_items();

        let mut overlay = LifecycleOverlay::from_parts(IndexMap::new(), discontinued);
        for item in &custom_items {
            overlay.mark_custom(&item.category, &item.name);
        }

        info!(
            selected = selection.total(),
            custom = custom_items.len(),
            discontinued = overlay.discontinued().values().map(IndexSet::len).sum::<usize>(),
            "Local state loaded"
        );

        LocalSnapshot {
            selection,
            overlay,
            custom_items,
        }
    }

    fn read_key<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.durable.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                let err = MenuError::malformed(key, e);
                warn!(key = key, error = %err, "Discarding malformed stored key");
                None
            }
        }
    }

    /// Custom items, stored as category → [item]
    ///
    /// Individual records that fail to parse are dropped. A record without
    /// a category takes the one it is filed under.
    fn read_custom_items(&self) -> Vec<MenuItem> {
        let Some(grouped) = self.read_key::<IndexMap<String, Vec<Value>>>(CUSTOM_ITEMS) else {
            return Vec::new();
        };

        let mut items = Vec::new();
        for (category, records) in grouped {
            for mut record in records {
                if let Value::Object(fields) = &mut record {
                    fields
                        .entry("category")
                        .or_insert_with(|| Value::String(category.clone()));
                }
                match serde_json::from_value::<MenuItem>(record) {
                    Ok(mut item) if !item.name.is_empty() => {
                        item.origin = ItemOrigin::Custom;
                        items.push(item);
                    }
                    Ok(_) => {
                        warn!(category = %category, "Dropping stored custom item without a name");
                    }
                    Err(e) => {
                        warn!(category = %category, error = %e, "Dropping malformed stored custom item");
                    }
                }
            }
        }
        items
    }

    // ===== Backup / restore =====

    /// True when the durable store lost its data but the shadow still has some
    pub fn detect_reset_and_offer(&self) -> bool {
        let durable_empty = MIRRORED.iter().all(|key| self.durable.get(key).is_none());
        if !durable_empty {
            return false;
        }

        let offer = MIRRORED
            .iter()
            .filter_map(|key| self.session.get(key))
            .any(|raw| has_content(&raw));
        if offer {
            info!(taken_at = ?self.backup_taken_at(), "Durable store is empty but a session backup exists");
        }
        offer
    }

    /// Copy the shadow store back into the durable store
    pub fn restore(&self) -> MenuResult<RestoreOutcome> {
        let backup: Vec<(&str, String)> = MIRRORED
            .iter()
            .filter_map(|key| self.session.get(key).map(|value| (*key, value)))
            .collect();
        let keys = backup.len();

        if keys > 0 {
            let entries: Vec<(&str, &str)> = backup.iter().map(|(key, value)| (*key, value.as_str())).collect();
            self.durable.set_many(&entries)?;
        }

        if keys == 0 {
            warn!("Restore requested but the session store holds no backup");
            return Ok(RestoreOutcome::NothingToRestore);
        }
        info!(keys = keys, "Restored local state from session backup");
        Ok(RestoreOutcome::Restored { keys })
    }

    /// When the shadow store was last written
    pub fn backup_taken_at(&self) -> Option<DateTime<Utc>> {
        let millis = self.session.get(BACKUP_TIMESTAMP)?.trim().parse::<i64>().ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }
}

fn group_by_category(items: &[MenuItem]) -> IndexMap<&str, Vec<&MenuItem>> {
    let mut grouped: IndexMap<&str, Vec<&MenuItem>> = IndexMap::new();
    for item in items {
        grouped.entry(item.category.as_str()).or_default().push(item);
    }
    grouped
}

fn encode<T: serde::Serialize + ?Sized>(value: &T) -> MenuResult<String> {
    serde_json::to_string(value).map_err(|e| MenuError::Storage(format!("cannot serialize state: {e}")))
}

/// Whether a stored JSON value carries any entries worth restoring
fn has_content(raw: &str) -> bool {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map.values().any(|v| match v {
            Value::Array(entries) => !entries.is_empty(),
            Value::String(s) => !s.is_empty(),
            Value::Null => false,
            _ => true,
        }),
        Ok(Value::Array(entries)) => !entries.is_empty(),
        _ => false,
    }
}
