//! StateStore — redb-backed node persistence for WarpGrid.
//!
//! Provides typed CRUD over node records plus a merge-style annotation
//! patch guarded by an optional resource-version precondition. All values
//! are JSON-serialized into redb's `&[u8]` value columns. The store
//! supports both on-disk and in-memory backends (the latter for testing).

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Annotation changes applied by [`StateStore::patch_node_annotations`].
///
/// `Some(value)` sets the key, `None` removes it. Keys not mentioned are
/// left untouched (JSON merge-patch semantics).
pub type AnnotationPatch = BTreeMap<String, Option<String>>;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe node store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(NODES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Nodes ──────────────────────────────────────────────────────

    /// Insert or replace a node record. Returns the new resource version.
    ///
    /// The caller's `resource_version` is ignored; the store assigns
    /// `previous + 1` (or 1 for a new node).
    pub fn put_node(&self, node: &NodeInfo) -> StateResult<u64> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let version;
        {
            let mut table = txn.open_table(NODES).map_err(map_err!(Table))?;
            let previous = table
                .get(node.id.as_str())
                .map_err(map_err!(Read))?
                .map(|guard| decode_node(guard.value()))
                .transpose()?
                .map_or(0, |n| n.resource_version);

            let mut stored = node.clone();
            stored.resource_version = previous + 1;
            version = stored.resource_version;

            let value = serde_json::to_vec(&stored).map_err(map_err!(Serialize))?;
            table
                .insert(stored.id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(node = %node.id, version, "node stored");
        Ok(version)
    }

    /// Get a node by ID.
    pub fn get_node(&self, node_id: &str) -> StateResult<Option<NodeInfo>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(NODES).map_err(map_err!(Table))?;
        match table.get(node_id).map_err(map_err!(Read))? {
            Some(guard) => Ok(Some(decode_node(guard.value())?)),
            None => Ok(None),
        }
    }

    /// List all nodes.
    pub fn list_nodes(&self) -> StateResult<Vec<NodeInfo>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(NODES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            results.push(decode_node(value.value())?);
        }
        Ok(results)
    }

    /// Delete a node by ID. Returns true if it existed.
    pub fn delete_node(&self, node_id: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(NODES).map_err(map_err!(Table))?;
            existed = table.remove(node_id).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(node = %node_id, existed, "node deleted");
        Ok(existed)
    }

    /// Merge `patch` into a node's annotations and return the updated record.
    ///
    /// When `precondition` is set, the write only happens if the stored
    /// `resource_version` still equals it; otherwise [`StateError::Conflict`]
    /// is returned and nothing is written. Labels and annotations not named
    /// in the patch are preserved.
    pub fn patch_node_annotations(
        &self,
        node_id: &str,
        patch: &AnnotationPatch,
        precondition: Option<u64>,
    ) -> StateResult<NodeInfo> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let outcome = {
            let mut table = txn.open_table(NODES).map_err(map_err!(Table))?;
            let current = table
                .get(node_id)
                .map_err(map_err!(Read))?
                .map(|guard| decode_node(guard.value()))
                .transpose()?;

            match current {
                None => Err(StateError::NotFound(format!("node {node_id}"))),
                Some(node) if precondition.is_some_and(|v| v != node.resource_version) => {
                    Err(StateError::Conflict {
                        node_id: node_id.to_string(),
                        expected: precondition.unwrap_or_default(),
                        actual: node.resource_version,
                    })
                }
                Some(mut node) => {
                    for (key, value) in patch {
                        match value {
                            Some(v) => {
                                node.annotations.insert(key.clone(), v.clone());
                            }
                            None => {
                                node.annotations.remove(key);
                            }
                        }
                    }
                    node.resource_version += 1;
                    let value = serde_json::to_vec(&node).map_err(map_err!(Serialize))?;
                    table
                        .insert(node_id, value.as_slice())
                        .map_err(map_err!(Write))?;
                    Ok(node)
                }
            }
        };

        match outcome {
            Ok(node) => {
                txn.commit().map_err(map_err!(Transaction))?;
                debug!(
                    node = %node_id,
                    version = node.resource_version,
                    keys = patch.len(),
                    "annotations patched"
                );
                Ok(node)
            }
            Err(e) => {
                txn.abort().map_err(map_err!(Transaction))?;
                Err(e)
            }
        }
    }
}

fn decode_node(bytes: &[u8]) -> StateResult<NodeInfo> {
    serde_json::from_slice(bytes).map_err(map_err!(Deserialize))
}
