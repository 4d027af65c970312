//! Domain types for the WarpGrid state store.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Unique identifier for a node in the cluster.
pub type NodeId = String;

// ── Node ──────────────────────────────────────────────────────────

/// A node record as seen by schedulers and controllers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NodeInfo {
    pub id: NodeId,
    /// Arbitrary labels for scheduling affinity.
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Free-form advisory data written by controllers (e.g. placement plans).
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Bumped by the store on every write. Zero means "never stored".
    #[serde(default)]
    pub resource_version: u64,
}

impl NodeInfo {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Look up an annotation, treating an empty value as absent.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }
}
