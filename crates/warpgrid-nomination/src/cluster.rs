//! Node accessor — the scheduler-state seam the plugin reads and patches.

use std::collections::BTreeMap;

use warpgrid_state::{AnnotationPatch, NodeInfo, StateResult, StateStore};

/// Resolves nodes and applies scoped annotation updates.
///
/// `patch_annotation` must touch only `key`, and when `precondition` is
/// set must fail with [`warpgrid_state::StateError::Conflict`] instead of
/// writing over a newer record.
pub trait NodeAccessor: Send + Sync {
    fn get_node(&self, node_id: &str) -> StateResult<Option<NodeInfo>>;

    fn patch_annotation(
        &self,
        node_id: &str,
        key: &str,
        value: &str,
        precondition: Option<u64>,
    ) -> StateResult<NodeInfo>;
}

impl NodeAccessor for StateStore {
    fn get_node(&self, node_id: &str) -> StateResult<Option<NodeInfo>> {
        StateStore::get_node(self, node_id)
    }

    fn patch_annotation(
        &self,
        node_id: &str,
        key: &str,
        value: &str,
        precondition: Option<u64>,
    ) -> StateResult<NodeInfo> {
        let patch: AnnotationPatch = BTreeMap::from([(key.to_string(), Some(value.to_string()))]);
        self.patch_node_annotations(node_id, &patch, precondition)
    }
}
