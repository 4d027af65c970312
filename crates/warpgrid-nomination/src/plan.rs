//! Plan snapshot — the per-node quota map written by the planner.
//!
//! Wire format is a flat JSON object mapping workload keys to remaining
//! quota: `{"ReplicaSet/ns1/app1": 2, "ReplicaSet/ns1/app2": 1}`. Keys are
//! kept sorted so encoding is canonical and iteration is deterministic.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use warpgrid_state::NodeInfo;

use crate::stats::NominationStats;
use crate::workload::WorkloadKey;

/// A present but unparsable plan annotation.
#[derive(Debug, Error)]
#[error("malformed plan snapshot: {0}")]
pub struct PlanDecodeError(#[from] serde_json::Error);

/// Result of consuming one unit of quota for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumption {
    Consumed { remaining: u64 },
    /// Key present at zero; nothing taken.
    Exhausted,
    Missing,
}

/// Keys touched by [`PlanSnapshot::admit_keys`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyAdmission {
    /// Matched with quota left; decremented by one.
    pub consumed: Vec<WorkloadKey>,
    /// Matched at zero; left as is.
    pub exhausted: Vec<WorkloadKey>,
}

impl KeyAdmission {
    pub fn matched(&self) -> bool {
        !self.consumed.is_empty() || !self.exhausted.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanSnapshot {
    quotas: BTreeMap<WorkloadKey, u64>,
}

impl PlanSnapshot {
    /// Decode an annotation value. Empty input is an empty plan.
    pub fn decode(raw: &str) -> Result<Self, PlanDecodeError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }

    /// Decode, degrading a malformed value to an empty plan.
    ///
    /// The failure is logged against `node_id` and counted in `stats`.
    pub fn decode_lenient(raw: &str, node_id: &str, stats: &NominationStats) -> Self {
        match Self::decode(raw) {
            Ok(plan) => plan,
            Err(e) => {
                stats.record_decode_failure();
                warn!(node = %node_id, error = %e, "ignoring malformed plan annotation");
                Self::default()
            }
        }
    }

    /// Read the plan stored under `annotation` on `node`.
    pub fn from_node(node: &NodeInfo, annotation: &str, stats: &NominationStats) -> Self {
        match node.annotation(annotation) {
            Some(raw) => Self::decode_lenient(raw, &node.id, stats),
            None => Self::default(),
        }
    }

    /// Canonical compact JSON, keys sorted.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn get(&self, key: &WorkloadKey) -> Option<u64> {
        self.quotas.get(key).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.quotas.is_empty()
    }

    pub fn len(&self) -> usize {
        self.quotas.len()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, WorkloadKey, u64> {
        self.quotas.iter()
    }

    /// First of `keys` present in the plan, with its remaining quota.
    pub fn first_match<'k>(&self, keys: &'k [WorkloadKey]) -> Option<(&'k WorkloadKey, u64)> {
        keys.iter()
            .find_map(|key| self.get(key).map(|quota| (key, quota)))
    }

    /// Take one unit of quota for `key`. Quota never goes below zero.
    pub fn consume(&mut self, key: &WorkloadKey) -> Consumption {
        match self.quotas.get_mut(key) {
            Some(0) => Consumption::Exhausted,
            Some(quota) => {
                *quota -= 1;
                Consumption::Consumed { remaining: *quota }
            }
            None => Consumption::Missing,
        }
    }

    /// Consume one unit for every one of `keys` present in the plan.
    pub fn admit_keys(&mut self, keys: &[WorkloadKey]) -> KeyAdmission {
        let mut admission = KeyAdmission::default();
        for key in keys {
            match self.consume(key) {
                Consumption::Consumed { .. } => admission.consumed.push(key.clone()),
                Consumption::Exhausted => admission.exhausted.push(key.clone()),
                Consumption::Missing => {}
            }
        }
        admission
    }
}

impl FromIterator<(WorkloadKey, u64)> for PlanSnapshot {
    fn from_iter<I: IntoIterator<Item = (WorkloadKey, u64)>>(iter: I) -> Self {
        Self {
            quotas: iter.into_iter().collect(),
        }
    }
}
