//! Scorer — read-only node ranking by remaining plan quota.

use std::sync::Arc;

use tracing::debug;
use warpgrid_state::NodeInfo;

use crate::plan::PlanSnapshot;
use crate::stats::NominationStats;
use crate::workload::WorkloadInstance;

/// Scores a resolved node for an instance. Holds no mutable state.
#[derive(Debug, Clone)]
pub struct Scorer {
    plan_annotation: String,
    multiplier: i64,
    stats: Arc<NominationStats>,
}

impl Scorer {
    /// `multiplier` must be at least 1; [`crate::Nomination::new`] checks it.
    pub(crate) fn new(
        plan_annotation: impl Into<String>,
        multiplier: i64,
        stats: Arc<NominationStats>,
    ) -> Self {
        Self {
            plan_annotation: plan_annotation.into(),
            multiplier,
            stats,
        }
    }

    /// `remaining * multiplier` for the first owner whose key is in the
    /// node's plan; 0 without owners, without a plan, or without a match.
    pub fn score(&self, instance: &WorkloadInstance, node: &NodeInfo) -> i64 {
        if instance.owner_references.is_empty() {
            self.stats.record_score(false);
            debug!(instance = %instance.name, node = %node.id, "no owners, not scoring");
            return 0;
        }

        let plan = PlanSnapshot::from_node(node, &self.plan_annotation, &self.stats);
        if plan.is_empty() {
            self.stats.record_score(false);
            return 0;
        }

        let keys = instance.workload_keys();
        match plan.first_match(&keys) {
            Some((key, remaining)) => {
                self.stats.record_score(true);
                let score = quota_score(remaining, self.multiplier);
                debug!(
                    instance = %instance.name,
                    node = %node.id,
                    %key,
                    remaining,
                    score,
                    "plan match"
                );
                score
            }
            None => {
                self.stats.record_score(false);
                0
            }
        }
    }
}

fn quota_score(remaining: u64, multiplier: i64) -> i64 {
    i64::try_from(remaining)
        .unwrap_or(i64::MAX)
        .saturating_mul(multiplier)
}
