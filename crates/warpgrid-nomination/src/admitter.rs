//! Admitter — consumes plan quota once the scheduler has picked a node.
//!
//! Runs at pre-bind. Reads the chosen node's plan, takes one unit of quota
//! for every workload key of the instance present in the plan, and writes
//! the plan back before the bind is allowed to proceed.
//!
//! The write is conditioned on the `resource_version` observed at read
//! time. A concurrent admission (or a planner update) that lands in between
//! makes the write fail with a conflict; the admitter then starts over from
//! a fresh read, so no decrement is ever lost.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cluster::NodeAccessor;
use crate::error::{NominationError, NominationResult};
use crate::plan::PlanSnapshot;
use crate::stats::NominationStats;
use crate::workload::{WorkloadInstance, WorkloadKey};

/// What an admission did. Every variant lets the bind proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmitOutcome {
    /// Node carries no plan (absent, empty, or unparsable).
    NoPlan,
    /// Plan present but none of the instance's keys are in it.
    NoMatch,
    /// At least one key matched; the plan was written back.
    Admitted {
        /// Keys decremented by one.
        consumed: Vec<WorkloadKey>,
        /// Keys matched at zero quota.
        exhausted: Vec<WorkloadKey>,
        /// Node version after the write.
        resource_version: u64,
    },
}

impl AdmitOutcome {
    /// Whether the node's plan annotation was written.
    pub fn mutated(&self) -> bool {
        matches!(self, AdmitOutcome::Admitted { .. })
    }
}

pub struct Admitter<A> {
    accessor: Arc<A>,
    plan_annotation: String,
    max_attempts: u32,
    stats: Arc<NominationStats>,
}

impl<A: NodeAccessor> Admitter<A> {
    pub(crate) fn new(
        accessor: Arc<A>,
        plan_annotation: impl Into<String>,
        max_attempts: u32,
        stats: Arc<NominationStats>,
    ) -> Self {
        Self {
            accessor,
            plan_annotation: plan_annotation.into(),
            max_attempts: max_attempts.max(1),
            stats,
        }
    }

    /// Admit `instance` onto `node_id`, consuming plan quota.
    ///
    /// An error means the bind must not proceed.
    pub fn admit(
        &self,
        instance: &WorkloadInstance,
        node_id: &str,
    ) -> NominationResult<AdmitOutcome> {
        self.stats.record_admit_call();
        let result = self.admit_with_retry(instance, node_id);
        if let Err(e) = &result {
            self.stats.record_admission_failure();
            warn!(instance = %instance.name, node = %node_id, error = %e, "admission rejected");
        }
        result
    }

    fn admit_with_retry(
        &self,
        instance: &WorkloadInstance,
        node_id: &str,
    ) -> NominationResult<AdmitOutcome> {
        let keys = instance.workload_keys();

        for attempt in 1..=self.max_attempts {
            let node = self
                .accessor
                .get_node(node_id)
                .map_err(|source| NominationError::Access {
                    node: node_id.to_string(),
                    source,
                })?
                .ok_or_else(|| NominationError::NodeNotFound(node_id.to_string()))?;

            let mut plan = PlanSnapshot::from_node(&node, &self.plan_annotation, &self.stats);
            if plan.is_empty() {
                debug!(node = %node_id, "no plan on node");
                return Ok(AdmitOutcome::NoPlan);
            }

            let admission = plan.admit_keys(&keys);
            if !admission.matched() {
                debug!(instance = %instance.name, node = %node_id, "instance not in plan");
                return Ok(AdmitOutcome::NoMatch);
            }

            let encoded = plan.encode().map_err(|source| NominationError::Encode {
                node: node_id.to_string(),
                source,
            })?;

            match self.accessor.patch_annotation(
                node_id,
                &self.plan_annotation,
                &encoded,
                Some(node.resource_version),
            ) {
                Ok(updated) => {
                    self.stats.record_admission(admission.consumed.len());
                    info!(
                        instance = %instance.name,
                        node = %node_id,
                        consumed = admission.consumed.len(),
                        exhausted = admission.exhausted.len(),
                        version = updated.resource_version,
                        "plan quota consumed"
                    );
                    return Ok(AdmitOutcome::Admitted {
                        consumed: admission.consumed,
                        exhausted: admission.exhausted,
                        resource_version: updated.resource_version,
                    });
                }
                Err(e) if e.is_conflict() => {
                    self.stats.record_conflict();
                    warn!(
                        node = %node_id,
                        attempt,
                        error = %e,
                        "plan changed during admission, retrying"
                    );
                }
                Err(source) => {
                    return Err(NominationError::Persist {
                        node: node_id.to_string(),
                        source,
                    });
                }
            }
        }

        Err(NominationError::ConflictRetriesExhausted {
            node: node_id.to_string(),
            attempts: self.max_attempts,
        })
    }
}
