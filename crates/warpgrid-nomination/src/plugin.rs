//! The two-phase extension the scheduler framework calls into.

use std::sync::Arc;

use crate::admitter::{AdmitOutcome, Admitter};
use crate::cluster::NodeAccessor;
use crate::config::NominationConfig;
use crate::error::{NominationError, NominationResult};
use crate::scorer::Scorer;
use crate::stats::NominationStats;
use crate::workload::WorkloadInstance;

/// Name used in logs and scheduler profiles.
pub const NAME: &str = "Nomination";

/// Raw score of one candidate node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeScore {
    pub node_id: String,
    pub score: i64,
}

/// Score-then-admit capability.
///
/// `score` is called once per candidate node and must not mutate cluster
/// state; `admit` is called once for the chosen node before binding, and
/// an error from it must stop the bind.
pub trait PlacementExtension: Send + Sync {
    fn name(&self) -> &str;

    fn score(&self, instance: &WorkloadInstance, node_id: &str) -> NominationResult<i64>;

    /// Called after all candidates are scored. No-op unless overridden.
    fn normalize_scores(
        &self,
        _instance: &WorkloadInstance,
        _scores: &mut [NodeScore],
    ) -> NominationResult<()> {
        Ok(())
    }

    fn admit(&self, instance: &WorkloadInstance, node_id: &str) -> NominationResult<AdmitOutcome>;
}

/// Plan-driven placement: prefers nodes with quota left for the
/// instance's workload and consumes that quota at bind time.
pub struct Nomination<A> {
    accessor: Arc<A>,
    config: NominationConfig,
    scorer: Scorer,
    admitter: Admitter<A>,
    stats: Arc<NominationStats>,
}

impl<A: NodeAccessor> Nomination<A> {
    pub fn new(accessor: Arc<A>, config: NominationConfig) -> NominationResult<Self> {
        config.validate()?;
        let stats = Arc::new(NominationStats::new());
        let scorer = Scorer::new(
            config.plan_annotation.clone(),
            config.score_multiplier,
            stats.clone(),
        );
        let admitter = Admitter::new(
            accessor.clone(),
            config.plan_annotation.clone(),
            config.max_patch_attempts,
            stats.clone(),
        );
        Ok(Self {
            accessor,
            config,
            scorer,
            admitter,
            stats,
        })
    }

    pub fn config(&self) -> &NominationConfig {
        &self.config
    }

    pub fn stats(&self) -> &NominationStats {
        &self.stats
    }

    /// Score every candidate, in the order given.
    pub fn score_nodes(
        &self,
        instance: &WorkloadInstance,
        node_ids: &[&str],
    ) -> NominationResult<Vec<NodeScore>> {
        let mut scores = node_ids
            .iter()
            .map(|node_id| {
                Ok(NodeScore {
                    node_id: node_id.to_string(),
                    score: self.score(instance, node_id)?,
                })
            })
            .collect::<NominationResult<Vec<_>>>()?;
        self.normalize_scores(instance, &mut scores)?;
        Ok(scores)
    }
}

impl<A: NodeAccessor> PlacementExtension for Nomination<A> {
    fn name(&self) -> &str {
        NAME
    }

    fn score(&self, instance: &WorkloadInstance, node_id: &str) -> NominationResult<i64> {
        let node = self
            .accessor
            .get_node(node_id)
            .map_err(|source| NominationError::Access {
                node: node_id.to_string(),
                source,
            })?
            .ok_or_else(|| NominationError::NodeNotFound(node_id.to_string()))?;
        Ok(self.scorer.score(instance, &node))
    }

    fn admit(&self, instance: &WorkloadInstance, node_id: &str) -> NominationResult<AdmitOutcome> {
        self.admitter.admit(instance, node_id)
    }
}
