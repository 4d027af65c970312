//! warpgrid-nomination — plan-driven placement hints for the scheduler.
//!
//! A rebalancing controller writes a *plan* onto a node: how many more
//! instances of each workload should land there. This crate lets the
//! scheduler honor that plan without knowing why it exists.
//!
//! # Components
//!
//! - **`plan`** — Plan snapshot codec (flat JSON object of workload key → quota)
//! - **`workload`** — Workload instances and workload key derivation
//! - **`scorer`** — Read-only node scoring by remaining quota
//! - **`admitter`** — Pre-bind quota consumption with versioned write-back
//! - **`plugin`** — The two-phase `PlacementExtension` and its `Nomination` impl
//! - **`cluster`** — `NodeAccessor` seam, implemented for `StateStore`
//! - **`stats`** — Counters with Prometheus text rendering
//!
//! # Flow
//!
//! ```text
//! score(instance, node)  ×N candidates   read plan → quota × 100
//!            │
//!   framework picks a node
//!            ▼
//! admit(instance, node)                  read plan @v → decrement → patch if still @v
//!                                        (conflict → re-read and retry)
//! ```

pub mod admitter;
pub mod cluster;
pub mod config;
pub mod error;
pub mod plan;
pub mod plugin;
pub mod scorer;
pub mod stats;
pub mod workload;

pub use admitter::{AdmitOutcome, Admitter};
pub use cluster::NodeAccessor;
pub use config::{DEFAULT_PLAN_ANNOTATION, NominationConfig};
pub use error::{NominationError, NominationResult};
pub use plan::{Consumption, KeyAdmission, PlanDecodeError, PlanSnapshot};
pub use plugin::{NAME, NodeScore, Nomination, PlacementExtension};
pub use scorer::Scorer;
pub use stats::{NominationStats, StatsSnapshot};
pub use workload::{OwnerReference, WorkloadInstance, WorkloadKey};
