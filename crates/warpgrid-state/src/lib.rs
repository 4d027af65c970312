//! warpgrid-state — embedded node store for WarpGrid.
//!
//! Backed by [redb](https://docs.rs/redb), provides persistent and in-memory
//! storage for node records: labels, annotations, and a monotonically
//! increasing `resource_version` that serves as an optimistic-concurrency
//! token for annotation patches.
//!
//! # Architecture
//!
//! Node records are JSON-serialized into redb's `&[u8]` value columns,
//! keyed by node id. Every write (put or patch) happens inside a single
//! redb write transaction, and redb serializes write transactions, so a
//! version check followed by a write is atomic.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across threads.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::{AnnotationPatch, StateStore};
pub use types::*;
