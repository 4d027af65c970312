use std::path::Path;
use std::sync::Arc;

use warpgrid_nomination::{Nomination, NominationConfig};
use warpgrid_state::StateStore;

pub mod node;
pub mod plan;
pub mod schedule;

/// Everything a subcommand needs: the node store and a plugin over it.
pub struct Context {
    pub store: Arc<StateStore>,
    pub plugin: Nomination<StateStore>,
}

impl Context {
    pub fn open(db: &Path, config: Option<&Path>) -> anyhow::Result<Self> {
        let config = match config {
            Some(path) => NominationConfig::from_file(path)?,
            None => NominationConfig::default(),
        };
        let store = Arc::new(StateStore::open(db)?);
        let plugin = Nomination::new(store.clone(), config)?;
        Ok(Self { store, plugin })
    }

    pub fn plan_annotation(&self) -> &str {
        &self.plugin.config().plan_annotation
    }
}
