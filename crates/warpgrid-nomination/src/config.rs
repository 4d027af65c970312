//! Nomination plugin configuration (`nomination.toml`).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NominationError, NominationResult};

/// Annotation key the planner writes plans under unless configured otherwise.
pub const DEFAULT_PLAN_ANNOTATION: &str = "migration.warpgrid.dev/plan";

/// Remaining quota is multiplied by this so it dominates 0–100 scorers.
pub const DEFAULT_SCORE_MULTIPLIER: i64 = 100;

pub const DEFAULT_MAX_PATCH_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NominationConfig {
    /// Node annotation carrying the serialized plan snapshot.
    pub plan_annotation: String,
    pub score_multiplier: i64,
    /// Admission attempts before giving up on a node whose plan keeps
    /// changing between read and write.
    pub max_patch_attempts: u32,
}

impl Default for NominationConfig {
    fn default() -> Self {
        Self {
            plan_annotation: DEFAULT_PLAN_ANNOTATION.to_string(),
            score_multiplier: DEFAULT_SCORE_MULTIPLIER,
            max_patch_attempts: DEFAULT_MAX_PATCH_ATTEMPTS,
        }
    }
}

impl NominationConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: NominationConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> NominationResult<()> {
        if self.plan_annotation.trim().is_empty() {
            return Err(NominationError::Config(
                "plan_annotation must not be empty".to_string(),
            ));
        }
        if self.score_multiplier < 1 {
            return Err(NominationError::Config(format!(
                "score_multiplier must be at least 1, got {}",
                self.score_multiplier
            )));
        }
        if self.max_patch_attempts == 0 {
            return Err(NominationError::Config(
                "max_patch_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
