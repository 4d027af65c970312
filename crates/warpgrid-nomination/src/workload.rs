//! Workload instances and the keys that tie them to plan entries.
//!
//! A workload key names the controller that owns an instance:
//! `{ownerKind}/{namespace}/{ownerName}`, e.g. `ReplicaSet/ns1/app1`.
//! Keys are recomputed from owner references on every call, so neither
//! the scorer nor the admitter needs an external lookup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifies an owning controller instance within the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkloadKey(String);

impl WorkloadKey {
    pub fn new(kind: &str, namespace: &str, name: &str) -> Self {
        Self(format!("{kind}/{namespace}/{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkloadKey {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Reference to a controller that owns an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerReference {
    pub kind: String,
    pub name: String,
}

impl OwnerReference {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

/// Parses `Kind/name`.
impl FromStr for OwnerReference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((kind, name)) if !kind.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self::new(kind, name))
            }
            _ => Err(format!("expected owner as Kind/name, got {s:?}")),
        }
    }
}

/// The unit being scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkloadInstance {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub owner_references: Vec<OwnerReference>,
}

impl WorkloadInstance {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn owned_by(mut self, kind: impl Into<String>, name: impl Into<String>) -> Self {
        self.owner_references.push(OwnerReference::new(kind, name));
        self
    }

    /// Keys this instance can match, one per owner reference.
    ///
    /// Order follows the owner references; repeated owners yield one key.
    /// An instance without owners yields nothing and never matches a plan.
    pub fn workload_keys(&self) -> Vec<WorkloadKey> {
        let mut keys: Vec<WorkloadKey> = Vec::with_capacity(self.owner_references.len());
        for owner in &self.owner_references {
            let key = WorkloadKey::new(&owner.kind, &self.namespace, &owner.name);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}
