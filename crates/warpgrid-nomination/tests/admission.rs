//! End-to-end score → admit cycles against a redb-backed node store.

use std::sync::Arc;

use warpgrid_nomination::*;
use warpgrid_state::{NodeInfo, StateError, StateResult, StateStore};

const SCENARIO_PLAN: &str = r#"{"ReplicaSet/ns1/app1": 2, "ReplicaSet/ns1/app2": 1}"#;

fn setup(plan: Option<&str>) -> (Arc<StateStore>, Nomination<StateStore>) {
    let store = Arc::new(StateStore::open_in_memory().unwrap());
    let mut node = NodeInfo::new("node-1")
        .with_label("zone", "eu-1")
        .with_annotation("ops.warpgrid.dev/owner", "team-a");
    if let Some(raw) = plan {
        node = node.with_annotation(DEFAULT_PLAN_ANNOTATION, raw);
    }
    store.put_node(&node).unwrap();
    let plugin = Nomination::new(store.clone(), NominationConfig::default()).unwrap();
    (store, plugin)
}

fn persisted(store: &StateStore) -> PlanSnapshot {
    let node = store.get_node("node-1").unwrap().unwrap();
    PlanSnapshot::decode(node.annotation(DEFAULT_PLAN_ANNOTATION).unwrap_or("")).unwrap()
}

fn plan(entries: &[(&str, u64)]) -> PlanSnapshot {
    entries.iter().map(|(k, v)| (WorkloadKey::from(*k), *v)).collect()
}

fn owned(owners: &[&str]) -> WorkloadInstance {
    owners
        .iter()
        .fold(WorkloadInstance::new("ns1", "pod-0"), |instance, owner| {
            instance.owned_by("ReplicaSet", *owner)
        })
}

#[test]
fn matching_owner_scores_and_consumes_one_unit() {
    let (store, plugin) = setup(Some(SCENARIO_PLAN));
    let instance = owned(&["app1"]);

    assert_eq!(plugin.score(&instance, "node-1").unwrap(), 200);
    let outcome = plugin.admit(&instance, "node-1").unwrap();

    assert_eq!(
        outcome,
        AdmitOutcome::Admitted {
            consumed: vec![WorkloadKey::from("ReplicaSet/ns1/app1")],
            exhausted: vec![],
            resource_version: 2,
        }
    );
    assert_eq!(persisted(&store), plan(&[("ReplicaSet/ns1/app1", 1), ("ReplicaSet/ns1/app2", 1)]));
}

#[test]
fn unrelated_owner_scores_zero_and_leaves_plan() {
    let (store, plugin) = setup(Some(SCENARIO_PLAN));
    let instance = WorkloadInstance::new("ns1", "pod-0").owned_by("ReplicaSet", "billing");

    assert_eq!(plugin.score(&instance, "node-1").unwrap(), 0);
    assert_eq!(plugin.admit(&instance, "node-1").unwrap(), AdmitOutcome::NoMatch);

    let node = store.get_node("node-1").unwrap().unwrap();
    assert_eq!(node.resource_version, 1);
    assert_eq!(node.annotation(DEFAULT_PLAN_ANNOTATION), Some(SCENARIO_PLAN));
}

#[test]
fn multiple_matching_owners_decrement_in_one_write() {
    let (store, plugin) = setup(Some(SCENARIO_PLAN));
    let instance = owned(&["app1", "app2"]);

    let outcome = plugin.admit(&instance, "node-1").unwrap();

    match outcome {
        AdmitOutcome::Admitted { consumed, resource_version, .. } => {
            assert_eq!(consumed.len(), 2);
            assert_eq!(resource_version, 2);
        }
        other => panic!("expected admission, got {other:?}"),
    }
    assert_eq!(persisted(&store), plan(&[("ReplicaSet/ns1/app1", 1), ("ReplicaSet/ns1/app2", 0)]));
}

#[test]
fn quota_reaches_zero_and_stays_there() {
    let (store, plugin) = setup(Some(r#"{"ReplicaSet/ns1/app1": 1}"#));
    let instance = owned(&["app1"]);

    assert_eq!(plugin.score(&instance, "node-1").unwrap(), 100);
    plugin.admit(&instance, "node-1").unwrap();
    assert_eq!(plugin.score(&instance, "node-1").unwrap(), 0);

    // Exhausted entries still admit, without going negative.
    let outcome = plugin.admit(&instance, "node-1").unwrap();
    assert!(matches!(outcome, AdmitOutcome::Admitted { ref consumed, .. } if consumed.is_empty()));
    assert_eq!(persisted(&store), plan(&[("ReplicaSet/ns1/app1", 0)]));
}

#[test]
fn standalone_instance_never_matches() {
    let (store, plugin) = setup(Some(SCENARIO_PLAN));
    let standalone = WorkloadInstance::new("ns1", "debug-shell");

    assert_eq!(plugin.score(&standalone, "node-1").unwrap(), 0);
    assert!(!plugin.admit(&standalone, "node-1").unwrap().mutated());
    assert_eq!(store.get_node("node-1").unwrap().unwrap().resource_version, 1);
}

#[test]
fn absent_empty_or_malformed_plan_is_ignored() {
    for raw in [None, Some(""), Some("{\"ReplicaSet/ns1/app1\": \"lots\"}")] {
        let (store, plugin) = setup(raw);
        let instance = owned(&["app1"]);

        assert_eq!(plugin.score(&instance, "node-1").unwrap(), 0, "plan {raw:?}");
        let outcome = plugin.admit(&instance, "node-1").unwrap();
        assert_eq!(outcome, AdmitOutcome::NoPlan, "plan {raw:?}");
        assert_eq!(store.get_node("node-1").unwrap().unwrap().resource_version, 1);
    }
}

#[test]
fn malformed_plan_is_counted() {
    let (_store, plugin) = setup(Some("[1,2,3]"));
    let instance = owned(&["app1"]);

    plugin.score(&instance, "node-1").unwrap();
    plugin.admit(&instance, "node-1").unwrap();

    assert_eq!(plugin.stats().snapshot().plan_decode_failures, 2);
    assert!(plugin
        .stats()
        .render_prometheus()
        .contains("warpgrid_nomination_plan_decode_failures_total 2"));
}

#[test]
fn admission_preserves_other_node_fields() {
    let (store, plugin) = setup(Some(SCENARIO_PLAN));
    plugin.admit(&owned(&["app1"]), "node-1").unwrap();

    let node = store.get_node("node-1").unwrap().unwrap();
    assert_eq!(node.annotation("ops.warpgrid.dev/owner"), Some("team-a"));
    assert_eq!(node.labels.get("zone").map(String::as_str), Some("eu-1"));
}

#[test]
fn unknown_node_is_an_error_for_both_phases() {
    let (_store, plugin) = setup(Some(SCENARIO_PLAN));
    let instance = owned(&["app1"]);

    let score_err = plugin.score(&instance, "node-404").unwrap_err();
    let admit_err = plugin.admit(&instance, "node-404").unwrap_err();

    assert_eq!(score_err.node(), Some("node-404"));
    assert!(matches!(admit_err, NominationError::NodeNotFound(_)));
}

/// Node store whose reads always fail.
struct UnreachableStore;

impl NodeAccessor for UnreachableStore {
    fn get_node(&self, _node_id: &str) -> StateResult<Option<NodeInfo>> {
        Err(StateError::Read("io".to_string()))
    }

    fn patch_annotation(
        &self,
        node_id: &str,
        _key: &str,
        _value: &str,
        _precondition: Option<u64>,
    ) -> StateResult<NodeInfo> {
        Err(StateError::NotFound(format!("node {node_id}")))
    }
}

#[test]
fn node_read_failure_is_fatal_for_both_phases() {
    let plugin = Nomination::new(Arc::new(UnreachableStore), NominationConfig::default()).unwrap();
    let instance = owned(&["app1"]);

    let score_err = plugin.score(&instance, "n1").unwrap_err();
    let admit_err = plugin.admit(&instance, "n1").unwrap_err();

    for err in [&score_err, &admit_err] {
        assert!(
            matches!(err, NominationError::Access { source: StateError::Read(_), .. }),
            "unexpected error: {err}"
        );
        assert_eq!(err.node(), Some("n1"));
        assert!(err.to_string().contains("read error: io"));
    }
    let stats = plugin.stats().snapshot();
    assert_eq!(stats.admission_failures, 1);
    assert_eq!(stats.admissions, 0);
}

#[test]
fn custom_annotation_key_is_honored() {
    let store = Arc::new(StateStore::open_in_memory().unwrap());
    store
        .put_node(
            &NodeInfo::new("node-1")
                .with_annotation("example.com/plan", r#"{"ReplicaSet/ns1/app1": 4}"#)
                .with_annotation(DEFAULT_PLAN_ANNOTATION, r#"{"ReplicaSet/ns1/app1": 9}"#),
        )
        .unwrap();
    let config = NominationConfig {
        plan_annotation: "example.com/plan".to_string(),
        ..NominationConfig::default()
    };
    let plugin = Nomination::new(store.clone(), config).unwrap();

    assert_eq!(plugin.score(&owned(&["app1"]), "node-1").unwrap(), 400);
    plugin.admit(&owned(&["app1"]), "node-1").unwrap();

    let node = store.get_node("node-1").unwrap().unwrap();
    assert_eq!(node.annotation("example.com/plan"), Some(r#"{"ReplicaSet/ns1/app1":3}"#));
    assert_eq!(node.annotation(DEFAULT_PLAN_ANNOTATION), Some(r#"{"ReplicaSet/ns1/app1": 9}"#));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_admissions_lose_no_decrements() {
    const ADMISSIONS: u64 = 16;
    const QUOTA: u64 = 40;

    let store = Arc::new(StateStore::open_in_memory().unwrap());
    store
        .put_node(&NodeInfo::new("node-1").with_annotation(
            DEFAULT_PLAN_ANNOTATION,
            format!(r#"{{"ReplicaSet/ns1/app1": {QUOTA}}}"#),
        ))
        .unwrap();
    let config = NominationConfig {
        // Every admission may lose the race to all the others.
        max_patch_attempts: ADMISSIONS as u32 + 1,
        ..NominationConfig::default()
    };
    let plugin = Arc::new(Nomination::new(store.clone(), config).unwrap());

    let mut handles = Vec::new();
    for i in 0..ADMISSIONS {
        let plugin = plugin.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let instance =
                WorkloadInstance::new("ns1", format!("app1-{i}")).owned_by("ReplicaSet", "app1");
            plugin.admit(&instance, "node-1")
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().mutated());
    }

    assert_eq!(persisted(&store), plan(&[("ReplicaSet/ns1/app1", QUOTA - ADMISSIONS)]));
    let stats = plugin.stats().snapshot();
    assert_eq!(stats.admissions, ADMISSIONS);
    assert_eq!(stats.quota_consumed, ADMISSIONS);
    assert_eq!(stats.admission_failures, 0);
}

#[test]
fn on_disk_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nodes.redb");
    {
        let store = StateStore::open(&path).unwrap();
        let node = NodeInfo::new("node-1").with_annotation(DEFAULT_PLAN_ANNOTATION, SCENARIO_PLAN);
        store.put_node(&node).unwrap();
        let plugin = Nomination::new(Arc::new(store), NominationConfig::default()).unwrap();
        plugin.admit(&owned(&["app2"]), "node-1").unwrap();
    }

    let store = StateStore::open(&path).unwrap();
    assert_eq!(persisted(&store), plan(&[("ReplicaSet/ns1/app1", 2), ("ReplicaSet/ns1/app2", 0)]));
}
