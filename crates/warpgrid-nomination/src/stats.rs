//! Nomination counters and their Prometheus text exposition.
//!
//! Lock-free atomics, shared between the scorer and admitter by `Arc`.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct NominationStats {
    score_calls: AtomicU64,
    score_matches: AtomicU64,
    admit_calls: AtomicU64,
    admissions: AtomicU64,
    quota_consumed: AtomicU64,
    plan_decode_failures: AtomicU64,
    patch_conflicts: AtomicU64,
    admission_failures: AtomicU64,
}

/// Point-in-time copy of [`NominationStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub score_calls: u64,
    pub score_matches: u64,
    pub admit_calls: u64,
    /// Admissions that matched a plan entry and persisted the plan.
    pub admissions: u64,
    pub quota_consumed: u64,
    pub plan_decode_failures: u64,
    pub patch_conflicts: u64,
    pub admission_failures: u64,
}

impl NominationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_score(&self, matched: bool) {
        self.score_calls.fetch_add(1, Ordering::Relaxed);
        if matched {
            self.score_matches.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_admit_call(&self) {
        self.admit_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_admission(&self, consumed: usize) {
        self.admissions.fetch_add(1, Ordering::Relaxed);
        self.quota_consumed
            .fetch_add(consumed as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_decode_failure(&self) {
        self.plan_decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_conflict(&self) {
        self.patch_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_admission_failure(&self) {
        self.admission_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            score_calls: self.score_calls.load(Ordering::Relaxed),
            score_matches: self.score_matches.load(Ordering::Relaxed),
            admit_calls: self.admit_calls.load(Ordering::Relaxed),
            admissions: self.admissions.load(Ordering::Relaxed),
            quota_consumed: self.quota_consumed.load(Ordering::Relaxed),
            plan_decode_failures: self.plan_decode_failures.load(Ordering::Relaxed),
            patch_conflicts: self.patch_conflicts.load(Ordering::Relaxed),
            admission_failures: self.admission_failures.load(Ordering::Relaxed),
        }
    }

    /// Render all counters in Prometheus text format.
    pub fn render_prometheus(&self) -> String {
        let s = self.snapshot();
        let counters = [
            ("score_calls_total", "Score calls.", s.score_calls),
            (
                "score_matches_total",
                "Score calls that matched a plan entry.",
                s.score_matches,
            ),
            ("admit_calls_total", "Admission calls.", s.admit_calls),
            (
                "admissions_total",
                "Admissions that matched a plan entry and persisted the plan.",
                s.admissions,
            ),
            (
                "quota_consumed_total",
                "Plan quota units consumed by admissions.",
                s.quota_consumed,
            ),
            (
                "plan_decode_failures_total",
                "Malformed plan annotations treated as empty.",
                s.plan_decode_failures,
            ),
            (
                "patch_conflicts_total",
                "Plan writes rejected because the node changed since it was read.",
                s.patch_conflicts,
            ),
            (
                "admission_failures_total",
                "Admissions rejected with an error.",
                s.admission_failures,
            ),
        ];

        let mut out = String::new();
        for (name, help, value) in counters {
            out.push_str(&format!("# HELP warpgrid_nomination_{name} {help}\n"));
            out.push_str(&format!("# TYPE warpgrid_nomination_{name} counter\n"));
            out.push_str(&format!("warpgrid_nomination_{name} {value}\n"));
        }
        out
    }
}
