//! Information-loss bound propagation.
//!
//! The estimator never evaluates privacy or loss itself. It folds the values
//! nodes already carry into tighter minimum/maximum bounds for their
//! neighbours, relying on two caller-declared monotonicity properties:
//!
//! - **anonymous**: among ANONYMOUS nodes, loss never decreases as
//!   generalization increases;
//! - **non-anonymous**: the same, restricted to NOT_ANONYMOUS nodes.
//!
//! They are independent because suppression and generalization can interact
//! non-monotonically with a metric. Declaring a property the evaluator does
//! not have yields wrong bounds, never an error: the estimator cannot verify
//! it.
//!
//! Ids are assigned in level order at allocation, so ascending id order is a
//! valid bottom-up traversal and descending id order a valid top-down one.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::lattice::Lattice;
use crate::loss::{InformationLoss, LossRange, max_loss, min_loss};
use crate::node::Anonymity;

// ── Metrics ──────────────────────────────────────────────────────────────

static ESTIMATE_PASSES_TOTAL: AtomicU64 = AtomicU64::new(0);
static NODES_TIGHTENED_TOTAL: AtomicU64 = AtomicU64::new(0);
static NODES_SKIPPED_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Snapshot of estimator counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EstimatorMetricsSnapshot {
    /// Completed `estimate_min` and `estimate_max` passes.
    pub estimate_passes_total: u64,
    /// Bounds that moved during a pass.
    pub nodes_tightened_total: u64,
    /// Nodes skipped because their bounds were already equal.
    pub nodes_skipped_total: u64,
}

/// Read estimator counters.
pub fn estimator_metrics_snapshot() -> EstimatorMetricsSnapshot {
    EstimatorMetricsSnapshot {
        estimate_passes_total: ESTIMATE_PASSES_TOTAL.load(Ordering::Relaxed),
        nodes_tightened_total: NODES_TIGHTENED_TOTAL.load(Ordering::Relaxed),
        nodes_skipped_total: NODES_SKIPPED_TOTAL.load(Ordering::Relaxed),
    }
}

/// Reset estimator counters.
pub fn reset_estimator_metrics() {
    ESTIMATE_PASSES_TOTAL.store(0, Ordering::Relaxed);
    NODES_TIGHTENED_TOTAL.store(0, Ordering::Relaxed);
    NODES_SKIPPED_TOTAL.store(0, Ordering::Relaxed);
}

// ── Configuration ────────────────────────────────────────────────────────

/// Monotonicity properties of the metric, per anonymity branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monotonicity {
    pub anonymous: bool,
    pub non_anonymous: bool,
}

impl Default for Monotonicity {
    fn default() -> Self {
        Self {
            anonymous: true,
            non_anonymous: false,
        }
    }
}

// ── Estimator ────────────────────────────────────────────────────────────

/// Two-pass bound tightening over a (possibly partially evaluated) lattice.
#[derive(Debug, Clone)]
pub struct LossEstimator {
    monotonicity: Monotonicity,
    range: LossRange,
    global_minimum: Option<InformationLoss>,
    global_maximum: Option<InformationLoss>,
}

impl LossEstimator {
    pub const fn new(monotonicity: Monotonicity, range: LossRange) -> Self {
        Self {
            monotonicity,
            range,
            global_minimum: None,
            global_maximum: None,
        }
    }

    pub const fn monotonicity(&self) -> Monotonicity {
        self.monotonicity
    }

    /// Smallest node minimum seen by the last `estimate_min`.
    pub const fn global_minimum(&self) -> Option<InformationLoss> {
        self.global_minimum
    }

    /// Largest node maximum seen by the last `estimate_max`.
    pub const fn global_maximum(&self) -> Option<InformationLoss> {
        self.global_maximum
    }

    /// Tighten every node's minimum, then every node's maximum.
    pub fn estimate(&mut self, lattice: &mut Lattice) {
        self.estimate_min(lattice);
        self.estimate_max(lattice);
    }

    /// Bottom-up pass raising minima from predecessors.
    pub fn estimate_min(&mut self, lattice: &mut Lattice) {
        let size = lattice.size();
        let span = tracing::debug_span!(
            target: "fanon.lattice",
            "estimate_min",
            nodes = size,
            tightened = tracing::field::Empty,
            global_minimum = tracing::field::Empty,
        );
        let _g = span.enter();

        let floor = Some(self.range.minimum());
        let mono = self.monotonicity;
        let optimum_minimum = lattice
            .optimum()
            .and_then(|id| lattice.node(id).ok())
            .and_then(|n| n.minimum());

        let mut lower_bound = vec![None; size];
        let mut minimum_anonymous = vec![None; size];
        let mut minimum_non_anonymous = vec![None; size];
        let mut running = None;
        let mut tightened = 0u64;
        let mut skipped = 0u64;

        for idx in 0..size {
            let node = &lattice.nodes()[idx];
            let anonymity = node.anonymity();
            let declared = node.minimum();

            lower_bound[idx] = Some(node.lower_bound().unwrap_or(self.range.minimum()));
            match anonymity {
                Anonymity::Anonymous if mono.anonymous => {
                    minimum_anonymous[idx] = Some(declared.unwrap_or(self.range.minimum()));
                    minimum_non_anonymous[idx] = floor;
                }
                Anonymity::NotAnonymous if mono.non_anonymous => {
                    minimum_non_anonymous[idx] = Some(declared.unwrap_or(self.range.minimum()));
                    minimum_anonymous[idx] = floor;
                }
                _ => {}
            }

            for &pred in node.predecessors() {
                let p = pred.index();
                minimum_anonymous[idx] = max_loss(minimum_anonymous[idx], minimum_anonymous[p]);
                minimum_non_anonymous[idx] =
                    max_loss(minimum_non_anonymous[idx], minimum_non_anonymous[p]);
                lower_bound[idx] = max_loss(lower_bound[idx], lower_bound[p]);
            }
            if declared.is_some() {
                if anonymity == Anonymity::Anonymous && mono.anonymous {
                    minimum_anonymous[idx] = max_loss(minimum_anonymous[idx], declared);
                }
                if anonymity == Anonymity::NotAnonymous && mono.non_anonymous {
                    minimum_non_anonymous[idx] = max_loss(minimum_non_anonymous[idx], declared);
                }
            }

            if node.is_determined() {
                skipped += 1;
                running = min_loss(running, declared);
                continue;
            }

            let mut minimum = max_loss(declared, lower_bound[idx]);
            if anonymity == Anonymity::Anonymous {
                minimum = max_loss(minimum, optimum_minimum);
            }
            // Anonymous ancestors only bound nodes that can still be
            // anonymous, and vice versa.
            if mono.anonymous && anonymity != Anonymity::NotAnonymous {
                minimum = max_loss(minimum, minimum_anonymous[idx]);
            }
            if mono.non_anonymous && anonymity == Anonymity::NotAnonymous {
                minimum = max_loss(minimum, minimum_non_anonymous[idx]);
            }

            if let Some(value) = minimum {
                if declared != minimum {
                    tightened += 1;
                }
                lattice.set_minimum(idx, value);
            }
            running = min_loss(running, minimum);
        }

        self.global_minimum = running;
        ESTIMATE_PASSES_TOTAL.fetch_add(1, Ordering::Relaxed);
        NODES_TIGHTENED_TOTAL.fetch_add(tightened, Ordering::Relaxed);
        NODES_SKIPPED_TOTAL.fetch_add(skipped, Ordering::Relaxed);
        span.record("tightened", tightened);
        if let Some(value) = running {
            span.record("global_minimum", value.value());
        }
    }

    /// Top-down pass lowering maxima from successors.
    pub fn estimate_max(&mut self, lattice: &mut Lattice) {
        let size = lattice.size();
        let span = tracing::debug_span!(
            target: "fanon.lattice",
            "estimate_max",
            nodes = size,
            tightened = tracing::field::Empty,
            global_maximum = tracing::field::Empty,
        );
        let _g = span.enter();

        let ceiling = Some(self.range.maximum());
        let mono = self.monotonicity;

        let mut maximum_anonymous = vec![None; size];
        let mut maximum_non_anonymous = vec![None; size];
        let mut running = None;
        let mut tightened = 0u64;
        let mut skipped = 0u64;

        for idx in (0..size).rev() {
            let node = &lattice.nodes()[idx];
            let anonymity = node.anonymity();
            let declared = node.maximum();

            match anonymity {
                Anonymity::Anonymous if mono.anonymous => {
                    maximum_anonymous[idx] = Some(declared.unwrap_or(self.range.maximum()));
                    maximum_non_anonymous[idx] = ceiling;
                }
                Anonymity::NotAnonymous if mono.non_anonymous => {
                    maximum_non_anonymous[idx] = Some(declared.unwrap_or(self.range.maximum()));
                    maximum_anonymous[idx] = ceiling;
                }
                _ => {}
            }

            for &succ in node.successors() {
                let s = succ.index();
                maximum_anonymous[idx] = min_loss(maximum_anonymous[idx], maximum_anonymous[s]);
                maximum_non_anonymous[idx] =
                    min_loss(maximum_non_anonymous[idx], maximum_non_anonymous[s]);
            }
            if declared.is_some() {
                if anonymity == Anonymity::Anonymous && mono.anonymous {
                    maximum_anonymous[idx] = min_loss(maximum_anonymous[idx], declared);
                }
                if anonymity == Anonymity::NotAnonymous && mono.non_anonymous {
                    maximum_non_anonymous[idx] = min_loss(maximum_non_anonymous[idx], declared);
                }
            }

            if node.is_determined() {
                skipped += 1;
                running = max_loss(running, declared);
                continue;
            }

            // Non-anonymous descendants only bound nodes that cannot be
            // anonymous yet, and vice versa.
            let mut maximum = declared;
            if mono.anonymous && anonymity == Anonymity::Anonymous {
                maximum = min_loss(maximum, maximum_anonymous[idx]);
            }
            if mono.non_anonymous && anonymity != Anonymity::Anonymous {
                maximum = min_loss(maximum, maximum_non_anonymous[idx]);
            }
            let maximum = maximum.unwrap_or(self.range.maximum());

            if declared != Some(maximum) {
                tightened += 1;
            }
            lattice.set_maximum(idx, maximum);
            running = max_loss(running, Some(maximum));
        }

        self.global_maximum = running;
        ESTIMATE_PASSES_TOTAL.fetch_add(1, Ordering::Relaxed);
        NODES_TIGHTENED_TOTAL.fetch_add(tightened, Ordering::Relaxed);
        NODES_SKIPPED_TOTAL.fetch_add(skipped, Ordering::Relaxed);
        span.record("tightened", tightened);
        if let Some(value) = running {
            span.record("global_maximum", value.value());
        }
    }
}
