//! Generalization lattice and information-loss bound estimation.
//!
//! The lattice is a finite product of per-attribute generalization chains.
//! An external search driver reports privacy verdicts and measured loss on
//! the nodes it evaluates; [`LossEstimator`] then propagates those values to
//! bound every other node.

pub mod estimator;
pub mod lattice;
pub mod loss;
pub mod node;

pub use estimator::{
    EstimatorMetricsSnapshot, LossEstimator, Monotonicity, estimator_metrics_snapshot,
    reset_estimator_metrics,
};
pub use lattice::{Lattice, MAX_LATTICE_SIZE};
pub use loss::{InformationLoss, LossRange, max_loss, min_loss};
pub use node::{Anonymity, LatticeNode, Transformation};
