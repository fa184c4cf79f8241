//! Explicit populations over a dataset, for privacy models that need one
//! (d-presence) and for population-based risk estimates.

pub mod selector;
pub mod subset;

pub use selector::{CompareOp, DataSelector, SelectorValue};
pub use subset::DataSubset;
