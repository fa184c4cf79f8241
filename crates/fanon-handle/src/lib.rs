//! Handles over the encoded dataset and the registry that keeps their row
//! order synchronized.

pub mod handle;
pub mod input;
pub mod output;
pub mod registry;

pub use handle::{DataHandle, HandleRef, HandleView, SubsetView};
pub use input::InputHandle;
pub use output::OutputHandle;
pub use registry::{
    Registry, RegistryMetricsSnapshot, registry_metrics_snapshot, reset_registry_metrics,
};
