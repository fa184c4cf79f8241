//! Public API facade for frankenanon.
//!
//! A [`Session`] encodes one dataset, keeps every view of it synchronized,
//! and owns the generalization lattice a search driver explores. The
//! component crates are re-exported for callers that need lower-level
//! access.

pub mod config;
pub mod session;
pub mod source;

pub use config::{DEFAULT_INTERRUPT_POLL_INTERVAL, SessionConfig};
pub use session::Session;
pub use source::DataSource;

pub use fanon_data::{Hierarchy, PopulationSet};
pub use fanon_error::{AnonError, ErrorClass, Result};
pub use fanon_handle::{DataHandle, HandleRef, HandleView};
pub use fanon_lattice::{Anonymity, InformationLoss, Lattice, LatticeNode, LossRange};
pub use fanon_subset::{DataSelector, DataSubset, SelectorValue};
pub use fanon_types::{
    ANY_VALUE, Attribute, AttributeType, DataDefinition, DataType, Interrupt, NULL_VALUE, NodeId,
};

pub use fanon_data;
pub use fanon_handle;
pub use fanon_lattice;
pub use fanon_subset;
pub use fanon_types;
