//! Dictionary-encoded storage: column dictionaries, the encoded row matrix,
//! row-membership bit sets, and generalization hierarchies.

pub mod dictionary;
pub mod hierarchy;
pub mod matrix;
pub mod population;

pub use dictionary::{Dictionary, MAX_CODES};
pub use hierarchy::{EncodedHierarchy, Generalizer, Hierarchy};
pub use matrix::{DataMatrix, OUTLIER_MASK, REMOVE_OUTLIER_MASK};
pub use population::PopulationSet;
