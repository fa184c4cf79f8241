use thiserror::Error;

/// Primary error type for the anonymization core.
///
/// Variants are grouped by how the caller is expected to react: construction
/// errors are reported by the call that built something from bad input,
/// bounds/state errors by an access outside the current extent of a live
/// object. Nothing here is retried internally.
#[derive(Error, Debug)]
pub enum AnonError {
    // === Construction Errors ===
    /// The row source yielded no rows.
    #[error("input source yielded no rows")]
    EmptyInput,

    /// A row carried more cells than the header declares.
    #[error("row {row} has {actual} cells, header declares {expected}")]
    RowWidthMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// The dictionary was already finalized (double finalize, or register after finalize).
    #[error("dictionary is already finalized")]
    DictionaryFinalized,

    /// A column dictionary ran out of codes below the outlier bit.
    #[error("dictionary for column {column} exceeds {max} distinct values")]
    DictionaryOverflow { column: usize, max: usize },

    /// The dictionary must be finalized before it can back a handle.
    #[error("dictionary is not finalized")]
    DictionaryNotFinalized,

    /// Selector expression could not be compiled.
    #[error("selector parse error at token {position}: {detail}")]
    ParseError { position: usize, detail: String },

    /// An explicit subset index lies outside the universe.
    #[error("subset index {index} out of range (rows: {rows})")]
    SubsetIndexOutOfRange { index: usize, rows: usize },

    /// A subset tuple does not occur in the background dataset.
    #[error("no match found for subset row {row}")]
    NoMatchFound { row: usize },

    /// Unknown attribute name.
    #[error("no such attribute: {name}")]
    NoSuchAttribute { name: String },

    /// A cell value could not be parsed with the declared data type.
    #[error("value '{value}' is not a valid {expected}")]
    TypeMismatch { value: String, expected: String },

    /// A value has no row in its column's generalization hierarchy.
    #[error("hierarchy for column {column} has no mapping for value '{value}'")]
    HierarchyMissingValue { column: usize, value: String },

    /// Requested generalization level exceeds the hierarchy height.
    #[error("generalization level {level} exceeds height {height} for column {column}")]
    LevelOutOfRange {
        column: usize,
        level: u32,
        height: u32,
    },

    /// A derived matrix does not line up with the rows it claims to describe.
    #[error("row count mismatch: expected {expected}, got {actual}")]
    RowCountMismatch { expected: usize, actual: usize },

    /// The lattice shape is unusable.
    #[error("invalid lattice: {detail}")]
    InvalidLattice { detail: String },

    // === Bounds / State Errors ===
    /// Row index outside the handle's current extent.
    #[error("row {row} out of bounds (rows: {rows})")]
    RowOutOfBounds { row: usize, rows: usize },

    /// Column index outside the handle's current extent.
    #[error("column {column} out of bounds (columns: {columns})")]
    ColumnOutOfBounds { column: usize, columns: usize },

    /// The handle was released.
    #[error("handle released")]
    HandleReleased,

    /// The handle reference names nothing that is registered.
    #[error("no such handle registered")]
    NoSuchHandle,

    /// Unknown lattice node id.
    #[error("no such lattice node: {id}")]
    NoSuchNode { id: u32 },

    /// A different anonymity verdict was already recorded for the node.
    #[error("anonymity of node {id} is already set")]
    AnonymityAlreadySet { id: u32 },

    /// An interrupt was requested while a long-running operation polled.
    #[error("operation interrupted")]
    Interrupted,

    // === Environment Errors ===
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {detail}")]
    Config { detail: String },

    /// Internal logic error (should never happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification of an [`AnonError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Bad input to a constructor; nothing was built.
    Construction,
    /// Access outside the current extent, or to a released object.
    BoundsOrState,
    /// I/O, configuration and internal failures.
    Environment,
}

impl AnonError {
    /// Classify this error.
    #[allow(clippy::match_same_arms)]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::EmptyInput
            | Self::RowWidthMismatch { .. }
            | Self::DictionaryFinalized
            | Self::DictionaryOverflow { .. }
            | Self::DictionaryNotFinalized
            | Self::ParseError { .. }
            | Self::SubsetIndexOutOfRange { .. }
            | Self::NoMatchFound { .. }
            | Self::NoSuchAttribute { .. }
            | Self::TypeMismatch { .. }
            | Self::HierarchyMissingValue { .. }
            | Self::LevelOutOfRange { .. }
            | Self::RowCountMismatch { .. }
            | Self::InvalidLattice { .. } => ErrorClass::Construction,
            Self::RowOutOfBounds { .. }
            | Self::ColumnOutOfBounds { .. }
            | Self::HandleReleased
            | Self::NoSuchHandle
            | Self::NoSuchNode { .. }
            | Self::AnonymityAlreadySet { .. }
            | Self::Interrupted => ErrorClass::BoundsOrState,
            Self::Io(_) | Self::Config { .. } | Self::Internal(_) => ErrorClass::Environment,
        }
    }

    /// Whether the caller can likely fix this without code changes.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput
                | Self::RowWidthMismatch { .. }
                | Self::ParseError { .. }
                | Self::SubsetIndexOutOfRange { .. }
                | Self::NoMatchFound { .. }
                | Self::NoSuchAttribute { .. }
                | Self::TypeMismatch { .. }
                | Self::HierarchyMissingValue { .. }
                | Self::RowOutOfBounds { .. }
                | Self::ColumnOutOfBounds { .. }
                | Self::Interrupted
                | Self::Config { .. }
        )
    }

    /// Human-friendly suggestion for fixing this error.
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::EmptyInput => Some("Provide a data source with at least one row"),
            Self::ParseError { .. } => {
                Some("Check that every operator joins two expressions and groups are balanced")
            }
            Self::NoMatchFound { .. } => {
                Some("Every subset row must occur verbatim in the background dataset")
            }
            Self::HierarchyMissingValue { .. } => {
                Some("Add a hierarchy row for every value occurring in the column")
            }
            Self::HandleReleased => Some("Re-create the handle; released handles cannot be reused"),
            Self::Interrupted => Some("Clear the interrupt and run the operation again"),
            _ => None,
        }
    }

    /// Create a selector parse error.
    pub fn parse(position: usize, detail: impl Into<String>) -> Self {
        Self::ParseError {
            position,
            detail: detail.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(value: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::TypeMismatch {
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Create a row bounds error.
    pub const fn row_out_of_bounds(row: usize, rows: usize) -> Self {
        Self::RowOutOfBounds { row, rows }
    }

    /// Create a column bounds error.
    pub const fn column_out_of_bounds(column: usize, columns: usize) -> Self {
        Self::ColumnOutOfBounds { column, columns }
    }
}

/// Result type alias using `AnonError`.
pub type Result<T> = std::result::Result<T, AnonError>;
