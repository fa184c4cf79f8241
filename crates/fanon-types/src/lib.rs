//! Shared vocabulary types for the anonymization core: attribute
//! declarations, typed cell values, lattice node ids and the interrupt token.

pub mod interrupt;
pub mod value;

pub use interrupt::Interrupt;
pub use value::{DataType, TypedValue};

use fanon_error::{AnonError, Result};
use serde::{Deserialize, Serialize};

/// Token stored for missing or absent cells.
pub const NULL_VALUE: &str = "NULL";

/// Token that matches any value; suppressed cells decode to it.
pub const ANY_VALUE: &str = "*";

/// Dense identifier of a generalization lattice node (`0..size`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The id as an arena index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of an attribute with respect to re-identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// Removed entirely from any output.
    Identifying,
    /// Generalized and suppressed to reach the privacy model.
    QuasiIdentifying,
    /// Kept as-is, protected by models such as l-diversity.
    Sensitive,
    /// Kept as-is.
    #[default]
    Insensitive,
}

/// Declaration of one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default)]
    pub attribute_type: AttributeType,
}

impl Attribute {
    pub fn new(name: impl Into<String>, data_type: DataType, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            data_type,
            attribute_type,
        }
    }
}

/// Ordered attribute declarations for a dataset, one per column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DataDefinition {
    attributes: Vec<Attribute>,
}

impl DataDefinition {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { attributes }
    }

    /// Definition declaring every column of `header` as an insensitive string.
    pub fn strings<S: AsRef<str>>(header: &[S]) -> Self {
        Self::new(
            header
                .iter()
                .map(|name| Attribute::new(name.as_ref(), DataType::String, AttributeType::Insensitive))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, column: usize) -> Result<&Attribute> {
        self.attributes
            .get(column)
            .ok_or_else(|| AnonError::column_out_of_bounds(column, self.attributes.len()))
    }

    pub fn data_type(&self, column: usize) -> Result<&DataType> {
        self.attribute(column).map(|a| &a.data_type)
    }

    /// Column index of the attribute called `name`.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.attributes
            .iter()
            .position(|a| a.name == name)
            .ok_or_else(|| AnonError::NoSuchAttribute {
                name: name.to_owned(),
            })
    }

    /// Column indices of all quasi-identifying attributes, in column order.
    pub fn quasi_identifiers(&self) -> Vec<usize> {
        self.attributes
            .iter()
            .enumerate()
            .filter(|(_, a)| a.attribute_type == AttributeType::QuasiIdentifying)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn header(&self) -> Vec<String> {
        self.attributes.iter().map(|a| a.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> DataDefinition {
        DataDefinition::new(vec![
            Attribute::new("age", DataType::Integer, AttributeType::QuasiIdentifying),
            Attribute::new("zip", DataType::String, AttributeType::QuasiIdentifying),
            Attribute::new("disease", DataType::String, AttributeType::Sensitive),
        ])
    }

    #[test]
    fn index_of_and_quasi_identifiers() {
        let def = definition();
        assert_eq!(def.index_of("zip").expect("zip exists"), 1);
        assert!(matches!(
            def.index_of("name"),
            Err(AnonError::NoSuchAttribute { .. })
        ));
        assert_eq!(def.quasi_identifiers(), vec![0, 1]);
        assert_eq!(def.header(), vec!["age", "zip", "disease"]);
    }

    #[test]
    fn attribute_out_of_bounds() {
        let def = definition();
        assert!(matches!(
            def.data_type(3),
            Err(AnonError::ColumnOutOfBounds { column: 3, columns: 3 })
        ));
    }

    #[test]
    fn strings_definition_defaults() {
        let def = DataDefinition::strings(&["a", "b"]);
        assert_eq!(def.len(), 2);
        assert!(def.quasi_identifiers().is_empty());
        assert_eq!(def.data_type(1).expect("b exists"), &DataType::String);
    }

    #[test]
    fn definition_deserializes_with_defaults() {
        let def: DataDefinition = serde_json::from_str(
            r#"{"attributes":[{"name":"age","data_type":{"kind":"integer"},"attribute_type":"quasi_identifying"},{"name":"note"}]}"#,
        )
        .expect("definition parses");
        assert_eq!(def.quasi_identifiers(), vec![0]);
        assert_eq!(def.attribute(1).expect("note").data_type, DataType::String);
    }
}
