//! Output handles: one generalized view per explored lattice node.

use std::sync::Arc;

use fanon_data::{DataMatrix, Dictionary};
use fanon_error::{AnonError, Result};
use fanon_types::{DataDefinition, DataType, NodeId};

use crate::handle::{DataHandle, check_cell};
use crate::input::InputHandle;

/// The generalized matrix computed for one lattice node.
///
/// Decodes through the Input handle's dictionary. Generalized columns are
/// typed as strings; columns left at level 0 keep their declared type.
#[derive(Debug)]
pub struct OutputHandle {
    node: NodeId,
    definition: DataDefinition,
    levels: Vec<u32>,
    dictionary: Arc<Dictionary>,
    matrix: DataMatrix,
    null_token: String,
}

impl OutputHandle {
    /// Wrap `matrix`, derived from `input` in its current row order.
    ///
    /// `levels` holds one generalization level per column.
    pub fn new(
        node: NodeId,
        input: &InputHandle,
        matrix: DataMatrix,
        levels: Vec<u32>,
    ) -> Result<Self> {
        if matrix.num_rows() != input.num_rows() {
            return Err(AnonError::RowCountMismatch {
                expected: input.num_rows(),
                actual: matrix.num_rows(),
            });
        }
        for actual in [matrix.num_columns(), levels.len()] {
            if actual != input.num_columns() {
                return Err(AnonError::RowWidthMismatch {
                    row: 0,
                    expected: input.num_columns(),
                    actual,
                });
            }
        }

        let mut attributes = input.definition().attributes().to_vec();
        for (attribute, &level) in attributes.iter_mut().zip(&levels) {
            if level > 0 {
                attribute.data_type = DataType::String;
            }
        }
        Ok(Self {
            node,
            definition: DataDefinition::new(attributes),
            levels,
            dictionary: Arc::clone(input.dictionary()),
            matrix,
            null_token: input.null_token().to_owned(),
        })
    }

    pub const fn node(&self) -> NodeId {
        self.node
    }

    pub fn levels(&self) -> &[u32] {
        &self.levels
    }

    pub fn matrix(&self) -> &DataMatrix {
        &self.matrix
    }

    /// Number of suppressed rows.
    pub fn outlier_count(&self) -> usize {
        self.matrix.outlier_count()
    }

    pub(crate) fn swap_rows(&mut self, row1: usize, row2: usize) {
        self.matrix.swap(row1, row2);
    }
}

impl DataHandle for OutputHandle {
    fn num_rows(&self) -> usize {
        self.matrix.num_rows()
    }

    fn num_columns(&self) -> usize {
        self.matrix.num_columns()
    }

    fn value(&self, row: usize, column: usize) -> Result<&str> {
        check_cell(self.num_rows(), self.num_columns(), row, column)?;
        self.dictionary.value(column, self.matrix.get(row, column))
    }

    fn is_outlier(&self, row: usize) -> Result<bool> {
        check_cell(self.num_rows(), self.num_columns(), row, 0)?;
        Ok(self.matrix.is_outlier(row))
    }

    fn definition(&self) -> &DataDefinition {
        &self.definition
    }

    fn generalization(&self, column: usize) -> Result<u32> {
        self.levels
            .get(column)
            .copied()
            .ok_or_else(|| AnonError::column_out_of_bounds(column, self.levels.len()))
    }

    fn null_token(&self) -> &str {
        &self.null_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanon_data::{Generalizer, Hierarchy};
    use fanon_types::{ANY_VALUE, Attribute, AttributeType, NULL_VALUE};

    fn input_and_output(suppressed: &[usize]) -> (InputHandle, OutputHandle) {
        let definition = DataDefinition::new(vec![
            Attribute::new("age", DataType::Integer, AttributeType::QuasiIdentifying),
            Attribute::new("zip", DataType::Integer, AttributeType::Insensitive),
        ]);
        let hierarchy = Hierarchy::from_rows(&[&["17", "<20"], &["18", "<20"], &["34", ">=20"]])
            .expect("hierarchy");
        let mut dictionary = Dictionary::new(2);
        let encoded = [hierarchy.encode(&mut dictionary, 0).expect("encode")];
        let rows = [["17", "100"], ["34", "200"], ["18", "300"]]
            .iter()
            .map(|r| r.iter().map(|v| Some((*v).to_owned())).collect())
            .collect::<Vec<Vec<Option<String>>>>();
        let input =
            InputHandle::encode(definition, dictionary, rows, NULL_VALUE).expect("input encodes");
        let matrix = Generalizer::new(input.dictionary(), &encoded)
            .expect("generalizer")
            .apply(input.matrix(), &[1], suppressed)
            .expect("generalize");
        let output =
            OutputHandle::new(NodeId::new(1), &input, matrix, vec![1, 0]).expect("output");
        (input, output)
    }

    #[test]
    fn decodes_generalized_values() {
        let (_input, output) = input_and_output(&[]);
        assert_eq!(output.value(0, 0).expect("cell"), "<20");
        assert_eq!(output.value(1, 0).expect("cell"), ">=20");
        assert_eq!(output.value(2, 1).expect("cell"), "300");
        assert_eq!(output.generalization(0).expect("level"), 1);
        assert_eq!(output.data_type(0).expect("type"), &DataType::String);
        assert_eq!(output.data_type(1).expect("type"), &DataType::Integer);
    }

    #[test]
    fn suppressed_rows_mask_the_outlier_bit() {
        let (_input, output) = input_and_output(&[1]);
        assert!(output.is_outlier(1).expect("row"));
        assert!(!output.is_outlier(0).expect("row"));
        assert_eq!(output.value(1, 0).expect("cell"), ANY_VALUE);
        assert_eq!(output.value(1, 1).expect("cell"), "200");
        assert_eq!(output.outlier_count(), 1);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let (input, _) = input_and_output(&[]);
        assert!(matches!(
            OutputHandle::new(NodeId::new(2), &input, DataMatrix::new(2, 2), vec![0, 0]),
            Err(AnonError::RowCountMismatch { expected: 3, actual: 2 })
        ));
        assert!(matches!(
            OutputHandle::new(NodeId::new(2), &input, DataMatrix::new(3, 2), vec![0]),
            Err(AnonError::RowWidthMismatch { .. })
        ));
    }
}
