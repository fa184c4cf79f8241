//! The Input handle: the dictionary-encoded source dataset.

use std::sync::Arc;

use fanon_data::{DataMatrix, Dictionary};
use fanon_error::{AnonError, Result};
use fanon_types::DataDefinition;
use tracing::debug;

use crate::handle::{DataHandle, check_cell};

/// The encoded source dataset. Never suppressed, never generalized.
#[derive(Debug)]
pub struct InputHandle {
    definition: DataDefinition,
    dictionary: Arc<Dictionary>,
    matrix: DataMatrix,
    null_token: String,
}

impl InputHandle {
    /// Encode `rows` through `dictionary` and finalize it.
    ///
    /// The dictionary may already hold values (hierarchy levels are
    /// registered before the data). Missing cells and cells beyond the end
    /// of a short row are stored as `null_token`; rows wider than the
    /// definition fail with `RowWidthMismatch`, and a non-null cell that
    /// does not parse as its column's data type fails with `TypeMismatch`.
    pub fn encode<I>(
        definition: DataDefinition,
        mut dictionary: Dictionary,
        rows: I,
        null_token: &str,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = Vec<Option<String>>>,
    {
        let columns = definition.len();
        if columns == 0 || dictionary.num_columns() != columns {
            return Err(AnonError::EmptyInput);
        }

        let mut codes = Vec::new();
        let mut num_rows = 0usize;
        for (row, cells) in rows.into_iter().enumerate() {
            if cells.len() > columns {
                return Err(AnonError::RowWidthMismatch {
                    row,
                    expected: columns,
                    actual: cells.len(),
                });
            }
            let mut cells = cells.into_iter();
            for column in 0..columns {
                let cell = cells.next().flatten();
                let value = cell.as_deref().unwrap_or(null_token);
                if value != null_token {
                    definition.data_type(column)?.parse(value)?;
                }
                codes.push(dictionary.register(column, value)?);
            }
            num_rows += 1;
        }
        if num_rows == 0 {
            return Err(AnonError::EmptyInput);
        }
        dictionary.finalize()?;

        let mut matrix = DataMatrix::new(num_rows, columns);
        for (row, chunk) in codes.chunks_exact(columns).enumerate() {
            matrix.set_row(row, chunk);
        }
        debug!(
            target: "fanon.data",
            rows = num_rows,
            columns,
            "input encoded"
        );
        Ok(Self {
            definition,
            dictionary: Arc::new(dictionary),
            matrix,
            null_token: null_token.to_owned(),
        })
    }

    /// The shared, finalized dictionary.
    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dictionary
    }

    /// The encoded rows in their current order.
    pub fn matrix(&self) -> &DataMatrix {
        &self.matrix
    }

    pub(crate) fn swap_rows(&mut self, row1: usize, row2: usize) {
        self.matrix.swap(row1, row2);
    }
}

impl DataHandle for InputHandle {
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
        Ok(false)
    }

    fn definition(&self) -> &DataDefinition {
        &self.definition
    }

    fn generalization(&self, column: usize) -> Result<u32> {
        self.definition.attribute(column)?;
        Ok(0)
    }

    fn null_token(&self) -> &str {
        &self.null_token
    }
}
