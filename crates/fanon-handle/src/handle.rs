//! The read surface shared by every handle kind.

use std::collections::HashSet;

use fanon_error::{AnonError, Result};
use fanon_types::{DataDefinition, DataType, Interrupt, NodeId, TypedValue};

use crate::input::InputHandle;
use crate::output::OutputHandle;

/// Read access to a tabular view of the session dataset.
///
/// Implemented by the Input handle, by every Output handle, and by subset
/// projections over either of them. Reordering is never done through this
/// trait: it goes through the [`Registry`](crate::Registry) so that all
/// views stay aligned.
pub trait DataHandle {
    fn num_rows(&self) -> usize;

    fn num_columns(&self) -> usize;

    /// Decoded value of a cell.
    ///
    /// Fails with `RowOutOfBounds` / `ColumnOutOfBounds` outside the
    /// current extent.
    fn value(&self, row: usize, column: usize) -> Result<&str>;

    /// Whether the row was suppressed in this view. Always false for Input.
    fn is_outlier(&self, row: usize) -> Result<bool>;

    /// Attribute declarations as seen through this view.
    fn definition(&self) -> &DataDefinition;

    /// Generalization level applied to `column` (0 = original values).
    fn generalization(&self, column: usize) -> Result<u32>;

    /// Token stored for missing cells.
    fn null_token(&self) -> &str;

    fn attribute_name(&self, column: usize) -> Result<&str> {
        self.definition().attribute(column).map(|a| a.name.as_str())
    }

    fn column_index_of(&self, name: &str) -> Result<usize> {
        self.definition().index_of(name)
    }

    fn data_type(&self, column: usize) -> Result<&DataType> {
        self.definition().data_type(column)
    }

    /// Parse `value` as a cell of `column`.
    fn parse(&self, column: usize, value: &str) -> Result<TypedValue> {
        if value == self.null_token() {
            return Ok(TypedValue::Null);
        }
        self.data_type(column)?.parse(value)
    }

    /// Cell value parsed with the column's data type.
    fn typed_value(&self, row: usize, column: usize) -> Result<TypedValue> {
        self.parse(column, self.value(row, column)?)
    }

    /// All decoded values of one row, in column order.
    fn row(&self, row: usize) -> Result<Vec<&str>> {
        (0..self.num_columns())
            .map(|column| self.value(row, column))
            .collect()
    }

    /// Distinct values of `column`, ordered by the column's data type.
    ///
    /// Polls `interrupt` every `poll_interval` rows.
    fn distinct_values(
        &self,
        column: usize,
        interrupt: &Interrupt,
        poll_interval: usize,
    ) -> Result<Vec<String>> {
        self.data_type(column)?;
        let mut seen = HashSet::new();
        for row in 0..self.num_rows() {
            interrupt.poll(row, poll_interval)?;
            seen.insert(self.value(row, column)?);
        }
        let mut keyed = seen
            .into_iter()
            .map(|v| Ok((self.parse(column, v)?, v)))
            .collect::<Result<Vec<_>>>()?;
        keyed.sort();
        interrupt.checkpoint()?;
        Ok(keyed.into_iter().map(|(_, v)| v.to_owned()).collect())
    }
}

pub(crate) fn check_cell(rows: usize, columns: usize, row: usize, column: usize) -> Result<()> {
    if row >= rows {
        return Err(AnonError::row_out_of_bounds(row, rows));
    }
    if column >= columns {
        return Err(AnonError::column_out_of_bounds(column, columns));
    }
    Ok(())
}

/// Registry address of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleRef {
    Input,
    /// The population subset over the Input handle.
    InputSubset,
    /// The Output handle of a lattice node.
    Output(NodeId),
    /// The population subset over a node's Output handle.
    OutputSubset(NodeId),
}

impl HandleRef {
    pub const fn is_subset(self) -> bool {
        matches!(self, Self::InputSubset | Self::OutputSubset(_))
    }

    pub const fn node(self) -> Option<NodeId> {
        match self {
            Self::Output(node) | Self::OutputSubset(node) => Some(node),
            Self::Input | Self::InputSubset => None,
        }
    }
}

/// Read-only projection of a source handle through an index array.
///
/// Row `r` of the view is row `indices[r]` of the source.
#[derive(Debug)]
pub struct SubsetView<'a, S> {
    source: &'a S,
    indices: &'a [usize],
}

impl<S> Clone for SubsetView<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for SubsetView<'_, S> {}

impl<'a, S: DataHandle> SubsetView<'a, S> {
    pub const fn new(source: &'a S, indices: &'a [usize]) -> Self {
        Self { source, indices }
    }

    pub const fn source(&self) -> &'a S {
        self.source
    }

    pub const fn indices(&self) -> &'a [usize] {
        self.indices
    }

    /// Source row behind view row `row`.
    pub fn translate(&self, row: usize) -> Result<usize> {
        self.indices
            .get(row)
            .copied()
            .ok_or_else(|| AnonError::row_out_of_bounds(row, self.indices.len()))
    }
}

impl<S: DataHandle> DataHandle for SubsetView<'_, S> {
    fn num_rows(&self) -> usize {
        self.indices.len()
    }

    fn num_columns(&self) -> usize {
        self.source.num_columns()
    }

    fn value(&self, row: usize, column: usize) -> Result<&str> {
        self.source.value(self.translate(row)?, column)
    }

    fn is_outlier(&self, row: usize) -> Result<bool> {
        self.source.is_outlier(self.translate(row)?)
    }

    fn definition(&self) -> &DataDefinition {
        self.source.definition()
    }

    fn generalization(&self, column: usize) -> Result<u32> {
        self.source.generalization(column)
    }

    fn null_token(&self) -> &str {
        self.source.null_token()
    }
}

/// A borrowed handle resolved from a [`HandleRef`].
#[derive(Debug, Clone, Copy)]
pub enum HandleView<'a> {
    Input(&'a InputHandle),
    InputSubset(SubsetView<'a, InputHandle>),
    Output(&'a OutputHandle),
    OutputSubset(SubsetView<'a, OutputHandle>),
}

impl<'a> HandleView<'a> {
    fn inner(&self) -> &(dyn DataHandle + 'a) {
        match self {
            Self::Input(h) => *h,
            Self::InputSubset(v) => v,
            Self::Output(h) => *h,
            Self::OutputSubset(v) => v,
        }
    }

    /// Index array of a subset view.
    pub const fn subset_indices(&self) -> Option<&'a [usize]> {
        match self {
            Self::InputSubset(v) => Some(v.indices),
            Self::OutputSubset(v) => Some(v.indices),
            Self::Input(_) | Self::Output(_) => None,
        }
    }
}

impl DataHandle for HandleView<'_> {
    fn num_rows(&self) -> usize {
        self.inner().num_rows()
    }

    fn num_columns(&self) -> usize {
        self.inner().num_columns()
    }

    fn value(&self, row: usize, column: usize) -> Result<&str> {
        self.inner().value(row, column)
    }

    fn is_outlier(&self, row: usize) -> Result<bool> {
        self.inner().is_outlier(row)
    }

    fn definition(&self) -> &DataDefinition {
        self.inner().definition()
    }

    fn generalization(&self, column: usize) -> Result<u32> {
        self.inner().generalization(column)
    }

    fn null_token(&self) -> &str {
        self.inner().null_token()
    }
}
