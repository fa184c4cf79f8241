//! Explicit populations: a row-membership set plus its sorted row indices.

use std::collections::HashMap;

use fanon_data::PopulationSet;
use fanon_error::{AnonError, Result};
use fanon_handle::DataHandle;
use fanon_types::Interrupt;
use tracing::debug;

use crate::selector::DataSelector;

/// Immutable population over a universe of `set().capacity()` rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSubset {
    set: PopulationSet,
    indices: Vec<usize>,
}

impl DataSubset {
    fn from_set(set: PopulationSet, mode: &'static str) -> Self {
        let indices = set.to_sorted_indices();
        debug!(
            target: "fanon.subset",
            mode,
            rows = set.capacity(),
            members = indices.len(),
            "subset built"
        );
        Self { set, indices }
    }

    /// Subset of the given rows of a `rows`-row dataset.
    ///
    /// Fails with `SubsetIndexOutOfRange` unless every index is below
    /// `rows`. Repeated indices are kept once.
    pub fn from_indices(rows: usize, indices: &[usize]) -> Result<Self> {
        if let Some(&index) = indices.iter().find(|&&i| i >= rows) {
            return Err(AnonError::SubsetIndexOutOfRange { index, rows });
        }
        let mut set = PopulationSet::new(rows);
        for &index in indices {
            set.add(index)?;
        }
        Ok(Self::from_set(set, "indices"))
    }

    /// Rows of `background` whose full tuple occurs in `subset`.
    ///
    /// Fails with `NoMatchFound` naming the first `subset` row absent from
    /// the background. Identical background rows collapse to the last of
    /// them, so a tuple occurring several times in the background is only
    /// ever matched once.
    pub fn from_matching<B, S>(background: &B, subset: &S) -> Result<Self>
    where
        B: DataHandle + ?Sized,
        S: DataHandle + ?Sized,
    {
        if background.num_columns() != subset.num_columns() {
            return Err(AnonError::RowWidthMismatch {
                row: 0,
                expected: background.num_columns(),
                actual: subset.num_columns(),
            });
        }
        let mut by_tuple = HashMap::with_capacity(background.num_rows());
        for row in 0..background.num_rows() {
            by_tuple.insert(background.row(row)?, row);
        }
        let mut set = PopulationSet::new(background.num_rows());
        for row in 0..subset.num_rows() {
            let tuple = subset.row(row)?;
            let &index = by_tuple
                .get(&tuple)
                .ok_or(AnonError::NoMatchFound { row })?;
            set.add(index)?;
        }
        Ok(Self::from_set(set, "matching"))
    }

    /// Rows of the selector's handle that satisfy it.
    ///
    /// Polls `interrupt` every `poll_interval` rows.
    pub fn from_selector<H>(
        selector: &mut DataSelector<'_, H>,
        interrupt: &Interrupt,
        poll_interval: usize,
    ) -> Result<Self>
    where
        H: DataHandle + ?Sized,
    {
        selector.compile()?;
        let rows = selector.handle().num_rows();
        let mut set = PopulationSet::new(rows);
        for row in 0..rows {
            interrupt.poll(row, poll_interval)?;
            if selector.selected(row)? {
                set.add(row)?;
            }
        }
        Ok(Self::from_set(set, "selector"))
    }

    pub fn set(&self) -> &PopulationSet {
        &self.set
    }

    /// Member rows, ascending.
    pub fn sorted_indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn into_set(self) -> PopulationSet {
        self.set
    }
}
