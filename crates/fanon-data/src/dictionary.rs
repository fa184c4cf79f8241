//! Per-column string ↔ code dictionary.
//!
//! Codes are dense per column (`0..cardinality`) and assigned in first-seen
//! order while the input is scanned once. After [`Dictionary::finalize`] the
//! mapping is frozen; every column then also contains [`ANY_VALUE`] so that
//! suppressed cells can always be decoded.

use std::collections::HashMap;

use fanon_error::{AnonError, Result};
use fanon_types::ANY_VALUE;
use tracing::debug;

use crate::matrix::OUTLIER_MASK;

/// Largest number of distinct values a column may hold; codes must stay
/// below the outlier bit.
pub const MAX_CODES: usize = OUTLIER_MASK as usize;

#[derive(Debug, Clone, Default)]
struct ColumnDictionary {
    codes: HashMap<String, u32>,
    values: Vec<String>,
}

impl ColumnDictionary {
    fn register(&mut self, column: usize, value: &str) -> Result<u32> {
        if let Some(&code) = self.codes.get(value) {
            return Ok(code);
        }
        if self.values.len() >= MAX_CODES {
            return Err(AnonError::DictionaryOverflow {
                column,
                max: MAX_CODES,
            });
        }
        #[allow(clippy::cast_possible_truncation)]
        let code = self.values.len() as u32;
        self.codes.insert(value.to_owned(), code);
        self.values.push(value.to_owned());
        Ok(code)
    }
}

/// Dictionary for all columns of one dataset session.
#[derive(Debug, Clone)]
pub struct Dictionary {
    columns: Vec<ColumnDictionary>,
    finalized: bool,
}

impl Dictionary {
    #[must_use]
    pub fn new(num_columns: usize) -> Self {
        Self {
            columns: vec![ColumnDictionary::default(); num_columns],
            finalized: false,
        }
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub const fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Return the code of `value` in `column`, assigning the next free code
    /// the first time the value is seen.
    pub fn register(&mut self, column: usize, value: &str) -> Result<u32> {
        if self.finalized {
            return Err(AnonError::DictionaryFinalized);
        }
        let columns = self.columns.len();
        self.columns
            .get_mut(column)
            .ok_or_else(|| AnonError::column_out_of_bounds(column, columns))?
            .register(column, value)
    }

    /// Freeze the dictionary. Fails if it was already finalized.
    pub fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Err(AnonError::DictionaryFinalized);
        }
        for (column, dict) in self.columns.iter_mut().enumerate() {
            dict.register(column, ANY_VALUE)?;
        }
        self.finalized = true;
        debug!(
            target: "fanon.data",
            columns = self.columns.len(),
            codes = self.columns.iter().map(|c| c.values.len()).sum::<usize>(),
            "dictionary finalized"
        );
        Ok(())
    }

    /// Decode `code` in `column`. The code must already have the outlier bit
    /// masked out.
    pub fn value(&self, column: usize, code: u32) -> Result<&str> {
        let dict = self.column(column)?;
        dict.values
            .get(code as usize)
            .map(String::as_str)
            .ok_or_else(|| AnonError::internal(format!("unknown code {code} in column {column}")))
    }

    /// Look up the code of `value` without registering it.
    pub fn code(&self, column: usize, value: &str) -> Option<u32> {
        self.columns.get(column)?.codes.get(value).copied()
    }

    /// Code of [`ANY_VALUE`] in `column`; available once finalized.
    pub fn any_code(&self, column: usize) -> Result<u32> {
        if !self.finalized {
            return Err(AnonError::DictionaryNotFinalized);
        }
        self.column(column)?
            .codes
            .get(ANY_VALUE)
            .copied()
            .ok_or_else(|| AnonError::internal(format!("column {column} lacks the any token")))
    }

    /// Number of distinct values registered for `column`.
    pub fn cardinality(&self, column: usize) -> Result<usize> {
        Ok(self.column(column)?.values.len())
    }

    /// All values of `column` in code order.
    pub fn values(&self, column: usize) -> Result<&[String]> {
        Ok(&self.column(column)?.values)
    }

    fn column(&self, column: usize) -> Result<&ColumnDictionary> {
        self.columns
            .get(column)
            .ok_or_else(|| AnonError::column_out_of_bounds(column, self.columns.len()))
    }
}
