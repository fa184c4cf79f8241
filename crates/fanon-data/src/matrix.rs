//! Row-major matrix of dictionary codes.
//!
//! The high bit of column 0 of each row is the OUTLIER flag of that row in
//! this matrix instance. Every read of column 0 masks it out, and every write
//! to column 0 preserves it. Swapping rows moves the flag with the row.

/// Bit of column 0 marking a row as suppressed.
pub const OUTLIER_MASK: u32 = 1 << 31;

/// Mask clearing the outlier bit.
pub const REMOVE_OUTLIER_MASK: u32 = !OUTLIER_MASK;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataMatrix {
    rows: usize,
    columns: usize,
    data: Vec<u32>,
}

impl DataMatrix {
    /// Zero-filled matrix.
    #[must_use]
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            data: vec![0; rows * columns],
        }
    }

    #[inline]
    pub const fn num_rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub const fn num_columns(&self) -> usize {
        self.columns
    }

    #[inline]
    const fn offset(&self, row: usize, column: usize) -> usize {
        row * self.columns + column
    }

    /// Code at `(row, column)` with the outlier bit masked out.
    #[inline]
    pub fn get(&self, row: usize, column: usize) -> u32 {
        debug_assert!(row < self.rows && column < self.columns);
        self.data[self.offset(row, column)] & REMOVE_OUTLIER_MASK
    }

    /// Store `code` at `(row, column)`, keeping the row's outlier flag.
    #[inline]
    pub fn set(&mut self, row: usize, column: usize, code: u32) {
        debug_assert!(row < self.rows && column < self.columns);
        debug_assert_eq!(code & OUTLIER_MASK, 0, "code collides with the outlier bit");
        let idx = self.offset(row, column);
        let flag = if column == 0 {
            self.data[idx] & OUTLIER_MASK
        } else {
            0
        };
        self.data[idx] = code | flag;
    }

    /// Overwrite every cell of `row`, keeping its outlier flag.
    pub fn set_row(&mut self, row: usize, codes: &[u32]) {
        debug_assert_eq!(codes.len(), self.columns);
        let flag = self.is_outlier(row);
        let start = self.offset(row, 0);
        self.data[start..start + self.columns].copy_from_slice(codes);
        if flag {
            self.data[start] |= OUTLIER_MASK;
        }
    }

    /// Codes of `row` with the outlier bit masked out.
    pub fn row(&self, row: usize) -> impl Iterator<Item = u32> + '_ {
        let start = self.offset(row, 0);
        self.data[start..start + self.columns]
            .iter()
            .map(|code| code & REMOVE_OUTLIER_MASK)
    }

    #[inline]
    pub fn is_outlier(&self, row: usize) -> bool {
        self.columns > 0 && self.data[self.offset(row, 0)] & OUTLIER_MASK != 0
    }

    pub fn set_outlier(&mut self, row: usize, outlier: bool) {
        if self.columns == 0 {
            return;
        }
        let idx = self.offset(row, 0);
        if outlier {
            self.data[idx] |= OUTLIER_MASK;
        } else {
            self.data[idx] &= REMOVE_OUTLIER_MASK;
        }
    }

    /// Number of rows carrying the outlier flag.
    pub fn outlier_count(&self) -> usize {
        (0..self.rows).filter(|&r| self.is_outlier(r)).count()
    }

    /// Exchange two entire rows, including their outlier flags.
    pub fn swap(&mut self, row1: usize, row2: usize) {
        if row1 == row2 {
            return;
        }
        let a = self.offset(row1, 0);
        let b = self.offset(row2, 0);
        for c in 0..self.columns {
            self.data.swap(a + c, b + c);
        }
    }
}
