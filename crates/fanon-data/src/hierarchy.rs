//! Generalization hierarchies and the reference generalizer.
//!
//! A [`Hierarchy`] is an in-memory table: one row per original value, one
//! column per generalization level, level 0 being the value itself. Before
//! the dictionary is finalized each hierarchy is encoded into the shared
//! dictionary so generalized values decode through the same column
//! dictionary as the input.

use std::collections::HashMap;

use fanon_error::{AnonError, Result};
use smallvec::SmallVec;

use crate::dictionary::Dictionary;
use crate::matrix::DataMatrix;

/// Value-to-level mapping table for one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hierarchy {
    rows: Vec<Vec<String>>,
    index: HashMap<String, usize>,
}

impl Hierarchy {
    /// Build from rows of `[level0, level1, ...]`. Every row must have the
    /// same non-zero number of levels.
    pub fn new(rows: Vec<Vec<String>>) -> Result<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if width == 0 {
            return Err(AnonError::InvalidLattice {
                detail: "hierarchy has no levels".to_owned(),
            });
        }
        let mut index = HashMap::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(AnonError::RowWidthMismatch {
                    row: i,
                    expected: width,
                    actual: row.len(),
                });
            }
            index.entry(row[0].clone()).or_insert(i);
        }
        Ok(Self { rows, index })
    }

    /// Convenience constructor from string slices.
    pub fn from_rows<S: AsRef<str>>(rows: &[&[S]]) -> Result<Self> {
        Self::new(
            rows.iter()
                .map(|r| r.iter().map(|v| v.as_ref().to_owned()).collect())
                .collect(),
        )
    }

    /// Hierarchy with only level 0 (no generalization possible).
    pub fn identity<S: AsRef<str>>(values: &[S]) -> Self {
        let rows: Vec<Vec<String>> = values.iter().map(|v| vec![v.as_ref().to_owned()]).collect();
        let index = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r[0].clone(), i))
            .collect();
        Self { rows, index }
    }

    /// Highest generalization level.
    #[allow(clippy::cast_possible_truncation)]
    pub fn max_level(&self) -> u32 {
        self.rows.first().map_or(0, |r| r.len().saturating_sub(1)) as u32
    }

    /// Generalize `value` to `level`. `column` is the attribute this
    /// hierarchy belongs to and is only used in errors.
    pub fn generalize(&self, column: usize, value: &str, level: u32) -> Result<&str> {
        let row = self
            .index
            .get(value)
            .ok_or_else(|| AnonError::HierarchyMissingValue {
                column,
                value: value.to_owned(),
            })?;
        self.rows[*row]
            .get(level as usize)
            .map(String::as_str)
            .ok_or(AnonError::LevelOutOfRange {
                column,
                level,
                height: self.max_level(),
            })
    }

    /// Register every hierarchy value in `dictionary` under `column` and
    /// return the code-level mapping.
    pub fn encode(&self, dictionary: &mut Dictionary, column: usize) -> Result<EncodedHierarchy> {
        let mut map = HashMap::with_capacity(self.rows.len());
        for row in &self.rows {
            let mut codes = SmallVec::with_capacity(row.len());
            for value in row {
                codes.push(dictionary.register(column, value)?);
            }
            map.entry(codes[0]).or_insert(codes);
        }
        Ok(EncodedHierarchy {
            column,
            max_level: self.max_level(),
            map,
        })
    }
}

/// Hierarchy expressed in dictionary codes for one column.
#[derive(Debug, Clone)]
pub struct EncodedHierarchy {
    column: usize,
    max_level: u32,
    map: HashMap<u32, SmallVec<[u32; 8]>>,
}

impl EncodedHierarchy {
    pub const fn column(&self) -> usize {
        self.column
    }

    pub const fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Code of the generalization of `code` at `level`, if the hierarchy
    /// has a row for it.
    pub fn generalize(&self, code: u32, level: u32) -> Option<u32> {
        self.map.get(&code)?.get(level as usize).copied()
    }
}

/// Derives the encoded output matrix of a transformation from the input.
///
/// Quasi-identifier cells are mapped through their hierarchy at the
/// transformation's level. Suppressed rows get the any-token code in every
/// quasi-identifier column and carry the outlier flag.
pub struct Generalizer<'a> {
    dictionary: &'a Dictionary,
    hierarchies: &'a [EncodedHierarchy],
}

impl<'a> Generalizer<'a> {
    pub fn new(dictionary: &'a Dictionary, hierarchies: &'a [EncodedHierarchy]) -> Result<Self> {
        if !dictionary.is_finalized() {
            return Err(AnonError::DictionaryNotFinalized);
        }
        Ok(Self {
            dictionary,
            hierarchies,
        })
    }

    pub fn apply(
        &self,
        input: &DataMatrix,
        levels: &[u32],
        suppressed: &[usize],
    ) -> Result<DataMatrix> {
        if levels.len() != self.hierarchies.len() {
            return Err(AnonError::InvalidLattice {
                detail: format!(
                    "transformation has {} levels, {} hierarchies configured",
                    levels.len(),
                    self.hierarchies.len()
                ),
            });
        }
        for (h, &level) in self.hierarchies.iter().zip(levels) {
            if level > h.max_level {
                return Err(AnonError::LevelOutOfRange {
                    column: h.column,
                    level,
                    height: h.max_level,
                });
            }
        }
        if let Some(&row) = suppressed.iter().find(|&&r| r >= input.num_rows()) {
            return Err(AnonError::row_out_of_bounds(row, input.num_rows()));
        }

        let mut output = input.clone();
        for row in 0..input.num_rows() {
            output.set_outlier(row, false);
            for (h, &level) in self.hierarchies.iter().zip(levels) {
                let code = input.get(row, h.column);
                let generalized = h.generalize(code, level).ok_or_else(|| {
                    AnonError::HierarchyMissingValue {
                        column: h.column,
                        value: self
                            .dictionary
                            .value(h.column, code)
                            .unwrap_or_default()
                            .to_owned(),
                    }
                })?;
                output.set(row, h.column, generalized);
            }
        }
        for &row in suppressed {
            for h in self.hierarchies {
                output.set(row, h.column, self.dictionary.any_code(h.column)?);
            }
            output.set_outlier(row, true);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanon_types::ANY_VALUE;

    fn age_hierarchy() -> Hierarchy {
        Hierarchy::from_rows(&[
            &["17", "10-19", "*"],
            &["18", "10-19", "*"],
            &["34", "30-39", "*"],
        ])
        .expect("valid hierarchy")
    }

    #[test]
    fn generalize_by_value() {
        let h = age_hierarchy();
        assert_eq!(h.max_level(), 2);
        assert_eq!(h.generalize(0, "18", 1).expect("level 1"), "10-19");
        assert!(matches!(
            h.generalize(4, "99", 0),
            Err(AnonError::HierarchyMissingValue { column: 4, ref value }) if value == "99"
        ));
        assert!(matches!(
            h.generalize(2, "17", 3),
            Err(AnonError::LevelOutOfRange { column: 2, level: 3, height: 2 })
        ));
    }

    #[test]
    fn ragged_hierarchy_rejected() {
        let err = Hierarchy::from_rows(&[&["a", "x"][..], &["b"][..]]).expect_err("ragged");
        assert!(matches!(err, AnonError::RowWidthMismatch { row: 1, .. }));
    }

    #[test]
    fn generalizer_maps_and_suppresses() {
        let mut dict = Dictionary::new(2);
        let mut input = DataMatrix::new(3, 2);
        for (r, (age, name)) in [("17", "ann"), ("34", "bob"), ("18", "cy")].iter().enumerate() {
            let a = dict.register(0, age).expect("register age");
            let n = dict.register(1, name).expect("register name");
            input.set_row(r, &[a, n]);
        }
        let encoded = vec![age_hierarchy().encode(&mut dict, 0).expect("encode")];
        dict.finalize().expect("finalize");

        let generalizer = Generalizer::new(&dict, &encoded).expect("finalized dictionary");
        let out = generalizer.apply(&input, &[1], &[1]).expect("apply");
        assert_eq!(dict.value(0, out.get(0, 0)).expect("decode"), "10-19");
        assert_eq!(dict.value(0, out.get(2, 0)).expect("decode"), "10-19");
        assert_eq!(dict.value(0, out.get(1, 0)).expect("decode"), ANY_VALUE);
        assert!(out.is_outlier(1));
        assert!(!input.is_outlier(1));
        // Non quasi-identifiers pass through.
        assert_eq!(dict.value(1, out.get(1, 1)).expect("decode"), "bob");

        assert!(matches!(
            generalizer.apply(&input, &[3], &[]),
            Err(AnonError::LevelOutOfRange { .. })
        ));
        assert!(matches!(
            generalizer.apply(&input, &[0], &[5]),
            Err(AnonError::RowOutOfBounds { row: 5, rows: 3 })
        ));
    }
}
