//! Row-producing input sources.

/// A header plus a stream of rows. `None` cells are missing values.
pub struct DataSource {
    header: Vec<String>,
    rows: Box<dyn Iterator<Item = Vec<Option<String>>>>,
}

impl DataSource {
    pub fn new<I>(header: Vec<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<Option<String>>>,
        I::IntoIter: 'static,
    {
        Self {
            header,
            rows: Box::new(rows.into_iter()),
        }
    }

    /// Source over fully populated string rows.
    pub fn from_strings<S: AsRef<str>>(header: &[S], rows: &[Vec<S>]) -> Self {
        let rows: Vec<Vec<Option<String>>> = rows
            .iter()
            .map(|row| row.iter().map(|v| Some(v.as_ref().to_owned())).collect())
            .collect();
        Self::new(
            header.iter().map(|h| h.as_ref().to_owned()).collect(),
            rows,
        )
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Box<dyn Iterator<Item = Vec<Option<String>>>>) {
        (self.header, self.rows)
    }
}

impl std::fmt::Debug for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSource")
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}
