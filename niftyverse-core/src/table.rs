//! Column-oriented table parsed from a delimited payload.
//!
//! Cells are either absent or raw text. Type inference happens later, in
//! column profiling, so the table itself stays source-agnostic.

use crate::error::AttemptError;

/// Field values read as missing: the usual NA spellings dataframe and
/// spreadsheet exports write. Matched exactly, without trimming.
pub const NA_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether a raw field is an absent cell.
pub fn is_missing(field: &str) -> bool {
    field.is_empty() || NA_TOKENS.contains(&field)
}

/// A named column of raw cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    cells: Vec<Option<String>>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    /// Build a column from text values. Empty strings and NA tokens become
    /// absent cells, matching how CSV fields are read.
    pub fn from_values<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cells = values
            .into_iter()
            .map(Into::into)
            .map(|v: String| if is_missing(&v) { None } else { Some(v) })
            .collect();
        Self::new(name, cells)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cells(&self) -> &[Option<String>] {
        &self.cells
    }

    /// Present (non-absent) cells in row order.
    pub fn present(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().filter_map(|c| c.as_deref())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Parsed tabular resource. Never has zero rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Assemble a table from columns, padding short columns with absent
    /// cells. Fails with `AttemptError::Empty` when there are no rows.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, AttemptError> {
        let rows = columns.iter().map(Column::len).max().unwrap_or(0);
        if rows == 0 {
            return Err(AttemptError::Empty);
        }
        let columns = columns
            .into_iter()
            .map(|mut col| {
                col.cells.resize(rows, None);
                col
            })
            .collect();
        Ok(Self { columns, rows })
    }

    /// Parse comma-separated text with the first record as header.
    ///
    /// A leading byte-order mark is dropped. Header names are kept verbatim.
    /// Short rows are padded with absent cells; rows wider than the header
    /// are rejected. Empty fields and `NA_TOKENS` are absent cells. Blank
    /// lines are skipped.
    pub fn parse_csv(text: &str) -> Result<Self, AttemptError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Err(AttemptError::MissingHeader);
        }

        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() > headers.len() {
                return Err(AttemptError::RaggedRow {
                    row: i + 1,
                    fields: record.len(),
                    expected: headers.len(),
                });
            }
            for (idx, column) in cells.iter_mut().enumerate() {
                let cell = record
                    .get(idx)
                    .filter(|field| !is_missing(field))
                    .map(str::to_owned);
                column.push(cell);
            }
        }

        let columns = headers
            .iter()
            .zip(cells)
            .map(|(name, cells)| Column::new(name, cells))
            .collect();
        Self::from_columns(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// First column with exactly this name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }
}
