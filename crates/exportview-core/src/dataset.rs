use std::ops::Range;

/// One row of the export. Holds exactly one value per header column; values
/// missing from the source are stored as empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    values: Vec<String>,
}

impl Record {
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Value at `column`; empty when the column is out of range.
    #[inline]
    pub fn get(&self, column: usize) -> &str {
        self.values.get(column).map(String::as_str).unwrap_or("")
    }
}

/// The parsed table: ordered header plus ordered records. Sole owner of the
/// records; views only refer to them by index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    headers: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    /// Builds a dataset, padding or truncating every row to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let records = rows
            .into_iter()
            .map(|mut values| {
                values.resize(width, String::new());
                Record { values }
            })
            .collect();
        Self { headers, records }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of the named field in the header.
    pub fn column(&self, field: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == field)
    }

    /// Value of `field` in the record at `index`.
    pub fn value(&self, index: usize, field: &str) -> Option<&str> {
        let column = self.column(field)?;
        self.record(index).map(|r| r.get(column))
    }
}

/// Ordered record indices into a [`Dataset`]. Reordering or filtering a view
/// never touches the dataset itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    indices: Vec<usize>,
}

impl View {
    /// Every record in source order.
    pub fn all(dataset: &Dataset) -> Self {
        Self {
            indices: (0..dataset.len()).collect(),
        }
    }

    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Indices in `range`, clamped to the view's length.
    pub fn slice(&self, range: Range<usize>) -> &[usize] {
        let end = range.end.min(self.indices.len());
        let start = range.start.min(end);
        &self.indices[start..end]
    }

    /// Records of this view, in view order.
    pub fn records<'a>(&'a self, dataset: &'a Dataset) -> impl Iterator<Item = &'a Record> + 'a {
        self.indices.iter().filter_map(|&i| dataset.record(i))
    }
}
