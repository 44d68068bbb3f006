use std::fmt;

use crate::{Dataset, Result, ViewerError};

/// A source row that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// 1-based line in the source text, when known.
    pub line: Option<u64>,
    pub message: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Everything one parse produced: the usable rows and the rows that were
/// dropped. Classifying the result is left to [`ParseOutcome::into_result`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub dataset: Dataset,
    pub errors: Vec<RowError>,
}

impl ParseOutcome {
    pub fn loaded(&self) -> usize {
        self.dataset.len()
    }

    pub fn skipped(&self) -> usize {
        self.errors.len()
    }

    /// Zero usable rows is a failure: a parse error when some row was
    /// malformed, otherwise empty input. Anything else succeeds, with or
    /// without skipped rows.
    pub fn into_result(self) -> Result<Self> {
        if !self.dataset.is_empty() {
            return Ok(self);
        }
        match self.errors.into_iter().next() {
            Some(first) => Err(ViewerError::Parse(first.to_string())),
            None => Err(ViewerError::EmptyInput),
        }
    }

    pub fn status_message(&self) -> String {
        let mut msg = format!("Successfully loaded {} rows.", self.loaded());
        if self.skipped() > 0 {
            msg.push_str(&format!(
                " Warning: {} rows could not be parsed and were skipped.",
                self.skipped()
            ));
        }
        msg
    }
}

/// Parses comma-delimited text with a header line. Blank lines are ignored;
/// rows whose width differs from the header are recorded as errors and left
/// out.
pub fn parse_csv(text: &str) -> ParseOutcome {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = match rdr.headers() {
        Ok(h) => h.iter().map(str::to_owned).collect(),
        Err(e) => {
            return ParseOutcome {
                dataset: Dataset::default(),
                errors: vec![row_error(&e)],
            };
        },
    };
    if headers.is_empty() {
        return ParseOutcome::default();
    }

    let mut rows = Vec::new();
    let mut errors = Vec::new();
    for result in rdr.records() {
        match result {
            Ok(record) if record.len() == headers.len() => {
                rows.push(record.iter().map(str::to_owned).collect::<Vec<_>>());
            },
            Ok(record) => errors.push(RowError {
                line: record.position().map(csv::Position::line),
                message: format!(
                    "expected {} fields, found {}",
                    headers.len(),
                    record.len()
                ),
            }),
            Err(e) => errors.push(row_error(&e)),
        }
    }

    if !errors.is_empty() {
        tracing::warn!(
            "{} CSV rows could not be parsed, first: {}",
            errors.len(),
            errors[0]
        );
    }
    tracing::info!("parsed {} rows with {} columns", rows.len(), headers.len());

    ParseOutcome {
        dataset: Dataset::new(headers, rows),
        errors,
    }
}

/// [`parse_csv`] followed by [`ParseOutcome::into_result`].
pub fn parse_dataset(text: &str) -> Result<ParseOutcome> {
    parse_csv(text).into_result()
}

fn row_error(e: &csv::Error) -> RowError {
    RowError {
        line: e.position().map(csv::Position::line),
        message: e.to_string(),
    }
}
