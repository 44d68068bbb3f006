use std::{fmt, io};

use thiserror::Error;

use crate::util::{format_limit_mb, format_mb};

/// Where a target file was searched for, used in "not found" messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLocation {
    Archive,
    Directory,
}

impl fmt::Display for SearchLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchLocation::Archive => f.write_str("inside the ZIP file"),
            SearchLocation::Directory => f.write_str("in the selected folder"),
        }
    }
}

/// Every failure the pipeline can report. The `Display` text is what a user
/// sees in the status region.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error(
        "File is too large. Maximum size is {}. (Selected: {})",
        format_limit_mb(*limit),
        format_mb(*size)
    )]
    SizeLimitExceeded { size: u64, limit: u64 },

    #[error("Could not find '{target}' {location}.")]
    TargetNotFound {
        target: String,
        location: SearchLocation,
    },

    #[error("Failed to process ZIP file: {0}")]
    Extraction(String),

    #[error("Failed to parse CSV file: {0}")]
    Parse(String),

    #[error("The CSV file appears to be empty.")]
    EmptyInput,

    #[error("Error reading the file.")]
    Read(#[source] io::Error),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to save download: {0}")]
    Save(#[source] io::Error),

    #[error("Invalid configuration value for {key}: {value:?}")]
    InvalidConfig { key: String, value: String },
}

impl From<zip::result::ZipError> for ViewerError {
    fn from(err: zip::result::ZipError) -> Self {
        ViewerError::Extraction(err.to_string())
    }
}

impl ViewerError {
    /// Size-limit failures are raised before any work starts; callers use this
    /// to avoid showing a loading state for them.
    pub fn is_preflight(&self) -> bool {
        matches!(self, ViewerError::SizeLimitExceeded { .. })
    }
}
