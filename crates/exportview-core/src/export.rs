use std::{
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::{Dataset, Result, View, ViewerError};

/// A serialized export ready to be handed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub contents: Vec<u8>,
}

impl Download {
    /// Writes the download into `dir` under its file name. The bytes go to a
    /// temporary file in `dir` first, which is renamed into place only once
    /// fully written; on failure the temporary file is removed.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        let target = dir.join(&self.file_name);
        let mut tmp = NamedTempFile::new_in(dir).map_err(ViewerError::Save)?;
        tmp.write_all(&self.contents).map_err(ViewerError::Save)?;
        tmp.flush().map_err(ViewerError::Save)?;
        tmp.persist(&target).map_err(|e| ViewerError::Save(e.error))?;
        tracing::info!(
            "saved {} bytes to {}",
            self.contents.len(),
            target.display()
        );
        Ok(target)
    }
}

/// `<stem>.csv` for the full history, `<stem>_<profile>.csv` otherwise with
/// every character of the profile that is not an ASCII letter or digit
/// replaced by `_`.
pub fn export_file_name(stem: &str, profile: &str) -> String {
    if profile.is_empty() {
        return format!("{stem}.csv");
    }
    let token = crate::regex_oncelock!(r"[^A-Za-z0-9]").replace_all(profile, "_");
    format!("{stem}_{token}.csv")
}

/// Header then one record per line in view order, `\n` terminated, fields
/// quoted only when they need it.
pub fn serialize_csv(dataset: &Dataset, view: &View) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::with_capacity(view.len() * 64));
    wtr.write_record(dataset.headers())?;
    for record in view.records(dataset) {
        wtr.write_record(record.values())?;
    }
    wtr.into_inner().map_err(|e| ViewerError::Save(e.into_error()))
}

/// Serializes `view` (the full base ordering or a profile subset) under the
/// file name for `profile`.
pub fn prepare_download(
    dataset: &Dataset,
    view: &View,
    stem: &str,
    profile: &str,
) -> Result<Download> {
    let contents = serialize_csv(dataset, view)?;
    tracing::debug!("prepared download of {} records", view.len());
    Ok(Download {
        file_name: export_file_name(stem, profile),
        contents,
    })
}
