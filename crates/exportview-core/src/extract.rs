use std::{
    fmt, fs,
    io::{self, Cursor, Read},
    path::{Path, PathBuf},
};

use crate::{Result, SearchLocation, ViewerConfig, ViewerError, util::format_limit_mb};

/// A file handed to the viewer. The size is known up front so limits can be
/// enforced without reading anything.
pub trait ExportFile: fmt::Debug {
    /// File name without any directory component.
    fn name(&self) -> &str;
    fn size(&self) -> u64;
    fn read(&self) -> io::Result<Vec<u8>>;
}

/// File contents already held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryFile {
    name: String,
    bytes: Vec<u8>,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

impl ExportFile for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn read(&self) -> io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// File on disk; metadata is captured when opened, contents on `read`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskFile {
    path: PathBuf,
    name: String,
    size: u64,
}

impl DiskFile {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let size = fs::metadata(&path)?.len();
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { path, name, size })
    }

}

impl ExportFile for DiskFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn read(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }
}

/// What the user picked: one archive, or the files of an unpacked directory.
#[derive(Debug)]
pub enum Upload {
    Archive(Box<dyn ExportFile>),
    Directory(Vec<Box<dyn ExportFile>>),
}

impl Upload {
    /// A directory path becomes a [`Upload::Directory`] of every regular file
    /// beneath it; anything else is treated as an archive.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            let mut paths = Vec::new();
            collect_files(path, &mut paths)?;
            paths.sort();
            let files = paths
                .into_iter()
                .map(|p| DiskFile::open(p).map(|f| Box::new(f) as Box<dyn ExportFile>))
                .collect::<io::Result<Vec<_>>>()?;
            tracing::debug!("{} files found under {}", files.len(), path.display());
            Ok(Upload::Directory(files))
        } else {
            Ok(Upload::Archive(Box::new(DiskFile::open(path)?)))
        }
    }

    /// Checks that can fail before any extraction or read starts.
    pub fn preflight(&self, config: &ViewerConfig) -> Result<()> {
        match self {
            Upload::Archive(file) => check_size(&**file, config.max_file_size),
            Upload::Directory(files) => {
                // A missing target is reported by `extract`, not here.
                match find_in_directory(files, &config.target_file) {
                    Ok(file) => check_size(file, config.max_file_size),
                    Err(_) => Ok(()),
                }
            },
        }
    }

    /// Raw text of the configured target file.
    pub fn extract(&self, config: &ViewerConfig) -> Result<String> {
        self.preflight(config)?;
        match self {
            Upload::Archive(file) => {
                let bytes = file.read().map_err(ViewerError::Read)?;
                extract_from_archive(&bytes, &config.target_file, config.max_file_size)
            },
            Upload::Directory(files) => {
                let file = find_in_directory(files, &config.target_file)?;
                read_text(file)
            },
        }
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(&entry.path(), out)?;
        } else if file_type.is_file() {
            out.push(entry.path());
        }
    }
    Ok(())
}

pub fn check_size(file: &dyn ExportFile, limit: u64) -> Result<()> {
    let size = file.size();
    if size > limit {
        tracing::warn!("{} rejected: {size} bytes exceeds {limit}", file.name());
        return Err(ViewerError::SizeLimitExceeded { size, limit });
    }
    Ok(())
}

/// Opens `bytes` as a zip archive and returns the text of the entry whose path
/// ends with `target`, ignoring case. When several entries match, the last one
/// in archive order wins. An entry that inflates past `max_len` bytes is an
/// extraction error; at most `max_len + 1` bytes are ever decompressed.
pub fn extract_from_archive(bytes: &[u8], target: &str, max_len: u64) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let target_lower = target.to_lowercase();

    let mut found = None;
    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        if entry.is_dir() {
            continue;
        }
        if entry.name().to_lowercase().ends_with(&target_lower) {
            found = Some(i);
        }
    }

    let Some(index) = found else {
        return Err(ViewerError::TargetNotFound {
            target: target.to_owned(),
            location: SearchLocation::Archive,
        });
    };

    let mut entry = archive.by_index(index)?;
    let name = entry.name().to_owned();
    tracing::debug!("Extracting {name} ({} bytes)", entry.size());
    // the declared size is only a hint
    let capacity = usize::try_from(entry.size().min(max_len)).unwrap_or(0);
    let mut buf = Vec::with_capacity(capacity);
    (&mut entry)
        .take(max_len.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(|e| ViewerError::Extraction(e.to_string()))?;
    if buf.len() as u64 > max_len {
        tracing::warn!("{name} inflates past {max_len} bytes");
        return Err(ViewerError::Extraction(format!(
            "{name} is larger than the {} limit once extracted",
            format_limit_mb(max_len)
        )));
    }
    Ok(decode_text(buf))
}

/// First file in `files` named exactly `target`.
pub fn find_in_directory<'a>(
    files: &'a [Box<dyn ExportFile>],
    target: &str,
) -> Result<&'a dyn ExportFile> {
    files
        .iter()
        .map(|f| &**f)
        .find(|f| f.name() == target)
        .ok_or_else(|| ViewerError::TargetNotFound {
            target: target.to_owned(),
            location: SearchLocation::Directory,
        })
}

pub fn read_text(file: &dyn ExportFile) -> Result<String> {
    let bytes = file.read().map_err(ViewerError::Read)?;
    Ok(decode_text(bytes))
}

fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("Replacing invalid UTF-8 in extracted text: {e}");
            String::from_utf8_lossy(&e.into_bytes()).into_owned()
        },
    }
}
