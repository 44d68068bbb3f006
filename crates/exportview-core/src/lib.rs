#![deny(unused_must_use)]
// Don't allow dbg! prints in release.
#![cfg_attr(not(debug_assertions), deny(clippy::dbg_macro))]

//! Local processing of personal data exports.
//!
//! Nothing in this crate performs network I/O: an export is extracted, parsed,
//! sorted, filtered, paged, rendered and re-exported entirely in memory.

pub use config::ViewerConfig;
pub use dataset::{Dataset, Record, View};
pub use error::{SearchLocation, ViewerError};
pub use export::Download;
pub use extract::{DiskFile, ExportFile, MemoryFile, Upload};
pub use parse::{ParseOutcome, RowError};
pub use render::Grid;
pub use session::{Event, Invalidation, Session, Snapshot, Status, UploadTicket};
pub use summary::{DateRange, Insights, Summary};

pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod extract;
pub mod filter;
pub mod page;
pub mod parse;
pub mod render;
pub mod session;
pub mod sort;
pub mod summary;
pub mod timestamp;

pub(crate) mod util;

pub type Result<T> = std::result::Result<T, ViewerError>;
