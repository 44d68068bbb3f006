use std::path::PathBuf;

use clap::Parser;
use exportview_core::ViewerConfig;

/// View, filter and re-export a viewing-history data export.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Export archive (.zip) or unpacked export directory
    pub input: PathBuf,

    /// Only show records of this profile
    #[arg(long)]
    pub profile: Option<String>,

    /// Only show records containing this text in any field (case-insensitive)
    #[arg(long)]
    pub search: Option<String>,

    /// Page to display, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Records per page
    #[arg(long = "page-size")]
    pub page_size: Option<usize>,

    /// Name of the history file inside the export
    #[arg(long)]
    pub target: Option<String>,

    /// Write the current page as a standalone HTML document
    #[arg(long, value_name = "FILE")]
    pub html: Option<PathBuf>,

    /// Save the full (or selected profile's) history as CSV into this directory
    #[arg(long, value_name = "DIR")]
    pub download: Option<PathBuf>,

    /// List the profiles found in the export and exit
    #[arg(long, action)]
    pub profiles: bool,

    /// Print viewing statistics for the filtered records
    #[arg(long, action)]
    pub insights: bool,

    /// Print the current state as JSON instead of a table
    #[arg(long, action)]
    pub json: bool,
}

impl Args {
    /// Applies the command-line overrides on top of `config`.
    pub fn apply(&self, mut config: ViewerConfig) -> ViewerConfig {
        if let Some(page_size) = self.page_size {
            config.page_size = page_size.max(1);
        }
        if let Some(target) = &self.target {
            config.target_file.clone_from(target);
        }
        config
    }
}
