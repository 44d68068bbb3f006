use std::{env, str::FromStr};

use bon::Builder;

use crate::{Result, ViewerError, page::DEFAULT_PAGE_SIZE};

/// 50MB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;
pub const DEFAULT_TARGET_FILE: &str = "ViewingActivity.csv";
pub const DEFAULT_EXPORT_STEM: &str = "ViewingActivity";

const ENV_PREFIX: &str = "EXPORTVIEW_";

/// Layout of the export being viewed plus the resource limits applied to it.
///
/// Defaults describe a Netflix viewing-history export.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct ViewerConfig {
    #[builder(default = DEFAULT_MAX_FILE_SIZE)]
    pub max_file_size: u64,

    #[builder(default = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// File located inside the archive (suffix, any case) or directory (exact name).
    #[builder(into, default = DEFAULT_TARGET_FILE.to_owned())]
    pub target_file: String,

    #[builder(into, default = "Profile Name".to_owned())]
    pub profile_field: String,

    #[builder(into, default = "Start Time".to_owned())]
    pub timestamp_field: String,

    #[builder(into, default = "Title".to_owned())]
    pub title_field: String,

    #[builder(into, default = "Duration".to_owned())]
    pub duration_field: String,

    #[builder(into, default = "Device Type".to_owned())]
    pub device_field: String,

    /// Download file name without extension.
    #[builder(into, default = DEFAULT_EXPORT_STEM.to_owned())]
    pub export_stem: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ViewerConfig {
    /// Defaults overlaid with `EXPORTVIEW_*` variables from the process
    /// environment, after loading a `.env` file if one is present.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::info!("Using .env file: {}", path.display()),
            Err(e) if e.not_found() => {},
            Err(e) => tracing::warn!("Failed to load .env file: {e}"),
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each
    /// `EXPORTVIEW_*` key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = get("MAX_FILE_SIZE") {
            config.max_file_size = parse_value("MAX_FILE_SIZE", &v)?;
        }
        if let Some(v) = get("PAGE_SIZE") {
            let page_size: usize = parse_value("PAGE_SIZE", &v)?;
            if page_size == 0 {
                return Err(invalid("PAGE_SIZE", &v));
            }
            config.page_size = page_size;
        }

        let text_fields: [(&str, &mut String); 7] = [
            ("TARGET_FILE", &mut config.target_file),
            ("PROFILE_FIELD", &mut config.profile_field),
            ("TIMESTAMP_FIELD", &mut config.timestamp_field),
            ("TITLE_FIELD", &mut config.title_field),
            ("DURATION_FIELD", &mut config.duration_field),
            ("DEVICE_FIELD", &mut config.device_field),
            ("EXPORT_STEM", &mut config.export_stem),
        ];
        for (name, slot) in text_fields {
            if let Some(v) = get(name) {
                if v.trim().is_empty() {
                    return Err(invalid(name, &v));
                }
                *slot = v;
            }
        }

        tracing::debug!("viewer config: {config:?}");
        Ok(config)
    }
}

fn parse_value<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse::<T>().map_err(|_| invalid(name, value))
}

fn invalid(name: &str, value: &str) -> ViewerError {
    ViewerError::InvalidConfig {
        key: format!("{ENV_PREFIX}{name}"),
        value: value.to_owned(),
    }
}
