use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

const APP_DIR: &str = "filtermix";

/// Resolved on-disk locations.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub presets_db: PathBuf,
    pub lookups_dir: PathBuf,
    pub assets_dir: PathBuf,
}

impl Settings {
    /// `data_dir` comes from `--data-dir` or `FILTERMIX_DATA_DIR`; without
    /// either the platform's local data directory is used.
    pub fn resolve(data_dir: Option<PathBuf>, assets_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("create data dir: {}", data_dir.display()))?;
        let settings = Self::under(&data_dir, assets_dir);
        debug!(?settings, "resolved settings");
        Ok(settings)
    }

    fn under(data_dir: &Path, assets_dir: Option<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            presets_db: data_dir.join("presets.db"),
            lookups_dir: data_dir.join("lookups"),
            assets_dir: assets_dir.unwrap_or_else(|| data_dir.join("assets")),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}
