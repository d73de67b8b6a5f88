//! The `config.json` settings file and the data directory layout.
//!
//! ```text
//! <data>/
//!     config.json
//!     channels/<key>.json
//!     channels.db
//!     backups/
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use wireless_core_store::DEFAULT_BAD_CHARACTERS;
use wireless_legacy_adapter::LegacySection;

use crate::error::SettingsError;

pub const CONFIG_FILE: &str = "config.json";
pub const CHANNEL_DIR: &str = "channels";
pub const BACKUP_DIR: &str = "backups";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Keep channels in SQLite instead of one JSON file per channel.
    pub use_relational_backend: bool,
    /// Drop the sign as an item when its point is removed.
    pub drop_point_when_removed: bool,
    pub debug_mode: bool,
    pub log_level: String,
    pub check_for_updates: bool,
    pub cancel_chunk_unloads: bool,
    /// Radius, in chunks, kept loaded around a point.
    pub chunk_unload_range: u32,
    /// Characters a new channel name may not contain.
    pub bad_characters: Vec<char>,
    /// SQLite file name, relative to the data directory.
    pub database_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_relational_backend: false,
            drop_point_when_removed: true,
            debug_mode: false,
            log_level: "info".to_string(),
            check_for_updates: true,
            cancel_chunk_unloads: true,
            chunk_unload_range: 4,
            bad_characters: DEFAULT_BAD_CHARACTERS.to_vec(),
            database_file: "channels.db".to_string(),
        }
    }
}

/// Everything stored in `config.json`.
///
/// Besides the settings, an old installation may still carry every channel in
/// a `wireless_channels` section. It is kept here until it has been migrated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(flatten)]
    pub settings: Settings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wireless_channels: Option<LegacySection>,
}

impl SettingsFile {
    /// Read `path`, writing out the defaults first if it does not exist.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("No settings at {}, writing defaults", path.display());
                let file = SettingsFile::default();
                file.save(path)?;
                return Ok(file);
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let write_err = |source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let text = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, text).map_err(write_err)
    }

    /// Whether a non-empty legacy channel section is waiting to be migrated.
    pub fn has_legacy_channels(&self) -> bool {
        self.wireless_channels
            .as_ref()
            .is_some_and(|section| !section.is_empty())
    }
}

/// Paths derived from the data directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn channel_dir(&self) -> PathBuf {
        self.root.join(CHANNEL_DIR)
    }

    pub fn database(&self, settings: &Settings) -> PathBuf {
        self.root.join(&settings.database_file)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join(BACKUP_DIR)
    }
}
