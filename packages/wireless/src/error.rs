use std::io;
use std::path::PathBuf;

/// Errors reading or writing the settings file.
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("could not read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("could not write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("{} is not a valid settings file: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Failures that keep channel storage from starting at all.
///
/// These are kept apart from [`wireless_core_store::Error`]: when one of them
/// comes back the host must not offer any channel functionality.
#[derive(thiserror::Error, Debug)]
pub enum StartupError {
    #[error("settings could not be loaded: {0}")]
    Settings(#[from] SettingsError),

    #[error("legacy channels could not be migrated: {0}")]
    LegacyMigration(#[from] wireless_legacy_adapter::Error),

    #[error("channel storage could not be initialized: {0}")]
    StorageInit(wireless_core_store::Error),
}

#[derive(thiserror::Error, Debug)]
#[error("logging could not be initialized: {0}")]
pub struct LoggingError(pub String);
