//! Error types for legacy migration.

use wireless_core_store::NameError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An entry in the legacy section is not a channel.
    #[error("legacy channel '{name}' could not be read: {message}")]
    InvalidEntry { name: String, message: String },

    /// A legacy channel name is not valid under the current rules.
    #[error("legacy channel name is invalid: {0}")]
    InvalidName(#[from] NameError),

    /// The target store refused a write.
    #[error("legacy channels could not be stored: {0}")]
    Store(#[from] wireless_core_store::Error),
}
