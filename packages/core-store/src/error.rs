//! Error types shared by every channel store.

use crate::location::Location;
use crate::name::NameError;
use crate::point::PointKind;

/// Errors from the model and from any [`ChannelStore`](crate::ChannelStore).
///
/// `ChannelNotFound`, `PointNotFound`, `AlreadyExists`, `DuplicateLocation` and
/// `InvalidName` are validation errors meant for the user who asked. The rest
/// are storage failures.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("channel '{name}' not found")]
    ChannelNotFound { name: String },

    #[error("no {kind} at {location} in channel '{channel}'")]
    PointNotFound {
        channel: String,
        location: Location,
        kind: PointKind,
    },

    #[error("no point at {location} in channel '{channel}'")]
    NoPointAt { channel: String, location: Location },

    #[error("channel '{name}' already exists")]
    AlreadyExists { name: String },

    #[error("channel '{channel}' already has a point at {location}")]
    DuplicateLocation { channel: String, location: Location },

    #[error(transparent)]
    InvalidName(#[from] NameError),

    #[error("storage could not be initialized: {message}")]
    StorageInit { message: String },

    #[error("storage is not initialized")]
    NotInitialized,

    #[error("conversion failed: {message}")]
    Conversion { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {message}")]
    Serialization { message: String },

    #[error("database error: {message}")]
    Database { message: String },
}

impl Error {
    pub fn channel_not_found(name: impl Into<String>) -> Self {
        Error::ChannelNotFound { name: name.into() }
    }

    /// True for both a missing channel and a missing point.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::ChannelNotFound { .. }
                | Error::PointNotFound { .. }
                | Error::NoPointAt { .. }
        )
    }

    /// True for errors caused by the request rather than by the store.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::ChannelNotFound { .. }
                | Error::PointNotFound { .. }
                | Error::NoPointAt { .. }
                | Error::AlreadyExists { .. }
                | Error::DuplicateLocation { .. }
                | Error::InvalidName(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn not_found_display() {
        let e = Error::channel_not_found("door");
        assert_eq!(e.to_string(), "channel 'door' not found");
        assert!(e.is_not_found());
        assert!(e.is_validation());
    }

    #[test]
    fn point_not_found_display() {
        let e = Error::PointNotFound {
            channel: "door".to_string(),
            location: Location::new("world", 1, 2, 3),
            kind: PointKind::InvertedReceiver,
        };
        let display = e.to_string();
        assert!(display.contains("inverted_receiver"));
        assert!(display.contains("world(1, 2, 3)"));
        assert!(e.is_not_found());
    }

    #[test]
    fn storage_errors_are_not_validation() {
        let e = Error::StorageInit {
            message: "read-only".to_string(),
        };
        assert!(!e.is_validation());
        assert!(!Error::NotInitialized.is_not_found());
    }

    #[test]
    fn io_error_converts_with_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(StdError::source(&e).is_some());
    }

    #[test]
    fn name_error_is_transparent() {
        let e: Error = NameError::Empty.into();
        assert_eq!(e.to_string(), NameError::Empty.to_string());
        assert!(e.is_validation());
    }

    #[test]
    fn json_error_converts() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let e: Error = json_err.into();
        assert!(matches!(e, Error::Serialization { .. }));
    }
}
