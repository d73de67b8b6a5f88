//! Channel names: validated display names with a case-folded storage key.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Characters that may never appear in a channel name unless the host
/// configures a different set.
///
/// `/`, `\` and `.` are reserved because the key doubles as a file name.
pub const DEFAULT_BAD_CHARACTERS: &[char] = &[
    '|', '*', '/', '\\', '<', '>', ' ', '=', '~', '!', '^', '(', ')', '.',
];

/// Errors related to channel name validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("channel name must not be empty")]
    Empty,

    #[error("channel name '{name}' contains reserved character '{character}'")]
    ReservedCharacter { name: String, character: char },

    #[error("channel name '{name}' contains a control character")]
    ControlCharacter { name: String },
}

/// A validated channel name.
///
/// The display form keeps the case the user typed; [`ChannelName::key`] is the
/// lowercase form every backend indexes by. Two names are equal when their keys
/// are equal.
///
/// Deserializing only rejects empty names and control characters: a stored
/// name already passed whatever reserved set was configured when it was created.
///
/// # Examples
///
/// ```rust
/// use wireless_core_store::ChannelName;
///
/// let name = ChannelName::parse("Redstone-Door").unwrap();
/// assert_eq!(name.as_str(), "Redstone-Door");
/// assert_eq!(name.key(), "redstone-door");
/// assert_eq!(name, ChannelName::parse("REDSTONE-DOOR").unwrap());
///
/// assert!(ChannelName::parse("front door").is_err());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelName {
    display: String,
    key: String,
}

impl ChannelName {
    /// Parse a name against [`DEFAULT_BAD_CHARACTERS`].
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        Self::parse_with(raw, DEFAULT_BAD_CHARACTERS)
    }

    /// Parse a name against a caller-supplied reserved character set.
    pub fn parse_with(raw: &str, bad_characters: &[char]) -> Result<Self, NameError> {
        if raw.is_empty() {
            return Err(NameError::Empty);
        }

        if let Some(character) = raw.chars().find(|c| bad_characters.contains(c)) {
            return Err(NameError::ReservedCharacter {
                name: raw.to_string(),
                character,
            });
        }

        if raw.chars().any(char::is_control) {
            return Err(NameError::ControlCharacter {
                name: raw.to_string(),
            });
        }

        Ok(ChannelName {
            display: raw.to_string(),
            key: fold(raw),
        })
    }

    /// The name as the user typed it.
    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// The case-folded storage key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Case-fold a raw name into its storage key without validating it.
///
/// Lookups use this so that `get_channel("DOOR")` finds `door`.
pub fn fold(raw: &str) -> String {
    raw.to_lowercase()
}

impl PartialEq for ChannelName {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ChannelName {}

impl Hash for ChannelName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display)
    }
}

impl TryFrom<String> for ChannelName {
    type Error = NameError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        ChannelName::parse_with(&raw, &[])
    }
}

impl From<ChannelName> for String {
    fn from(name: ChannelName) -> Self {
        name.display
    }
}
