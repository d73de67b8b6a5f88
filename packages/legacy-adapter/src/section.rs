//! The shape of the legacy `wireless_channels` section.
//!
//! ```json
//! "wireless_channels": {
//!     "Door": {
//!         "state": false,
//!         "owners": ["alex"],
//!         "transmitters": [{ "world": "world", "x": 1, "y": 64, "z": 1 }],
//!         "receivers": [
//!             { "world": "world", "x": 5, "y": 64, "z": 1, "direction": "east" },
//!             { "world": "world", "x": 6, "y": 64, "z": 1, "inverted": true }
//!         ],
//!         "screens": []
//!     }
//! }
//! ```
//!
//! Points were grouped by kind and an inverted receiver was a receiver with a
//! flag. The per-channel layout tags each point with its kind instead.

use serde::Deserialize;
use wireless_core_store::{Channel, ChannelName, Location, Orientation, Point, PointKind};

use crate::Error;

/// Channel name to raw channel fields, exactly as found in the config file.
pub type LegacySection = serde_json::Map<String, serde_json::Value>;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LegacyChannel {
    pub state: bool,
    pub owners: Vec<String>,
    pub locked: bool,
    pub transmitters: Vec<LegacyPoint>,
    pub receivers: Vec<LegacyPoint>,
    pub screens: Vec<LegacyPoint>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LegacyPoint {
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub inverted: bool,
}

impl LegacyPoint {
    fn into_point(self, channel: &str, kind: PointKind) -> Point {
        let orientation = match self.direction.as_deref() {
            None => Orientation::default(),
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(channel, "{}, facing north instead", e);
                Orientation::default()
            }),
        };
        let kind = if kind == PointKind::Receiver && self.inverted {
            PointKind::InvertedReceiver
        } else {
            kind
        };
        Point::new(
            kind,
            Location::new(self.world, self.x, self.y, self.z),
            orientation,
        )
    }
}

impl LegacyChannel {
    /// Read one entry of the legacy section.
    pub fn from_entry(name: &str, value: &serde_json::Value) -> Result<Self, Error> {
        LegacyChannel::deserialize(value).map_err(|e| Error::InvalidEntry {
            name: name.to_string(),
            message: e.to_string(),
        })
    }

    /// Build the channel this entry describes.
    pub fn into_channel(self, name: &str, bad_characters: &[char]) -> Result<Channel, Error> {
        let mut channel = Channel::new(ChannelName::parse_with(name, bad_characters)?);
        channel.set_state(self.state);
        channel.set_locked(self.locked);
        for owner in self.owners {
            channel.add_owner(owner);
        }

        let points = self
            .transmitters
            .into_iter()
            .map(|p| (p, PointKind::Transmitter))
            .chain(self.receivers.into_iter().map(|p| (p, PointKind::Receiver)))
            .chain(self.screens.into_iter().map(|p| (p, PointKind::Screen)));

        for (legacy, kind) in points {
            channel
                .add_point(legacy.into_point(name, kind))
                .map_err(|e| Error::InvalidEntry {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
        }
        Ok(channel)
    }
}
