//! World locations and sign orientation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A block position in a named world.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Location {
    pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {}, {})", self.world, self.x, self.y, self.z)
    }
}

/// The direction a point's sign faces.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    North,
    East,
    South,
    West,
    Up,
    Down,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::North => "north",
            Orientation::East => "east",
            Orientation::South => "south",
            Orientation::West => "west",
            Orientation::Up => "up",
            Orientation::Down => "down",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an orientation string is not recognized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown orientation '{0}'")]
pub struct UnknownOrientation(pub String);

impl FromStr for Orientation {
    type Err = UnknownOrientation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "north" => Ok(Orientation::North),
            "east" => Ok(Orientation::East),
            "south" => Ok(Orientation::South),
            "west" => Ok(Orientation::West),
            "up" => Ok(Orientation::Up),
            "down" => Ok(Orientation::Down),
            _ => Err(UnknownOrientation(s.to_string())),
        }
    }
}
