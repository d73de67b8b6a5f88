//! The channel aggregate: a name, its points and its last known state.

use serde::{Deserialize, Serialize};

use crate::location::Location;
use crate::name::{ChannelName, NameError};
use crate::point::{Point, PointKind};
use crate::Error;

/// A named signal bus and the points bound to it.
///
/// Channels handed out by a store are snapshots. Mutating one changes nothing
/// on disk until it is written back through the store.
///
/// # Example
///
/// ```rust
/// use wireless_core_store::{Channel, Location, Point, PointKind};
///
/// let mut channel = Channel::named("gate").unwrap();
/// channel.add_point(Point::transmitter(Location::new("world", 0, 64, 0))).unwrap();
/// channel.add_point(Point::receiver(Location::new("world", 4, 64, 0))).unwrap();
///
/// assert_eq!(channel.points_of(PointKind::Receiver).count(), 1);
/// assert!(channel.add_point(Point::screen(Location::new("world", 0, 64, 0))).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    name: ChannelName,
    #[serde(default)]
    state: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    owners: Vec<String>,
    #[serde(default)]
    locked: bool,
    #[serde(default)]
    points: Vec<Point>,
}

impl Channel {
    pub fn new(name: ChannelName) -> Self {
        Self {
            name,
            state: false,
            owners: Vec::new(),
            locked: false,
            points: Vec::new(),
        }
    }

    /// Validate `raw` against the default reserved characters and build an empty channel.
    pub fn named(raw: &str) -> Result<Self, NameError> {
        Ok(Self::new(ChannelName::parse(raw)?))
    }

    pub fn name(&self) -> &ChannelName {
        &self.name
    }

    /// The case-folded key stores index this channel by.
    pub fn key(&self) -> &str {
        self.name.key()
    }

    /// Rename the channel and rebind every point to the new name.
    pub fn set_name(&mut self, name: ChannelName) {
        self.name = name;
        self.bind_points();
    }

    /// Point every contained point's channel reference at this channel.
    ///
    /// Stores call this after loading, since point records do not repeat
    /// the channel name.
    pub fn bind_points(&mut self) {
        let name = self.name.as_str().to_string();
        for point in &mut self.points {
            point.channel.clone_from(&name);
        }
    }

    pub fn state(&self) -> bool {
        self.state
    }

    /// Set the in-memory state. Nothing is persisted.
    pub fn set_state(&mut self, state: bool) {
        self.state = state;
    }

    pub fn owners(&self) -> &[String] {
        &self.owners
    }

    pub fn add_owner(&mut self, owner: impl Into<String>) {
        let owner = owner.into();
        if !self.owners.contains(&owner) {
            self.owners.push(owner);
        }
    }

    pub fn is_owner(&self, who: &str) -> bool {
        self.owners.iter().any(|o| o == who)
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [Point] {
        &mut self.points
    }

    pub fn points_of(&self, kind: PointKind) -> impl Iterator<Item = &Point> {
        self.points.iter().filter(move |p| p.kind == kind)
    }

    pub fn point_at(&self, location: &Location) -> Option<&Point> {
        self.points.iter().find(|p| &p.location == location)
    }

    /// Bind a point to this channel.
    ///
    /// Only one point may occupy a location within a channel, whatever its kind.
    pub fn add_point(&mut self, mut point: Point) -> Result<(), Error> {
        if self.point_at(&point.location).is_some() {
            return Err(Error::DuplicateLocation {
                channel: self.name.to_string(),
                location: point.location,
            });
        }
        point.channel = self.name.as_str().to_string();
        self.points.push(point);
        Ok(())
    }

    /// Remove the point of `kind` at `location`.
    pub fn remove_point(&mut self, location: &Location, kind: PointKind) -> Result<Point, Error> {
        let index = self
            .points
            .iter()
            .position(|p| &p.location == location && p.kind == kind)
            .ok_or_else(|| Error::PointNotFound {
                channel: self.name.to_string(),
                location: location.clone(),
                kind,
            })?;
        Ok(self.points.remove(index))
    }

    /// Remove whatever point sits at `location`.
    pub fn remove_point_at(&mut self, location: &Location) -> Result<Point, Error> {
        let index = self
            .points
            .iter()
            .position(|p| &p.location == location)
            .ok_or_else(|| Error::NoPointAt {
                channel: self.name.to_string(),
                location: location.clone(),
            })?;
        Ok(self.points.remove(index))
    }

    /// Copy the channel-level fields (state, owners, lock) from `other`,
    /// leaving name and points alone.
    pub fn update_from(&mut self, other: &Channel) {
        self.state = other.state;
        self.owners.clone_from(&other.owners);
        self.locked = other.locked;
    }
}
