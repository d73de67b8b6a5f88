//! The storage contract every backend implements.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Channel, ChannelName, Error, Location, Point, PointKind};

/// Which physical format a store writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// One JSON file per channel.
    File,
    /// SQLite tables.
    Relational,
}

impl BackendKind {
    /// The format a conversion from this backend writes into.
    pub fn other(&self) -> BackendKind {
        match self {
            BackendKind::File => BackendKind::Relational,
            BackendKind::Relational => BackendKind::File,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::File => f.write_str("file"),
            BackendKind::Relational => f.write_str("relational"),
        }
    }
}

/// Uniform CRUD over channels and their points.
///
/// Names passed as `&str` are looked up case-insensitively. Everything a store
/// returns is a snapshot; re-read after a mutation.
///
/// Implementations are not reentrant. Callers serialize access.
///
/// # Object Safety
///
/// This trait is object-safe: the configuration layer holds a `Box<dyn ChannelStore>`.
pub trait ChannelStore: Send {
    fn kind(&self) -> BackendKind;

    /// Prepare the physical storage. Calling it again is harmless.
    fn init(&mut self) -> Result<(), Error>;

    /// Release handles. Calling it again is harmless.
    fn close(&mut self) -> Result<(), Error>;

    fn get_channel(&self, name: &str) -> Result<Channel, Error>;

    /// Every stored channel, in no particular order.
    fn get_all_channels(&self) -> Result<Vec<Channel>, Error>;

    /// Every stored channel, failing if any one of them cannot be read.
    ///
    /// Conversion reads through this. Stores that skip unreadable entries in
    /// [`get_all_channels`](Self::get_all_channels) must override it.
    fn export_channels(&self) -> Result<Vec<Channel>, Error> {
        self.get_all_channels()
    }

    /// Whether this store can hold a channel called `name`.
    fn check_name(&self, _name: &ChannelName) -> Result<(), Error> {
        Ok(())
    }

    /// Store `channel` under `name`, points included, all at once.
    ///
    /// `name` wins over the name inside `channel`.
    fn create_channel(&mut self, name: &ChannelName, channel: &Channel) -> Result<(), Error>;

    fn create_point(&mut self, channel_name: &str, point: Point) -> Result<(), Error>;

    /// Persist the channel-level fields (state, owners, lock) of `channel`.
    /// Points are left as stored.
    fn update_channel(&mut self, name: &str, channel: &Channel) -> Result<(), Error>;

    /// Delete a channel and its points. Absent channels are ignored.
    fn remove_channel(&mut self, name: &str) -> Result<(), Error>;

    fn rename_channel(&mut self, old_name: &str, new_name: &ChannelName) -> Result<(), Error>;

    fn remove_point(
        &mut self,
        channel_name: &str,
        location: &Location,
        kind: PointKind,
    ) -> Result<(), Error>;

    /// Whether every channel here could be written into `target` without collision.
    fn can_convert(&self, target: &dyn ChannelStore) -> bool;

    /// Move every channel into `target`.
    ///
    /// Either every channel lands in `target` and this store is emptied, or
    /// neither store changes and an [`Error::Conversion`] is returned.
    fn convert(&mut self, target: &mut dyn ChannelStore) -> Result<(), Error>;

    /// Delete everything. Irreversible.
    fn wipe_data(&mut self) -> Result<(), Error>;

    /// Copy the physical store aside and return where the copy went.
    fn backup_data(&mut self) -> Result<PathBuf, Error>;
}

impl<T: ChannelStore + ?Sized> ChannelStore for Box<T> {
    fn kind(&self) -> BackendKind {
        self.as_ref().kind()
    }

    fn init(&mut self) -> Result<(), Error> {
        self.as_mut().init()
    }

    fn close(&mut self) -> Result<(), Error> {
        self.as_mut().close()
    }

    fn get_channel(&self, name: &str) -> Result<Channel, Error> {
        self.as_ref().get_channel(name)
    }

    fn get_all_channels(&self) -> Result<Vec<Channel>, Error> {
        self.as_ref().get_all_channels()
    }

    fn export_channels(&self) -> Result<Vec<Channel>, Error> {
        self.as_ref().export_channels()
    }

    fn check_name(&self, name: &ChannelName) -> Result<(), Error> {
        self.as_ref().check_name(name)
    }

    fn create_channel(&mut self, name: &ChannelName, channel: &Channel) -> Result<(), Error> {
        self.as_mut().create_channel(name, channel)
    }

    fn create_point(&mut self, channel_name: &str, point: Point) -> Result<(), Error> {
        self.as_mut().create_point(channel_name, point)
    }

    fn update_channel(&mut self, name: &str, channel: &Channel) -> Result<(), Error> {
        self.as_mut().update_channel(name, channel)
    }

    fn remove_channel(&mut self, name: &str) -> Result<(), Error> {
        self.as_mut().remove_channel(name)
    }

    fn rename_channel(&mut self, old_name: &str, new_name: &ChannelName) -> Result<(), Error> {
        self.as_mut().rename_channel(old_name, new_name)
    }

    fn remove_point(
        &mut self,
        channel_name: &str,
        location: &Location,
        kind: PointKind,
    ) -> Result<(), Error> {
        self.as_mut().remove_point(channel_name, location, kind)
    }

    fn can_convert(&self, target: &dyn ChannelStore) -> bool {
        self.as_ref().can_convert(target)
    }

    fn convert(&mut self, target: &mut dyn ChannelStore) -> Result<(), Error> {
        self.as_mut().convert(target)
    }

    fn wipe_data(&mut self) -> Result<(), Error> {
        self.as_mut().wipe_data()
    }

    fn backup_data(&mut self) -> Result<PathBuf, Error> {
        self.as_mut().backup_data()
    }
}
