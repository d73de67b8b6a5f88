//! Core wireless store: the channel model and the storage contract.
//!
//! This layer defines what every backend agrees on:
//! - `ChannelName`: validated name with a case-folded key
//! - `Point`: an endpoint of one `PointKind`, reacting to channel state
//! - `Channel`: a name, its points and its last known state
//! - `ChannelStore`: uniform CRUD, conversion, backup and wipe
//!
//! Backends live in their own crates (`wireless-json-store`,
//! `wireless-sql-store`).
//!
//! # Example
//!
//! ```rust
//! use wireless_core_store::{ChannelStore, Error};
//!
//! fn receivers_of(store: &dyn ChannelStore, name: &str) -> Result<usize, Error> {
//!     let channel = store.get_channel(name)?;
//!     Ok(channel.points().iter().filter(|p| p.kind.is_receiver()).count())
//! }
//! ```

mod channel;
pub mod convert;
mod error;
mod location;
mod name;
mod point;
mod traits;

pub use channel::Channel;
pub use error::Error;
pub use location::{Location, Orientation, UnknownOrientation};
pub use name::{fold, ChannelName, NameError, DEFAULT_BAD_CHARACTERS};
pub use point::{
    Actuator, Point, PointKind, UnknownPointKind, INVERTER_TAG, RECEIVER_TAG, SCREEN_OFF,
    SCREEN_ON, SCREEN_TAG, TRANSMITTER_TAG,
};
pub use traits::{BackendKind, ChannelStore};
