//! File-backed channel storage: one JSON document per channel.

pub mod local_disk;

pub use local_disk::JSONChannelStore;
pub use wireless_core_store::{ChannelStore, Error};
