//! Relational channel storage on SQLite.
//!
//! Schema:
//!
//! ```text
//! channels(name TEXT PRIMARY KEY, display_name, state BOOLEAN, owners, locked)
//! points(channel_name -> channels.name, kind, world, x, y, z, orientation, display_text)
//! ```

pub mod migrations;
pub mod sql_store;

pub use migrations::{migrate, CURRENT_SCHEMA_VERSION};
pub use sql_store::SqlChannelStore;
