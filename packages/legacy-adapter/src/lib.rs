//! Migration from the legacy single-section channel layout.
//!
//! Old installations kept every channel inside one `wireless_channels` section
//! of the main config file. This crate reads that section and writes each
//! channel through a [`ChannelStore`](wireless_core_store::ChannelStore),
//! normally the per-channel file store.
//!
//! # Usage
//!
//! ```rust,ignore
//! use wireless_legacy_adapter::migrate_section;
//!
//! if let Some(section) = settings_file.wireless_channels.as_ref() {
//!     migrate_section(section, &mut file_store, &settings.bad_characters)?;
//!     settings_file.wireless_channels = None;
//!     settings_file.save(&path)?;
//! }
//! ```
//!
//! The caller clears the section only after [`migrate_section`] returns `Ok`,
//! so an interrupted run simply happens again on the next startup. Channels
//! already present in the target are left alone, which makes the rerun safe.

mod error;
mod migrate;
mod section;

pub use error::Error;
pub use migrate::{migrate_section, MigrationReport};
pub use section::{LegacyChannel, LegacyPoint, LegacySection};
