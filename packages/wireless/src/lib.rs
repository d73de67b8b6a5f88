//! Wireless redstone: named channels that carry an on/off signal between
//! signs in the world.
//!
//! A transmitter sign turns its channel on or off, and every receiver and
//! screen bound to that channel follows. Channels live in one of two storage
//! backends, picked by the settings file:
//!
//! - one JSON file per channel (the default), via [`wireless_json_store`]
//! - a SQLite database, via [`wireless_sql_store`]
//!
//! # Startup
//!
//! ```rust,ignore
//! use wireless_redstone::{logging, Configuration, SignalEngine, TaskQueue};
//!
//! let config = Configuration::load("plugins/WirelessRedstone")?;
//! let _ = logging::init(config.settings());
//!
//! let mut engine = SignalEngine::new();
//! let door = engine.set_channel_state(&config, "redstone-door", true, &mut world)?;
//! ```
//!
//! [`Configuration::load`] fails with a [`StartupError`] when storage cannot
//! be used at all. Everything after that returns
//! [`wireless_core_store::Error`].

pub mod configuration;
pub mod error;
pub mod logging;
pub mod propagation;
pub mod scheduler;
pub mod settings;
pub mod shared;

pub use configuration::Configuration;
pub use error::{LoggingError, SettingsError, StartupError};
pub use propagation::SignalEngine;
pub use scheduler::{QueueClosed, Task, TaskQueue, TaskSender};
pub use settings::{DataDir, Settings, SettingsFile};
pub use shared::SharedConfiguration;

pub use wireless_core_store::{
    Actuator, BackendKind, Channel, ChannelName, ChannelStore, Error, Location, Orientation,
    Point, PointKind,
};
