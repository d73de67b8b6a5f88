//! The configuration facade: one storage backend, chosen at startup.

use std::path::{Path, PathBuf};

use wireless_core_store::{
    BackendKind, Channel, ChannelName, ChannelStore, Error, Location, Point, PointKind,
};
use wireless_json_store::JSONChannelStore;
use wireless_legacy_adapter::migrate_section;
use wireless_sql_store::SqlChannelStore;

use crate::error::StartupError;
use crate::settings::{DataDir, Settings, SettingsFile};

/// Routes every channel operation to the backend the settings select.
///
/// Names coming in as `&str` are looked up case-insensitively. Names that
/// create something new are checked against
/// [`Settings::bad_characters`] first.
pub struct Configuration {
    data: DataDir,
    file: SettingsFile,
    store: Box<dyn ChannelStore>,
}

impl Configuration {
    /// Read the settings under `data_dir`, migrate any legacy channels and
    /// open the selected backend.
    pub fn load(data_dir: impl Into<PathBuf>) -> Result<Self, StartupError> {
        let data = DataDir::new(data_dir);
        let mut file = SettingsFile::load(&data.config_file())?;

        if file.wireless_channels.is_some() {
            Self::migrate_legacy(&data, &mut file)?;
        }

        let kind = if file.settings.use_relational_backend {
            BackendKind::Relational
        } else {
            BackendKind::File
        };
        let mut store = build_store(&data, &file.settings, kind);
        store.init().map_err(StartupError::StorageInit)?;
        tracing::info!("Channel storage: {}", kind);

        Ok(Self { data, file, store })
    }

    /// Move the legacy section into channel files, then drop it from the
    /// settings file.
    fn migrate_legacy(data: &DataDir, file: &mut SettingsFile) -> Result<(), StartupError> {
        if !file.has_legacy_channels() {
            tracing::debug!("Clearing empty legacy channel section");
        } else if let Some(section) = &file.wireless_channels {
            tracing::info!("Found legacy channel section, migrating to {}", data.channel_dir().display());
            let mut files = JSONChannelStore::new(data.channel_dir()).with_backup_dir(data.backup_dir());
            files.init().map_err(StartupError::StorageInit)?;
            migrate_section(section, &mut files, &file.settings.bad_characters)?;
            files.close().map_err(StartupError::StorageInit)?;
        }

        file.wireless_channels = None;
        file.save(&data.config_file())?;
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.file.settings
    }

    pub fn data_dir(&self) -> &Path {
        self.data.root()
    }

    pub fn backend(&self) -> BackendKind {
        self.store.kind()
    }

    /// Validate a new channel name against the configured reserved characters.
    pub fn parse_name(&self, raw: &str) -> Result<ChannelName, Error> {
        Ok(ChannelName::parse_with(raw, &self.file.settings.bad_characters)?)
    }

    pub fn close(&mut self) -> Result<(), Error> {
        self.store.close()
    }

    pub fn get_channel(&self, name: &str) -> Result<Channel, Error> {
        self.store.get_channel(name)
    }

    pub fn get_all_channels(&self) -> Result<Vec<Channel>, Error> {
        self.store.get_all_channels()
    }

    pub fn create_channel(&mut self, name: &str, channel: &Channel) -> Result<(), Error> {
        let name = self.parse_name(name)?;
        self.store.create_channel(&name, channel)
    }

    pub fn create_point(&mut self, channel_name: &str, point: Point) -> Result<(), Error> {
        self.store.create_point(channel_name, point)
    }

    pub fn update_channel(&mut self, name: &str, channel: &Channel) -> Result<(), Error> {
        self.store.update_channel(name, channel)
    }

    /// Persist `state` as the channel's durable state.
    pub fn save_channel_state(&mut self, name: &str, state: bool) -> Result<(), Error> {
        let mut channel = self.store.get_channel(name)?;
        channel.set_state(state);
        self.store.update_channel(name, &channel)
    }

    pub fn remove_channel(&mut self, name: &str) -> Result<(), Error> {
        self.store.remove_channel(name)
    }

    pub fn rename_channel(&mut self, old_name: &str, new_name: &str) -> Result<(), Error> {
        let new_name = self.parse_name(new_name)?;
        self.store.rename_channel(old_name, &new_name)
    }

    pub fn remove_point(
        &mut self,
        channel_name: &str,
        location: &Location,
        kind: PointKind,
    ) -> Result<(), Error> {
        self.store.remove_point(channel_name, location, kind)
    }

    pub fn remove_transmitter(&mut self, channel_name: &str, location: &Location) -> Result<(), Error> {
        self.remove_point(channel_name, location, PointKind::Transmitter)
    }

    /// Remove the receiver at `location`, inverted or not.
    pub fn remove_receiver(&mut self, channel_name: &str, location: &Location) -> Result<(), Error> {
        let channel = self.store.get_channel(channel_name)?;
        let kind = channel
            .point_at(location)
            .map(|p| p.kind)
            .filter(PointKind::is_receiver)
            .unwrap_or(PointKind::Receiver);
        self.remove_point(channel_name, location, kind)
    }

    pub fn remove_screen(&mut self, channel_name: &str, location: &Location) -> Result<(), Error> {
        self.remove_point(channel_name, location, PointKind::Screen)
    }

    /// Whether every channel could move to the other backend right now.
    pub fn can_convert(&self) -> bool {
        let mut target = build_store(&self.data, &self.file.settings, self.backend().other());
        if let Err(e) = target.init() {
            tracing::warn!("{} storage is not reachable: {}", target.kind(), e);
            return false;
        }
        let ok = self.store.can_convert(target.as_ref());
        let _ = target.close();
        ok
    }

    /// Move every channel to the other backend and make it the active one.
    ///
    /// The settings file is updated so the next startup opens the new backend.
    pub fn convert(&mut self) -> Result<(), Error> {
        let mut target = build_store(&self.data, &self.file.settings, self.backend().other());
        target.init().map_err(|e| Error::Conversion {
            message: format!("{} storage could not be opened: {}", target.kind(), e),
        })?;

        self.store.convert(target.as_mut())?;

        let mut previous = std::mem::replace(&mut self.store, target);
        if let Err(e) = previous.close() {
            tracing::warn!("closing {} storage failed: {}", previous.kind(), e);
        }

        self.file.settings.use_relational_backend = self.store.kind() == BackendKind::Relational;
        self.file
            .save(&self.data.config_file())
            .map_err(|e| Error::Conversion {
                message: format!(
                    "channels now live in {} storage but the setting could not be saved: {}",
                    self.store.kind(),
                    e
                ),
            })
    }

    pub fn wipe_data(&mut self) -> Result<(), Error> {
        self.store.wipe_data()
    }

    pub fn backup_data(&mut self) -> Result<PathBuf, Error> {
        self.store.backup_data()
    }
}

fn build_store(data: &DataDir, settings: &Settings, kind: BackendKind) -> Box<dyn ChannelStore> {
    match kind {
        BackendKind::File => Box::new(
            JSONChannelStore::new(data.channel_dir()).with_backup_dir(data.backup_dir()),
        ),
        BackendKind::Relational => Box::new(
            SqlChannelStore::new(data.database(settings)).with_backup_dir(data.backup_dir()),
        ),
    }
}
