use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use wireless_core_store::{
    convert, fold, BackendKind, Channel, ChannelName, ChannelStore, Error, Location, NameError,
    Point, PointKind,
};

const EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "json.tmp";

/// One JSON file per channel, named after the channel key.
///
/// ```text
/// channels/
///     redstone-door.json
///     gate.json
/// ```
///
/// Every write goes to `<key>.json.tmp` first and is renamed over the real
/// file, so a reader never sees half a channel.
pub struct JSONChannelStore {
    root: PathBuf,
    backup_root: PathBuf,
    ready: bool,
}

impl JSONChannelStore {
    /// A store over the channel directory `root`.
    ///
    /// Backups go next to it in `backups/` unless [`with_backup_dir`](Self::with_backup_dir)
    /// says otherwise. Nothing touches the disk until [`ChannelStore::init`].
    pub fn new(root: impl Into<PathBuf>) -> JSONChannelStore {
        let root = root.into();
        let backup_root = root
            .parent()
            .map(|parent| parent.join("backups"))
            .unwrap_or_else(|| PathBuf::from("backups"));
        JSONChannelStore {
            root,
            backup_root,
            ready: false,
        }
    }

    pub fn with_backup_dir(mut self, dir: impl Into<PathBuf>) -> JSONChannelStore {
        self.backup_root = dir.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_ready(&self) -> Result<(), Error> {
        if self.ready {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.{}", key, EXTENSION))
    }

    /// The first character that keeps `key` from being a plain file name.
    fn unsafe_character(key: &str) -> Option<char> {
        key.chars()
            .find(|c| matches!(c, '/' | '\\'))
            .or_else(|| key.starts_with('.').then_some('.'))
    }

    fn check_file_name(name: &ChannelName) -> Result<(), Error> {
        match Self::unsafe_character(name.key()) {
            Some(character) => Err(Error::InvalidName(NameError::ReservedCharacter {
                name: name.to_string(),
                character,
            })),
            None => Ok(()),
        }
    }

    fn channel_files(&self) -> Result<Vec<PathBuf>, Error> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == EXTENSION) {
                files.push(path);
            }
        }
        Ok(files)
    }

    fn read_file(path: &Path) -> Result<Channel, Error> {
        tracing::debug!("Reading {}...", path.display());
        let file = fs::File::open(path)?;
        let mut channel: Channel = serde_json::from_reader(BufReader::new(file))?;

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        if channel.key() != stem {
            return Err(Error::Serialization {
                message: format!(
                    "{} holds channel '{}', which belongs in {}.{}",
                    path.display(),
                    channel.name(),
                    channel.key(),
                    EXTENSION
                ),
            });
        }

        channel.bind_points();
        Ok(channel)
    }

    fn load(&self, name: &str) -> Result<Channel, Error> {
        self.ensure_ready()?;
        let key = fold(name);
        if Self::unsafe_character(&key).is_some() {
            return Err(Error::channel_not_found(name));
        }
        let path = self.file_path(&key);
        match Self::read_file(&path) {
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                Err(Error::channel_not_found(name))
            }
            other => other,
        }
    }

    fn write_channel(&self, channel: &Channel) -> Result<(), Error> {
        let path = self.file_path(channel.key());
        let temp = self.root.join(format!("{}.{}", channel.key(), TEMP_EXTENSION));
        tracing::debug!("Writing {}...", path.display());

        {
            let file = fs::File::create(&temp)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, channel)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }

        fs::rename(&temp, &path).inspect_err(|_| {
            let _ = fs::remove_file(&temp);
        })?;
        Ok(())
    }

    fn remove_stale_temp_files(&self) -> Result<(), Error> {
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            let is_temp = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(TEMP_EXTENSION));
            if is_temp {
                tracing::warn!("Removing unfinished write {}", path.display());
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

impl ChannelStore for JSONChannelStore {
    fn kind(&self) -> BackendKind {
        BackendKind::File
    }

    fn init(&mut self) -> Result<(), Error> {
        fs::create_dir_all(&self.root).map_err(|error| Error::StorageInit {
            message: format!(
                "channel directory ({}) could not be created: {}",
                self.root.display(),
                error
            ),
        })?;

        let attr = fs::metadata(&self.root).map_err(|error| Error::StorageInit {
            message: format!(
                "channel directory ({}) could not be inspected: {}",
                self.root.display(),
                error
            ),
        })?;

        if !attr.is_dir() {
            return Err(Error::StorageInit {
                message: format!("{} must be a directory", self.root.display()),
            });
        }

        if attr.permissions().readonly() {
            return Err(Error::StorageInit {
                message: format!("{} must be writable", self.root.display()),
            });
        }

        self.remove_stale_temp_files()
            .map_err(|error| Error::StorageInit {
                message: format!("channel directory could not be cleaned: {}", error),
            })?;

        self.ready = true;
        tracing::info!("File storage ready at {}", self.root.display());
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        if self.ready {
            tracing::info!("File storage closed");
        }
        self.ready = false;
        Ok(())
    }

    fn get_channel(&self, name: &str) -> Result<Channel, Error> {
        self.load(name)
    }

    fn get_all_channels(&self) -> Result<Vec<Channel>, Error> {
        self.ensure_ready()?;
        let mut channels = Vec::new();
        for path in self.channel_files()? {
            match Self::read_file(&path) {
                Ok(channel) => channels.push(channel),
                Err(Error::Serialization { message }) => {
                    tracing::warn!("Skipping unreadable channel file {}: {}", path.display(), message);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(channels)
    }

    fn export_channels(&self) -> Result<Vec<Channel>, Error> {
        self.ensure_ready()?;
        self.channel_files()?
            .iter()
            .map(|path| {
                Self::read_file(path).map_err(|e| match e {
                    Error::Serialization { message } => Error::Serialization {
                        message: format!("{}: {}", path.display(), message),
                    },
                    other => other,
                })
            })
            .collect()
    }

    fn check_name(&self, name: &ChannelName) -> Result<(), Error> {
        Self::check_file_name(name)
    }

    fn create_channel(&mut self, name: &ChannelName, channel: &Channel) -> Result<(), Error> {
        self.ensure_ready()?;
        Self::check_file_name(name)?;
        if self.file_path(name.key()).exists() {
            return Err(Error::AlreadyExists {
                name: name.to_string(),
            });
        }

        let mut channel = channel.clone();
        channel.set_name(name.clone());
        self.write_channel(&channel)
    }

    fn create_point(&mut self, channel_name: &str, point: Point) -> Result<(), Error> {
        let mut channel = self.load(channel_name)?;
        channel.add_point(point)?;
        self.write_channel(&channel)
    }

    fn update_channel(&mut self, name: &str, channel: &Channel) -> Result<(), Error> {
        let mut stored = self.load(name)?;
        stored.update_from(channel);
        self.write_channel(&stored)
    }

    fn remove_channel(&mut self, name: &str) -> Result<(), Error> {
        self.ensure_ready()?;
        let key = fold(name);
        if Self::unsafe_character(&key).is_some() {
            return Ok(());
        }
        let path = self.file_path(&key);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Removed {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn rename_channel(&mut self, old_name: &str, new_name: &ChannelName) -> Result<(), Error> {
        Self::check_file_name(new_name)?;
        let mut channel = self.load(old_name)?;
        let old_key = channel.key().to_string();

        if old_key != new_name.key() && self.file_path(new_name.key()).exists() {
            return Err(Error::AlreadyExists {
                name: new_name.to_string(),
            });
        }

        channel.set_name(new_name.clone());
        // New file first: a crash before the delete leaves the old one intact.
        self.write_channel(&channel)?;
        if old_key != new_name.key() {
            fs::remove_file(self.file_path(&old_key))?;
        }
        Ok(())
    }

    fn remove_point(
        &mut self,
        channel_name: &str,
        location: &Location,
        kind: PointKind,
    ) -> Result<(), Error> {
        let mut channel = self.load(channel_name)?;
        channel.remove_point(location, kind)?;
        self.write_channel(&channel)
    }

    fn can_convert(&self, target: &dyn ChannelStore) -> bool {
        self.ready && convert::can_convert(self, target)
    }

    fn convert(&mut self, target: &mut dyn ChannelStore) -> Result<(), Error> {
        self.ensure_ready()?;
        convert::convert(self, target)
    }

    fn wipe_data(&mut self) -> Result<(), Error> {
        self.ensure_ready()?;
        let files = self.channel_files()?;
        for path in &files {
            fs::remove_file(path)?;
        }
        tracing::info!("Wiped {} channel file(s)", files.len());
        Ok(())
    }

    fn backup_data(&mut self) -> Result<PathBuf, Error> {
        self.ensure_ready()?;
        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
        let mut destination = self.backup_root.join(format!("channels-{}", stamp));
        let mut suffix = 1;
        while destination.exists() {
            destination = self
                .backup_root
                .join(format!("channels-{}-{}", stamp, suffix));
            suffix += 1;
        }

        fs::create_dir_all(&destination)?;
        for entry in walkdir::WalkDir::new(&self.root).min_depth(1) {
            let entry = entry.map_err(io::Error::from)?;
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(io::Error::other)?;
            let copy = destination.join(relative);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&copy)?;
            } else {
                fs::copy(entry.path(), &copy)?;
            }
        }

        tracing::info!("Backed up channel files to {}", destination.display());
        Ok(destination)
    }
}
