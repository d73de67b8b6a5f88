//! Moving every channel from one store into another.
//!
//! Both backends implement [`ChannelStore::convert`] on top of these helpers so
//! the all-or-nothing rules are the same whichever direction data flows.

use std::collections::HashSet;

use crate::{Channel, ChannelStore, Error};

/// Collisions that would make a conversion unsafe.
///
/// Returns the keys that appear twice in `channels` or already exist in `target`.
pub fn collisions(channels: &[Channel], target: &dyn ChannelStore) -> Result<Vec<String>, Error> {
    let mut seen = HashSet::new();
    let mut clashing = Vec::new();

    for channel in channels {
        if !seen.insert(channel.key().to_string()) {
            clashing.push(channel.key().to_string());
        }
    }

    for existing in target.get_all_channels()? {
        if seen.contains(existing.key()) {
            clashing.push(existing.key().to_string());
        }
    }

    clashing.sort();
    clashing.dedup();
    Ok(clashing)
}

/// Channels `target` refuses to hold, each with the reason.
pub fn unstorable(channels: &[Channel], target: &dyn ChannelStore) -> Vec<String> {
    channels
        .iter()
        .filter_map(|c| {
            target
                .check_name(c.name())
                .err()
                .map(|e| format!("{} ({})", c.name(), e))
        })
        .collect()
}

/// `source.can_convert(target)` for stores that have no extra preconditions.
pub fn can_convert(source: &dyn ChannelStore, target: &dyn ChannelStore) -> bool {
    if source.kind() == target.kind() {
        return false;
    }
    match source.export_channels() {
        Ok(channels) => {
            unstorable(&channels, target).is_empty()
                && matches!(collisions(&channels, target), Ok(c) if c.is_empty())
        }
        Err(e) => {
            tracing::warn!(error = %e, "{} store cannot be read in full", source.kind());
            false
        }
    }
}

/// Write `channels` into `target`, undoing every write if any one fails.
pub fn copy_into(channels: &[Channel], target: &mut dyn ChannelStore) -> Result<(), Error> {
    let mut written: Vec<&Channel> = Vec::with_capacity(channels.len());

    for channel in channels {
        if let Err(e) = target.create_channel(channel.name(), channel) {
            tracing::warn!(
                channel = %channel.name(),
                error = %e,
                "conversion write failed, rolling back {} channel(s)",
                written.len()
            );
            rollback(&written, target);
            return Err(Error::Conversion {
                message: format!("could not write channel '{}': {}", channel.name(), e),
            });
        }
        written.push(channel);
    }

    Ok(())
}

fn rollback(written: &[&Channel], target: &mut dyn ChannelStore) {
    for channel in written {
        if let Err(e) = target.remove_channel(channel.key()) {
            tracing::warn!(channel = %channel.name(), error = %e, "rollback failed");
        }
    }
}

/// Delete `channels` from `source`, putting them all back if one delete fails.
fn remove_converted(channels: &[Channel], source: &mut dyn ChannelStore) -> Result<(), Error> {
    for (done, channel) in channels.iter().enumerate() {
        if let Err(e) = source.remove_channel(channel.key()) {
            tracing::warn!(
                channel = %channel.name(),
                error = %e,
                "source delete failed, restoring {} channel(s)",
                done
            );
            for removed in &channels[..done] {
                if let Err(e) = source.create_channel(removed.name(), removed) {
                    tracing::warn!(channel = %removed.name(), error = %e, "restore failed");
                }
            }
            return Err(e);
        }
    }
    Ok(())
}

/// The whole conversion: check, back up, copy, then remove the copied
/// channels from `source`.
///
/// `source` is read strictly: one unreadable channel stops the conversion
/// before anything is written.
pub fn convert(source: &mut dyn ChannelStore, target: &mut dyn ChannelStore) -> Result<(), Error> {
    if source.kind() == target.kind() {
        return Err(Error::Conversion {
            message: format!("source and target are both {} stores", source.kind()),
        });
    }

    let channels = source.export_channels().map_err(|e| Error::Conversion {
        message: format!("could not read source store: {}", e),
    })?;

    let refused = unstorable(&channels, target);
    if !refused.is_empty() {
        return Err(Error::Conversion {
            message: format!(
                "{} storage cannot hold: {}",
                target.kind(),
                refused.join(", ")
            ),
        });
    }

    let clashing = collisions(&channels, target).map_err(|e| Error::Conversion {
        message: format!("could not read target store: {}", e),
    })?;
    if !clashing.is_empty() {
        return Err(Error::Conversion {
            message: format!("channel names collide: {}", clashing.join(", ")),
        });
    }

    let backup = source.backup_data().map_err(|e| Error::Conversion {
        message: format!("could not back up source store: {}", e),
    })?;
    tracing::info!(backup = %backup.display(), "backed up {} store", source.kind());

    copy_into(&channels, target)?;

    if let Err(e) = remove_converted(&channels, source) {
        let written: Vec<&Channel> = channels.iter().collect();
        rollback(&written, target);
        return Err(Error::Conversion {
            message: format!("could not clear source store: {}", e),
        });
    }

    tracing::info!(
        "converted {} channel(s) from {} to {} storage",
        channels.len(),
        source.kind(),
        target.kind()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BackendKind, ChannelName, Location, Point, PointKind};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    /// Simple in-memory store for testing.
    struct TestStore {
        kind: BackendKind,
        channels: BTreeMap<String, Channel>,
        fail_on: Option<String>,
        fail_remove: Option<String>,
        refuse: Option<String>,
        unreadable: bool,
        backups: usize,
    }

    impl TestStore {
        fn new(kind: BackendKind) -> Self {
            Self {
                kind,
                channels: BTreeMap::new(),
                fail_on: None,
                fail_remove: None,
                refuse: None,
                unreadable: false,
                backups: 0,
            }
        }

        fn with(mut self, name: &str) -> Self {
            let mut channel = Channel::named(name).unwrap();
            channel
                .add_point(Point::inverted_receiver(Location::new("world", 1, 2, 3)))
                .unwrap();
            self.channels.insert(channel.key().to_string(), channel);
            self
        }
    }

    impl ChannelStore for TestStore {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        fn init(&mut self) -> Result<(), Error> {
            Ok(())
        }

        fn close(&mut self) -> Result<(), Error> {
            Ok(())
        }

        fn get_channel(&self, name: &str) -> Result<Channel, Error> {
            self.channels
                .get(&crate::fold(name))
                .cloned()
                .ok_or_else(|| Error::channel_not_found(name))
        }

        fn get_all_channels(&self) -> Result<Vec<Channel>, Error> {
            Ok(self.channels.values().cloned().collect())
        }

        fn export_channels(&self) -> Result<Vec<Channel>, Error> {
            if self.unreadable {
                return Err(Error::Serialization {
                    message: "corrupt entry".to_string(),
                });
            }
            self.get_all_channels()
        }

        fn check_name(&self, name: &ChannelName) -> Result<(), Error> {
            if self.refuse.as_deref() == Some(name.key()) {
                return Err(Error::InvalidName(crate::NameError::ReservedCharacter {
                    name: name.to_string(),
                    character: '.',
                }));
            }
            Ok(())
        }

        fn create_channel(&mut self, name: &ChannelName, channel: &Channel) -> Result<(), Error> {
            if self.fail_on.as_deref() == Some(name.key()) {
                return Err(Error::Io(std::io::Error::other("disk full")));
            }
            if self.channels.contains_key(name.key()) {
                return Err(Error::AlreadyExists {
                    name: name.to_string(),
                });
            }
            let mut channel = channel.clone();
            channel.set_name(name.clone());
            self.channels.insert(name.key().to_string(), channel);
            Ok(())
        }

        fn create_point(&mut self, channel_name: &str, point: Point) -> Result<(), Error> {
            self.channels
                .get_mut(&crate::fold(channel_name))
                .ok_or_else(|| Error::channel_not_found(channel_name))?
                .add_point(point)
        }

        fn update_channel(&mut self, name: &str, channel: &Channel) -> Result<(), Error> {
            self.channels
                .get_mut(&crate::fold(name))
                .ok_or_else(|| Error::channel_not_found(name))?
                .update_from(channel);
            Ok(())
        }

        fn remove_channel(&mut self, name: &str) -> Result<(), Error> {
            if self.fail_remove.as_deref() == Some(crate::fold(name).as_str()) {
                return Err(Error::Io(std::io::Error::other("permission denied")));
            }
            self.channels.remove(&crate::fold(name));
            Ok(())
        }

        fn rename_channel(&mut self, old_name: &str, new_name: &ChannelName) -> Result<(), Error> {
            let mut channel = self
                .channels
                .remove(&crate::fold(old_name))
                .ok_or_else(|| Error::channel_not_found(old_name))?;
            channel.set_name(new_name.clone());
            self.channels.insert(new_name.key().to_string(), channel);
            Ok(())
        }

        fn remove_point(
            &mut self,
            channel_name: &str,
            location: &Location,
            kind: PointKind,
        ) -> Result<(), Error> {
            self.channels
                .get_mut(&crate::fold(channel_name))
                .ok_or_else(|| Error::channel_not_found(channel_name))?
                .remove_point(location, kind)
                .map(|_| ())
        }

        fn can_convert(&self, target: &dyn ChannelStore) -> bool {
            can_convert(self, target)
        }

        fn convert(&mut self, target: &mut dyn ChannelStore) -> Result<(), Error> {
            convert(self, target)
        }

        fn wipe_data(&mut self) -> Result<(), Error> {
            self.channels.clear();
            Ok(())
        }

        fn backup_data(&mut self) -> Result<PathBuf, Error> {
            self.backups += 1;
            Ok(PathBuf::from(format!("backup-{}", self.backups)))
        }
    }

    #[test]
    fn convert_moves_everything() {
        let mut source = TestStore::new(BackendKind::File).with("a").with("b");
        let mut target = TestStore::new(BackendKind::Relational);

        assert!(source.can_convert(&target));
        source.convert(&mut target).unwrap();

        assert!(source.channels.is_empty());
        assert_eq!(source.backups, 1);
        assert_eq!(target.channels.len(), 2);
        assert_eq!(
            target.get_channel("A").unwrap().points()[0].kind,
            PointKind::InvertedReceiver
        );
    }

    #[test]
    fn collision_blocks_conversion() {
        let mut source = TestStore::new(BackendKind::File).with("a").with("b");
        let mut target = TestStore::new(BackendKind::Relational).with("B");

        assert!(!source.can_convert(&target));
        let err = source.convert(&mut target).unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));
        assert_eq!(source.channels.len(), 2);
        assert_eq!(target.channels.len(), 1);
        assert_eq!(source.backups, 0);
    }

    #[test]
    fn failed_write_rolls_back() {
        let mut source = TestStore::new(BackendKind::File)
            .with("a")
            .with("b")
            .with("c");
        let mut target = TestStore::new(BackendKind::Relational);
        target.fail_on = Some("c".to_string());

        let err = source.convert(&mut target).unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));
        assert!(target.channels.is_empty());
        assert_eq!(source.channels.len(), 3);
    }

    #[test]
    fn failed_source_delete_restores_both_stores() {
        let mut source = TestStore::new(BackendKind::File)
            .with("a")
            .with("b")
            .with("c");
        source.fail_remove = Some("b".to_string());
        let mut target = TestStore::new(BackendKind::Relational);

        let err = source.convert(&mut target).unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));
        assert_eq!(source.channels.len(), 3);
        assert_eq!(
            source.get_channel("a").unwrap().points()[0].kind,
            PointKind::InvertedReceiver
        );
        assert!(target.channels.is_empty());
    }

    #[test]
    fn unreadable_source_blocks_conversion() {
        let mut source = TestStore::new(BackendKind::File).with("a");
        source.unreadable = true;
        let mut target = TestStore::new(BackendKind::Relational);

        assert!(!source.can_convert(&target));
        assert!(source.convert(&mut target).is_err());
        assert_eq!(source.channels.len(), 1);
        assert_eq!(source.backups, 0);
        assert!(target.channels.is_empty());
    }

    #[test]
    fn name_the_target_refuses_blocks_conversion() {
        let mut source = TestStore::new(BackendKind::Relational).with("a").with("b");
        let mut target = TestStore::new(BackendKind::File);
        target.refuse = Some("b".to_string());

        assert!(!source.can_convert(&target));
        let err = source.convert(&mut target).unwrap_err();
        assert!(err.to_string().contains("cannot hold"));
        assert_eq!(source.channels.len(), 2);
        assert_eq!(source.backups, 0);
        assert!(target.channels.is_empty());
    }

    #[test]
    fn same_kind_is_not_convertible() {
        let mut source = TestStore::new(BackendKind::File).with("a");
        let mut target = TestStore::new(BackendKind::File);
        assert!(!source.can_convert(&target));
        assert!(source.convert(&mut target).is_err());
    }

    #[test]
    fn collisions_reports_sorted_keys() {
        let channels = vec![
            Channel::named("Zed").unwrap(),
            Channel::named("zed").unwrap(),
            Channel::named("amy").unwrap(),
        ];
        let target = TestStore::new(BackendKind::Relational).with("AMY");
        assert_eq!(collisions(&channels, &target).unwrap(), vec!["amy", "zed"]);
    }
}
