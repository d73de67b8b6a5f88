//! Writing a legacy section into a channel store.

use wireless_core_store::{convert, Channel, ChannelStore};

use crate::section::{LegacyChannel, LegacySection};
use crate::Error;

/// What a migration run did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Channels written to the target.
    pub migrated: Vec<String>,
    /// Channels the target already had, most likely from an interrupted run.
    pub skipped: Vec<String>,
}

/// Write every channel of a legacy section into `target`.
///
/// Every entry is read and validated before anything is written, and the
/// writes themselves are all-or-nothing. Channels `target` already holds are
/// skipped rather than overwritten.
pub fn migrate_section(
    section: &LegacySection,
    target: &mut dyn ChannelStore,
    bad_characters: &[char],
) -> Result<MigrationReport, Error> {
    tracing::info!("Migrating {} legacy channel(s)...", section.len());

    let mut channels: Vec<Channel> = Vec::with_capacity(section.len());
    for (name, value) in section {
        let channel = LegacyChannel::from_entry(name, value)?.into_channel(name, bad_characters)?;
        if let Some(earlier) = channels.iter().find(|c| c.key() == channel.key()) {
            return Err(Error::InvalidEntry {
                name: name.clone(),
                message: format!("same channel as '{}'", earlier.name()),
            });
        }
        channels.push(channel);
    }

    let mut report = MigrationReport::default();
    let mut pending = Vec::with_capacity(channels.len());
    for channel in channels {
        match target.get_channel(channel.key()) {
            Ok(_) => {
                tracing::warn!(channel = %channel.name(), "already migrated, skipping");
                report.skipped.push(channel.name().to_string());
            }
            Err(e) if e.is_not_found() => pending.push(channel),
            Err(e) => return Err(e.into()),
        }
    }

    convert::copy_into(&pending, target)?;
    report.migrated = pending.iter().map(|c| c.name().to_string()).collect();

    tracing::info!(
        migrated = report.migrated.len(),
        skipped = report.skipped.len(),
        "Legacy migration finished"
    );
    Ok(report)
}
