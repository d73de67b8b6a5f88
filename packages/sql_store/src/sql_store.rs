//! SQLite-backed channel store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use wireless_core_store::{
    convert, fold, BackendKind, Channel, ChannelName, ChannelStore, Error, Location, Orientation,
    Point, PointKind,
};

use crate::migrations;

const POINT_COLUMNS: &str = "channel_name, kind, world, x, y, z, orientation, display_text";

/// Turns SQLite failures into store errors.
trait SqlResultExt<T> {
    fn db(self) -> Result<T, Error>;
}

impl<T> SqlResultExt<T> for Result<T, rusqlite::Error> {
    fn db(self) -> Result<T, Error> {
        self.map_err(|e| Error::Database {
            message: e.to_string(),
        })
    }
}

/// Channels and points in two SQLite tables.
///
/// `channels.name` holds the case-folded key and `display_name` the name as
/// typed. Points reference their channel by key with `ON UPDATE CASCADE`, so a
/// rename is a single `UPDATE` inside a transaction.
pub struct SqlChannelStore {
    path: PathBuf,
    backup_root: PathBuf,
    conn: Option<Connection>,
}

impl SqlChannelStore {
    /// A store over the database file at `path`, opened by [`ChannelStore::init`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let backup_root = path
            .parent()
            .map(|parent| parent.join("backups"))
            .unwrap_or_else(|| PathBuf::from("backups"));
        Self {
            path,
            backup_root,
            conn: None,
        }
    }

    /// A store that lives only as long as its connection.
    pub fn memory() -> Self {
        Self::new(":memory:")
    }

    pub fn with_backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_root = dir.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<&Connection, Error> {
        self.conn.as_ref().ok_or(Error::NotInitialized)
    }

    fn point_from_row(row: &Row) -> Result<(String, Point), rusqlite::Error> {
        let channel: String = row.get(0)?;
        let kind_text: String = row.get(1)?;
        let kind: PointKind = kind_text
            .parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
        let orientation_text: String = row.get(6)?;
        let orientation: Orientation = orientation_text
            .parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;

        let mut point = Point::new(
            kind,
            Location::new(row.get::<_, String>(2)?, row.get(3)?, row.get(4)?, row.get(5)?),
            orientation,
        );
        point.display_text = row.get(7)?;
        Ok((channel, point))
    }

    fn channel_from_row(row: &Row) -> Result<(String, Channel), rusqlite::Error> {
        let key: String = row.get(0)?;
        let display: String = row.get(1)?;
        let name = ChannelName::parse_with(&display, &[])
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
        let owners_text: String = row.get(3)?;
        let owners: Vec<String> = serde_json::from_str(&owners_text)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

        let mut channel = Channel::new(name);
        channel.set_state(row.get(2)?);
        channel.set_locked(row.get(4)?);
        for owner in owners {
            channel.add_owner(owner);
        }
        Ok((key, channel))
    }

    fn insert_point(conn: &Connection, key: &str, point: &Point) -> Result<(), Error> {
        conn.execute(
            &format!(
                "INSERT INTO points ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                POINT_COLUMNS
            ),
            params![
                key,
                point.kind.as_str(),
                &point.location.world,
                point.location.x,
                point.location.y,
                point.location.z,
                point.orientation.as_str(),
                &point.display_text,
            ],
        )
        .db()?;
        Ok(())
    }

    fn display_name(conn: &Connection, key: &str) -> Result<Option<String>, Error> {
        conn.query_row(
            "SELECT display_name FROM channels WHERE name = ?",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .db()
    }

    fn location_taken(conn: &Connection, key: &str, location: &Location) -> Result<bool, Error> {
        conn.query_row(
            "SELECT 1 FROM points WHERE channel_name = ? AND world = ? AND x = ? AND y = ? AND z = ?",
            params![key, &location.world, location.x, location.y, location.z],
            |_| Ok(()),
        )
        .optional()
        .db()
        .map(|found| found.is_some())
    }

    fn owners_json(channel: &Channel) -> Result<String, Error> {
        Ok(serde_json::to_string(channel.owners())?)
    }
}

impl ChannelStore for SqlChannelStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Relational
    }

    fn init(&mut self) -> Result<(), Error> {
        if self.conn.is_some() {
            return Ok(());
        }

        let conn = Connection::open(&self.path).map_err(|e| Error::StorageInit {
            message: format!("database ({}) could not be opened: {}", self.path.display(), e),
        })?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .and_then(|_| migrations::migrate(&conn))
            .map_err(|e| Error::StorageInit {
                message: format!("database ({}) could not be migrated: {}", self.path.display(), e),
            })?;

        self.conn = Some(conn);
        tracing::info!("Relational storage ready at {}", self.path.display());
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| Error::Database {
                message: e.to_string(),
            })?;
            tracing::info!("Relational storage closed");
        }
        Ok(())
    }

    fn get_channel(&self, name: &str) -> Result<Channel, Error> {
        let conn = self.conn()?;
        let key = fold(name);

        let (_, mut channel) = conn
            .query_row(
                "SELECT name, display_name, state, owners, locked FROM channels WHERE name = ?",
                params![&key],
                Self::channel_from_row,
            )
            .optional()
            .db()?
            .ok_or_else(|| Error::channel_not_found(name))?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM points WHERE channel_name = ? ORDER BY rowid",
                POINT_COLUMNS
            ))
            .db()?;
        let points = stmt
            .query_map(params![&key], Self::point_from_row)
            .db()?
            .collect::<Result<Vec<_>, rusqlite::Error>>()
            .db()?;

        for (_, point) in points {
            channel.add_point(point)?;
        }
        tracing::debug!("Loaded channel {} ({} points)", key, channel.points().len());
        Ok(channel)
    }

    fn get_all_channels(&self) -> Result<Vec<Channel>, Error> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT name, display_name, state, owners, locked FROM channels")
            .db()?;
        let mut channels = stmt
            .query_map([], Self::channel_from_row)
            .db()?
            .collect::<Result<HashMap<String, Channel>, rusqlite::Error>>()
            .db()?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM points ORDER BY rowid",
                POINT_COLUMNS
            ))
            .db()?;
        let points = stmt
            .query_map([], Self::point_from_row)
            .db()?
            .collect::<Result<Vec<_>, rusqlite::Error>>()
            .db()?;

        for (key, point) in points {
            match channels.get_mut(&key) {
                Some(channel) => channel.add_point(point)?,
                None => tracing::warn!("Point at {} references missing channel {}", point.location, key),
            }
        }

        Ok(channels.into_values().collect())
    }

    fn create_channel(&mut self, name: &ChannelName, channel: &Channel) -> Result<(), Error> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction().db()?;

        if Self::display_name(&tx, name.key())?.is_some() {
            return Err(Error::AlreadyExists {
                name: name.to_string(),
            });
        }

        tx.execute(
            "INSERT INTO channels (name, display_name, state, owners, locked) VALUES (?, ?, ?, ?, ?)",
            params![
                name.key(),
                name.as_str(),
                channel.state(),
                Self::owners_json(channel)?,
                channel.is_locked(),
            ],
        )
        .db()?;

        for point in channel.points() {
            if Self::location_taken(&tx, name.key(), &point.location)? {
                return Err(Error::DuplicateLocation {
                    channel: name.to_string(),
                    location: point.location.clone(),
                });
            }
            Self::insert_point(&tx, name.key(), point)?;
        }

        tx.commit().db()?;
        tracing::debug!("Created channel {} ({} points)", name.key(), channel.points().len());
        Ok(())
    }

    fn create_point(&mut self, channel_name: &str, point: Point) -> Result<(), Error> {
        let conn = self.conn()?;
        let key = fold(channel_name);
        let tx = conn.unchecked_transaction().db()?;

        let display = Self::display_name(&tx, &key)?
            .ok_or_else(|| Error::channel_not_found(channel_name))?;
        if Self::location_taken(&tx, &key, &point.location)? {
            return Err(Error::DuplicateLocation {
                channel: display,
                location: point.location,
            });
        }

        Self::insert_point(&tx, &key, &point)?;
        tx.commit().db()
    }

    fn update_channel(&mut self, name: &str, channel: &Channel) -> Result<(), Error> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE channels SET state = ?, owners = ?, locked = ? WHERE name = ?",
                params![
                    channel.state(),
                    Self::owners_json(channel)?,
                    channel.is_locked(),
                    fold(name),
                ],
            )
            .db()?;

        if changed == 0 {
            return Err(Error::channel_not_found(name));
        }
        Ok(())
    }

    fn remove_channel(&mut self, name: &str) -> Result<(), Error> {
        let conn = self.conn()?;
        let key = fold(name);
        let tx = conn.unchecked_transaction().db()?;
        tx.execute("DELETE FROM points WHERE channel_name = ?", params![&key])
            .db()?;
        tx.execute("DELETE FROM channels WHERE name = ?", params![&key])
            .db()?;
        tx.commit().db()
    }

    fn rename_channel(&mut self, old_name: &str, new_name: &ChannelName) -> Result<(), Error> {
        let conn = self.conn()?;
        let old_key = fold(old_name);
        let tx = conn.unchecked_transaction().db()?;

        if Self::display_name(&tx, &old_key)?.is_none() {
            return Err(Error::channel_not_found(old_name));
        }
        if old_key != new_name.key() && Self::display_name(&tx, new_name.key())?.is_some() {
            return Err(Error::AlreadyExists {
                name: new_name.to_string(),
            });
        }

        // Points follow through ON UPDATE CASCADE.
        tx.execute(
            "UPDATE channels SET name = ?, display_name = ? WHERE name = ?",
            params![new_name.key(), new_name.as_str(), &old_key],
        )
        .db()?;
        tx.commit().db()?;
        tracing::debug!("Renamed channel {} to {}", old_key, new_name.key());
        Ok(())
    }

    fn remove_point(
        &mut self,
        channel_name: &str,
        location: &Location,
        kind: PointKind,
    ) -> Result<(), Error> {
        let conn = self.conn()?;
        let key = fold(channel_name);

        let display = Self::display_name(conn, &key)?
            .ok_or_else(|| Error::channel_not_found(channel_name))?;

        let removed = conn
            .execute(
                "DELETE FROM points
                 WHERE channel_name = ? AND kind = ? AND world = ? AND x = ? AND y = ? AND z = ?",
                params![
                    &key,
                    kind.as_str(),
                    &location.world,
                    location.x,
                    location.y,
                    location.z
                ],
            )
            .db()?;

        if removed == 0 {
            return Err(Error::PointNotFound {
                channel: display,
                location: location.clone(),
                kind,
            });
        }
        Ok(())
    }

    fn can_convert(&self, target: &dyn ChannelStore) -> bool {
        let reachable = self
            .conn()
            .and_then(|conn| conn.query_row("SELECT 1", [], |_| Ok(())).db())
            .is_ok();
        reachable && convert::can_convert(self, target)
    }

    fn convert(&mut self, target: &mut dyn ChannelStore) -> Result<(), Error> {
        self.conn()?;
        convert::convert(self, target)
    }

    fn wipe_data(&mut self) -> Result<(), Error> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction().db()?;
        tx.execute("DELETE FROM points", []).db()?;
        let removed = tx.execute("DELETE FROM channels", []).db()?;
        tx.commit().db()?;
        tracing::info!("Wiped {} channel(s)", removed);
        Ok(())
    }

    fn backup_data(&mut self) -> Result<PathBuf, Error> {
        let conn = self.conn()?;
        std::fs::create_dir_all(&self.backup_root)?;

        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
        let mut destination = self.backup_root.join(format!("channels-{}.db", stamp));
        let mut suffix = 1;
        while destination.exists() {
            destination = self
                .backup_root
                .join(format!("channels-{}-{}.db", stamp, suffix));
            suffix += 1;
        }

        conn.execute(
            "VACUUM INTO ?",
            params![destination.to_string_lossy().as_ref()],
        )
        .db()?;
        tracing::info!("Backed up database to {}", destination.display());
        Ok(destination)
    }
}
