mod common;

use std::fs;

use common::at;
use serde_json::json;
use wireless_redstone::{BackendKind, Channel, ChannelStore, Configuration, Error, Point};
use wireless_sql_store::SqlChannelStore;

fn file_config(dir: &tempfile::TempDir) -> Configuration {
    let mut config = Configuration::load(dir.path()).unwrap();
    let mut door = Channel::named("door").unwrap();
    door.add_point(Point::transmitter(at(1))).unwrap();
    door.add_point(Point::inverted_receiver(at(2))).unwrap();
    config.create_channel("door", &door).unwrap();
    config
        .create_channel("gate", &Channel::named("gate").unwrap())
        .unwrap();
    config
}

fn sql_channels(dir: &tempfile::TempDir) -> Vec<Channel> {
    let mut sql = SqlChannelStore::new(dir.path().join("channels.db"));
    sql.init().unwrap();
    let channels = sql.get_all_channels().unwrap();
    sql.close().unwrap();
    channels
}

#[test]
fn unreadable_channel_file_stops_conversion() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = file_config(&dir);
    let broken = dir.path().join("channels").join("lamp.json");
    fs::write(
        &broken,
        json!({
            "name": "lamp",
            "points": [{ "kind": "bogus", "world": "world", "x": 0, "y": 64, "z": 10 }]
        })
        .to_string(),
    )
    .unwrap();

    assert!(!config.can_convert());
    let err = config.convert().unwrap_err();
    assert!(matches!(err, Error::Conversion { .. }));

    assert_eq!(config.backend(), BackendKind::File);
    assert!(!config.settings().use_relational_backend);
    assert!(broken.is_file());
    assert_eq!(config.get_all_channels().unwrap().len(), 2);
    assert_eq!(config.get_channel("door").unwrap().points().len(), 2);
    assert!(sql_channels(&dir).is_empty());
    assert!(!dir.path().join("backups").exists());
}

#[test]
fn colliding_target_leaves_both_stores_alone() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = file_config(&dir);
    {
        let mut sql = SqlChannelStore::new(dir.path().join("channels.db"));
        sql.init().unwrap();
        let gate = Channel::named("GATE").unwrap();
        sql.create_channel(gate.name(), &gate).unwrap();
        sql.close().unwrap();
    }

    assert!(!config.can_convert());
    let err = config.convert().unwrap_err();
    assert!(err.to_string().contains("gate"));

    assert_eq!(config.backend(), BackendKind::File);
    assert_eq!(config.get_all_channels().unwrap().len(), 2);
    assert!(dir.path().join("channels/door.json").is_file());

    let sql = sql_channels(&dir);
    assert_eq!(sql.len(), 1);
    assert_eq!(sql[0].name().as_str(), "GATE");
}

#[test]
fn name_the_file_store_cannot_hold_stops_conversion() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("config.json"),
        json!({ "use_relational_backend": true, "bad_characters": [] }).to_string(),
    )
    .unwrap();
    let mut config = Configuration::load(dir.path()).unwrap();
    config
        .create_channel("door", &Channel::named("door").unwrap())
        .unwrap();
    config
        .create_channel(".hidden", &Channel::named("door").unwrap())
        .unwrap();

    assert!(!config.can_convert());
    assert!(matches!(config.convert(), Err(Error::Conversion { .. })));

    assert_eq!(config.backend(), BackendKind::Relational);
    assert_eq!(config.get_all_channels().unwrap().len(), 2);
    assert!(dir
        .path()
        .join("channels")
        .read_dir()
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(true));
}
