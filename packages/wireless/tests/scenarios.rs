mod common;

use std::fs;

use common::{at, World};
use serde_json::json;
use wireless_redstone::{
    BackendKind, Channel, Configuration, Error, Point, PointKind, SettingsFile, SignalEngine,
};

fn door_config(dir: &tempfile::TempDir) -> Configuration {
    let mut config = Configuration::load(dir.path()).unwrap();
    config
        .create_channel("redstone-door", &Channel::named("redstone-door").unwrap())
        .unwrap();
    config
        .create_point("redstone-door", Point::transmitter(at(10)))
        .unwrap();
    config
        .create_point("redstone-door", Point::receiver(at(12)))
        .unwrap();
    config
        .create_point("redstone-door", Point::inverted_receiver(at(14)))
        .unwrap();
    config
}

#[test]
fn redstone_door_opens() {
    let dir = tempfile::tempdir().unwrap();
    let config = door_config(&dir);
    let mut engine = SignalEngine::new();
    let mut world = World::default();

    engine
        .set_channel_state(&config, "redstone-door", true, &mut world)
        .unwrap();

    assert!(world.powered[&at(12)]);
    assert!(!world.powered[&at(14)]);
    assert!(!world.powered.contains_key(&at(10)));
    assert_eq!(engine.state("Redstone-Door"), Some(true));
}

#[test]
fn setting_the_same_state_twice_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = door_config(&dir);
    let mut engine = SignalEngine::new();

    let mut once = World::default();
    engine
        .set_channel_state(&config, "redstone-door", true, &mut once)
        .unwrap();

    let mut twice = World::default();
    engine
        .set_channel_state(&config, "redstone-door", true, &mut twice)
        .unwrap();
    engine
        .set_channel_state(&config, "redstone-door", true, &mut twice)
        .unwrap();

    assert_eq!(once.powered, twice.powered);
    assert_eq!(once.signs, twice.signs);
}

#[test]
fn live_state_is_not_saved_until_asked() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = door_config(&dir);
    let mut engine = SignalEngine::new();
    let mut world = World::default();

    engine
        .set_channel_state(&config, "redstone-door", true, &mut world)
        .unwrap();
    assert!(!config.get_channel("redstone-door").unwrap().state());

    engine.save(&mut config, "redstone-door").unwrap();
    config.close().unwrap();

    let reopened = Configuration::load(dir.path()).unwrap();
    assert!(reopened.get_channel("redstone-door").unwrap().state());
}

#[test]
fn inverted_receiver_survives_reload() {
    for relational in [false, true] {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.json"),
            json!({ "use_relational_backend": relational }).to_string(),
        )
        .unwrap();
        let mut config = door_config(&dir);
        config.close().unwrap();

        let config = Configuration::load(dir.path()).unwrap();
        let channel = config.get_channel("REDSTONE-DOOR").unwrap();
        assert_eq!(
            channel.point_at(&at(14)).unwrap().kind,
            PointKind::InvertedReceiver
        );

        let mut world = World::default();
        SignalEngine::new()
            .set_channel_state(&config, "redstone-door", true, &mut world)
            .unwrap();
        assert!(!world.powered[&at(14)], "backend relational={relational}");
    }
}

#[test]
fn duplicate_location_only_within_a_channel() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = door_config(&dir);
    config
        .create_channel("gate", &Channel::named("gate").unwrap())
        .unwrap();

    let err = config
        .create_point("redstone-door", Point::screen(at(12)))
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateLocation { .. }));

    config.create_point("gate", Point::screen(at(12))).unwrap();
}

#[test]
fn rename_moves_points() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = door_config(&dir);

    config.rename_channel("redstone-door", "Front-Gate").unwrap();

    assert!(config.get_channel("redstone-door").unwrap_err().is_not_found());
    let renamed = config.get_channel("front-gate").unwrap();
    assert_eq!(renamed.name().as_str(), "Front-Gate");
    assert_eq!(renamed.points().len(), 3);
    assert!(renamed.points().iter().all(|p| p.channel == "Front-Gate"));

    config
        .create_channel("gate", &Channel::named("gate").unwrap())
        .unwrap();
    let err = config.rename_channel("gate", "FRONT-GATE").unwrap_err();
    assert!(matches!(err, Error::AlreadyExists { .. }));
}

#[test]
fn conversion_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = door_config(&dir);
    config
        .create_channel("gate", &Channel::named("Gate").unwrap())
        .unwrap();
    config.create_point("gate", Point::screen(at(30))).unwrap();

    let snapshot = |config: &Configuration| {
        let mut points: Vec<_> = config
            .get_all_channels()
            .unwrap()
            .into_iter()
            .flat_map(|c| {
                let name = c.name().as_str().to_string();
                c.points()
                    .iter()
                    .map(|p| (name.clone(), p.location.clone(), p.kind))
                    .collect::<Vec<_>>()
            })
            .collect();
        points.sort();
        points
    };
    let before = snapshot(&config);

    config.convert().unwrap();
    assert_eq!(config.backend(), BackendKind::Relational);
    assert_eq!(snapshot(&config), before);

    config.convert().unwrap();
    assert_eq!(config.backend(), BackendKind::File);
    assert_eq!(snapshot(&config), before);

    let backups = fs::read_dir(dir.path().join("backups")).unwrap().count();
    assert_eq!(backups, 2);
}

#[test]
fn legacy_section_is_migrated_once() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    fs::write(
        &config_path,
        json!({
            "wireless_channels": {
                "Door": {
                    "state": true,
                    "transmitters": [{ "world": "world", "x": 10, "y": 64, "z": 10 }],
                    "receivers": [{ "world": "world", "x": 14, "y": 64, "z": 10, "inverted": true }]
                },
                "Gate": {}
            }
        })
        .to_string(),
    )
    .unwrap();

    let mut config = Configuration::load(dir.path()).unwrap();

    let files: Vec<_> = fs::read_dir(dir.path().join("channels"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(files.len(), 2);
    assert!(files.contains(&"door.json".to_string()));
    assert!(files.contains(&"gate.json".to_string()));

    let settings = SettingsFile::load(&config_path).unwrap();
    assert!(settings.wireless_channels.is_none());

    let door = config.get_channel("door").unwrap();
    assert_eq!(
        door.point_at(&at(14)).unwrap().kind,
        PointKind::InvertedReceiver
    );

    config.remove_channel("gate").unwrap();
    config.close().unwrap();
    let config = Configuration::load(dir.path()).unwrap();
    assert_eq!(config.get_all_channels().unwrap().len(), 1);
}

#[test]
fn wipe_and_backup() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = door_config(&dir);

    let backup = config.backup_data().unwrap();
    assert!(backup.join("redstone-door.json").is_file());

    config.wipe_data().unwrap();
    assert!(config.get_all_channels().unwrap().is_empty());
    config.remove_channel("redstone-door").unwrap();
}
