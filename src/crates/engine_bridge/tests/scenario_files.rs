#![cfg(feature = "test-support")]

#[path = "bridge_support.rs"]
mod support;

use engine_bridge::{
    presets, BridgeError, DisplayMode, NullDisplay, Scenario, SessionController,
};
use support::{drive_to_finish, script_engine, tracker_config};
use tempfile::TempDir;

#[test]
fn scenario_round_trips_through_json() {
    let (config, mode) = presets::inner_planets();
    let scenario = Scenario::new("inner solar system", config, mode);

    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("inner.json");
    scenario.write_json_file(&path).expect("write scenario");
    let loaded = Scenario::from_json_file(&path).expect("read scenario");

    assert_eq!(loaded, scenario);
}

#[test]
fn loaded_scenario_drives_a_session() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("run.json");
    Scenario::new("two probes", tracker_config(&["a", "b"]), DisplayMode::all())
        .write_json_file(&path)
        .expect("write scenario");

    let loaded = Scenario::from_json_file(&path).expect("read scenario");
    let (engine, _script) = script_engine(&["1 1 2 2", "3 3 4 4"]);
    let mut controller = SessionController::new(engine, Box::new(NullDisplay));
    controller
        .start(loaded.config, loaded.mode)
        .expect("session should start");

    let applied = drive_to_finish(&mut controller, 8);
    assert_eq!(applied, 2);
    let display = controller.display().expect("display");
    assert_eq!(display.tracks().len(), 2);
    let second = display.tracks()[1].current().expect("sample applied");
    assert_eq!((second.x(), second.y()), (4.0, 4.0));
}

#[test]
fn malformed_scenario_file_is_reported() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").expect("write file");

    let err = Scenario::from_json_file(&path).expect_err("parse should fail");
    assert!(matches!(err, BridgeError::Scenario(_)));
}

#[test]
fn scenario_with_invalid_config_is_rejected_on_load() {
    // Two populations under the decay family fails validation.
    let mut config = presets::default_decay();
    config.objects.push(config.objects[0].clone());

    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("invalid.json");
    Scenario::new("double decay", config, DisplayMode::all())
        .write_json_file(&path)
        .expect("writing does not validate");

    let err = Scenario::from_json_file(&path).expect_err("load should validate");
    assert!(matches!(err, BridgeError::InvalidState(_)));
}
