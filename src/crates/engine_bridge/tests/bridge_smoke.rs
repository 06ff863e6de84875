#![cfg(feature = "test-support")]

#[path = "bridge_support.rs"]
mod support;

use engine_bridge::{presets, DisplayMode, NullDisplay, SessionController};
use support::{drive_to_finish, engine_config, projectile_config};

#[test]
fn orbital_preset_streams_end_to_end() {
    let mut controller = SessionController::new(engine_config(), Box::new(NullDisplay));
    let (config, mode) = presets::inner_planets();
    controller.start(config, mode).expect("session should start");

    let applied = drive_to_finish(&mut controller, 80);
    assert_eq!(applied, 64, "fake engine emits its default frame count");

    let display = controller.display().expect("display");
    assert_eq!(display.tracks().len(), 5);
    for track in display.tracks() {
        assert!(track.current().is_some(), "{} never moved", track.label());
    }
    // The Sun keeps no trail but still has a current position; its constant
    // z-coordinate survives the round trip through the engine exactly.
    let sun = &display.tracks()[0];
    assert_eq!(sun.trail().len(), 0);
    assert_eq!(sun.current().expect("sun position").z(), 3.087e7);
}

#[test]
fn staggered_projectiles_stall_then_finish() {
    let mut controller = SessionController::new(engine_config(), Box::new(NullDisplay));
    // Different launch heights: the low shot lands and echoes while the high
    // one is still flying.
    let config = projectile_config(&[0.0, 20.0]);
    controller
        .start(config, DisplayMode::all())
        .expect("session should start");

    drive_to_finish(&mut controller, 32);

    let display = controller.display().expect("display");
    assert!(display.finished());
    assert!(
        display.tracks()[0].stalled(),
        "early lander must freeze while the other flies"
    );
    assert!(!display.tracks()[1].stalled());
    assert_eq!(display.tracks()[0].current().expect("landed").y(), 0.0);
    assert_eq!(display.tracks()[1].current().expect("landed").y(), 0.0);
}

#[test]
fn decay_preset_counts_down_to_zero() {
    let mut controller = SessionController::new(engine_config(), Box::new(NullDisplay));
    controller
        .start(presets::particle_decay(50, 0.5, 1.0), DisplayMode::all())
        .expect("session should start");

    drive_to_finish(&mut controller, 64);

    let display = controller.display().expect("display");
    let counts: Vec<f64> = display.tracks()[0]
        .trail()
        .iter()
        .map(|sample| sample.x())
        .collect();
    assert!(counts.len() >= 2);
    assert_eq!(*counts.last().expect("at least one count"), 0.0);
    assert!(
        counts.windows(2).all(|pair| pair[1] < pair[0]),
        "remaining population must strictly decrease: {counts:?}"
    );
}
