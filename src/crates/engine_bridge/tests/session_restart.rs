#![cfg(feature = "test-support")]

#[path = "bridge_support.rs"]
mod support;

use std::time::Duration;

use engine_bridge::{
    BridgeError, ControlEvent, ControllerState, DisplayMode, SessionController,
};
use support::{drive_to_finish, engine_config, script_engine, tracker_config, RecordingSink};

#[test]
fn controller_walks_start_stream_finish() {
    let (engine, _script) = script_engine(&["1 2", "3 4"]);
    let (sink, log) = RecordingSink::new();
    let mut controller = SessionController::new(engine, Box::new(sink));
    assert_eq!(controller.state(), ControllerState::Idle);

    controller
        .start(tracker_config(&["probe"]), DisplayMode::all())
        .expect("session should start");
    assert_eq!(controller.state(), ControllerState::Active);
    assert_eq!(controller.generation(), 1);

    let applied = drive_to_finish(&mut controller, 8);
    assert_eq!(applied, 2);
    assert_eq!(controller.state(), ControllerState::Active);
    let display = controller.display().expect("display survives the finish");
    assert!(display.finished());
    let resting = display.tracks()[0].current().expect("sample applied");
    assert_eq!((resting.x(), resting.y()), (3.0, 4.0));

    // Ticking a finished run is a no-op and must not re-notify the sink.
    let report = controller.tick().expect("post-finish tick");
    assert!(!report.applied && report.finished);

    let log = log.borrow();
    assert_eq!(
        log.updates,
        vec![
            ("probe".to_string(), 1.0, 2.0),
            ("probe".to_string(), 3.0, 4.0),
        ]
    );
    assert_eq!(log.redraws.len(), 2);
    assert_eq!(log.finishes, 1);
}

#[test]
fn start_is_only_legal_while_idle() {
    let (engine, _script) = script_engine(&["1 2"]);
    let mut controller = SessionController::new(engine, Box::new(RecordingSink::new().0));
    controller
        .start(tracker_config(&["probe"]), DisplayMode::all())
        .expect("session should start");

    let err = controller
        .start(tracker_config(&["probe"]), DisplayMode::all())
        .expect_err("second start should fail");
    assert!(matches!(err, BridgeError::InvalidState(_)));
    assert_eq!(controller.state(), ControllerState::Active);
}

#[test]
fn restart_replaces_the_stream_wholesale() {
    let lines: Vec<String> = (1..=20).map(|i| format!("{i} {i}")).collect();
    let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let (engine, _script) = script_engine(&line_refs);
    let engine = engine.with_env("FAKE_ENGINE_LINE_DELAY_MS", "10");

    let (sink, log) = RecordingSink::new();
    let mut controller = SessionController::new(engine, Box::new(sink));
    controller
        .start(tracker_config(&["probe"]), DisplayMode::all())
        .expect("session should start");

    controller.tick().expect("tick 1");
    controller.tick().expect("tick 2");
    assert_eq!(controller.display().expect("live display").frames_applied(), 2);

    // Swap engines mid-stream; the replacement replays the script from the top.
    controller
        .request_restart(tracker_config(&["probe"]), DisplayMode::all())
        .expect("restart should succeed");
    assert_eq!(controller.state(), ControllerState::Active);
    assert_eq!(controller.generation(), 2);
    let display = controller.display().expect("fresh display");
    assert_eq!(display.generation(), 2);
    assert_eq!(display.frames_applied(), 0);

    let applied = drive_to_finish(&mut controller, 64);
    assert_eq!(applied, 20, "no frame of the old engine may leak through");

    let log = log.borrow();
    assert_eq!(log.updates[2], ("probe".to_string(), 1.0, 1.0));
    assert_eq!(log.updates.len(), 22);
    assert_eq!(log.finishes, 1, "only the replacement stream finished");
}

#[test]
fn restart_from_idle_is_rejected() {
    let (engine, _script) = script_engine(&["1 2"]);
    let mut controller = SessionController::new(engine, Box::new(RecordingSink::new().0));

    let err = controller
        .request_restart(tracker_config(&["probe"]), DisplayMode::all())
        .expect_err("restart without a session should fail");
    assert!(matches!(err, BridgeError::InvalidState(_)));
    assert_eq!(controller.state(), ControllerState::Idle);
}

#[test]
fn stream_error_returns_the_controller_to_idle() {
    let engine = engine_config().with_env("FAKE_ENGINE_GARBAGE_AFTER", "2");
    let mut controller = SessionController::new(engine, Box::new(RecordingSink::new().0));
    controller
        .start(tracker_config(&["probe"]), DisplayMode::all())
        .expect("session should start");

    controller.tick().expect("tick 1");
    controller.tick().expect("tick 2");
    let err = controller.tick().expect_err("poisoned frame should fail");
    assert!(matches!(err, BridgeError::Protocol { .. }));

    assert_eq!(controller.state(), ControllerState::Idle);
    assert!(controller.display().is_none(), "broken run is discarded");

    // The failure is not fatal to the controller: a fresh start works.
    controller
        .start(tracker_config(&["probe"]), DisplayMode::all())
        .expect("restart after failure");
    assert_eq!(controller.generation(), 2);
    assert!(controller.tick().expect("fresh stream ticks").applied);
    controller.close();
}

#[test]
fn silent_engine_times_out_and_tears_down() {
    let engine = engine_config()
        .with_env("FAKE_ENGINE_HANG_AFTER", "1")
        .with_read_timeout(Duration::from_millis(100));
    let mut controller = SessionController::new(engine, Box::new(RecordingSink::new().0));
    controller
        .start(tracker_config(&["probe"]), DisplayMode::all())
        .expect("session should start");

    assert!(controller.tick().expect("tick 1").applied);
    let err = controller.tick().expect_err("hung engine should time out");
    assert!(matches!(err, BridgeError::Timeout(_)));
    assert_eq!(controller.state(), ControllerState::Idle);
    assert!(controller.display().is_none());
}

#[test]
fn close_is_idempotent_and_final() {
    let (engine, _script) = script_engine(&["1 2"]);
    let mut controller = SessionController::new(engine, Box::new(RecordingSink::new().0));
    controller
        .start(tracker_config(&["probe"]), DisplayMode::all())
        .expect("session should start");
    controller.tick().expect("tick");

    controller.close();
    assert_eq!(controller.state(), ControllerState::Closed);
    controller.close();
    assert_eq!(controller.state(), ControllerState::Closed);

    assert!(matches!(
        controller.tick(),
        Err(BridgeError::InvalidState(_))
    ));
    assert!(matches!(
        controller.start(tracker_config(&["probe"]), DisplayMode::all()),
        Err(BridgeError::InvalidState(_))
    ));
    assert!(matches!(
        controller.request_restart(tracker_config(&["probe"]), DisplayMode::all()),
        Err(BridgeError::InvalidState(_))
    ));
}

#[test]
fn finished_run_still_accepts_a_restart() {
    let (engine, _script) = script_engine(&["1 2", "3 4"]);
    let (sink, log) = RecordingSink::new();
    let mut controller = SessionController::new(engine, Box::new(sink));
    controller
        .start(tracker_config(&["probe"]), DisplayMode::all())
        .expect("session should start");
    drive_to_finish(&mut controller, 8);

    controller
        .request_restart(tracker_config(&["probe"]), DisplayMode::all())
        .expect("restart after finish");
    let applied = drive_to_finish(&mut controller, 8);
    assert_eq!(applied, 2);
    assert_eq!(log.borrow().finishes, 2);
}

#[test]
fn control_events_start_restart_and_close() {
    let (engine, _script) = script_engine(&["1 2"]);
    let mut controller = SessionController::new(engine, Box::new(RecordingSink::new().0));

    controller
        .handle_event(ControlEvent::Restart {
            config: tracker_config(&["probe"]),
            mode: DisplayMode::all(),
        })
        .expect("first event starts the session");
    assert_eq!(controller.state(), ControllerState::Active);
    assert_eq!(controller.generation(), 1);

    controller
        .handle_event(ControlEvent::Restart {
            config: tracker_config(&["probe"]),
            mode: DisplayMode::all(),
        })
        .expect("second event restarts");
    assert_eq!(controller.generation(), 2);

    controller.handle_event(ControlEvent::Close).expect("close event");
    assert_eq!(controller.state(), ControllerState::Closed);
}

#[test]
fn mode_switch_restart_rebuilds_the_tracks() {
    let (engine, _script) = script_engine(&["1 1 2 2 3 3"]);
    let mut controller = SessionController::new(engine, Box::new(RecordingSink::new().0));
    let config = tracker_config(&["a", "b", "c"]);

    controller
        .start(config.clone(), DisplayMode::subset("left", vec![0, 1]))
        .expect("session should start");
    drive_to_finish(&mut controller, 4);
    let labels: Vec<String> = controller
        .display()
        .expect("display")
        .tracks()
        .iter()
        .map(|track| track.label().to_string())
        .collect();
    assert_eq!(labels, vec!["a", "b"]);

    controller
        .request_restart(config, DisplayMode::subset("right", vec![0, 2]))
        .expect("mode switch restart");
    drive_to_finish(&mut controller, 4);
    let display = controller.display().expect("display");
    let labels: Vec<String> = display
        .tracks()
        .iter()
        .map(|track| track.label().to_string())
        .collect();
    assert_eq!(labels, vec!["a", "c"]);
    // Full-width frames decoded in both modes: the engine always receives and
    // reports the complete object list.
    assert_eq!(display.frames_applied(), 1);
    assert_eq!(controller.mode().expect("mode").name(), "right");
}

#[test]
fn failed_start_leaves_the_controller_idle() {
    let (engine, _script) = script_engine(&["1 2"]);
    let mut controller = SessionController::new(engine, Box::new(RecordingSink::new().0));

    // Mode referencing an object the configuration does not have.
    let err = controller
        .start(tracker_config(&["probe"]), DisplayMode::subset("bad", vec![5]))
        .expect_err("out-of-range mode should fail");
    assert!(matches!(err, BridgeError::InvalidState(_)));
    assert_eq!(controller.state(), ControllerState::Idle);
    assert!(controller.display().is_none());

    // Corrected settings start fine afterwards.
    controller
        .start(tracker_config(&["probe"]), DisplayMode::all())
        .expect("valid start succeeds");
    assert_eq!(controller.state(), ControllerState::Active);
}
