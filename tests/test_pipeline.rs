//! End-to-end: calibration file -> sampling loop -> input and broadcast

use stick_bridge::backend::{EventLog, InputEvent, MockKeyboardBackend, MockMouseBackend};
use stick_bridge::calibration::{
    CalibrationPoint, CalibrationProcedure, CalibrationProfile, CalibrationStore, CaptureWindow, ImmediateGate,
    Position,
};
use stick_bridge::direction::{Direction, ResolverSettings};
use stick_bridge::emitter::{ControlMode, InputEmitter};
use stick_bridge::transport::MockLineSource;
use stick_bridge::{load_resolvers, Bridge, BridgeError, BridgeSettings, BroadcastHub, FrameReader, JoystickId, TextLineFormat};
use std::path::PathBuf;
use std::time::Duration;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("stick-bridge-it-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn profile() -> CalibrationProfile {
    CalibrationProfile::new()
        .with(Position::Center, CalibrationPoint::new(2048, 2048).with_error(2, 2))
        .with(Position::Up, CalibrationPoint::new(2048, 1900))
        .with(Position::Down, CalibrationPoint::new(2048, 2200))
        .with(Position::Left, CalibrationPoint::new(1900, 2048))
        .with(Position::Right, CalibrationPoint::new(2200, 2048))
}

#[test]
fn calibrate_then_run() {
    let dir = scratch_dir("calibrate-run");
    let store = CalibrationStore::new(&dir, 1);

    // Calibration: one line per position
    let mut source = MockLineSource::new();
    for (x, y) in [(2048, 2048), (2048, 1900), (2048, 2200), (1900, 2048), (2200, 2048)] {
        source.push_line(format!("Raw X: {}, Y: {} | Direction: Center", x, y));
    }
    let window = CaptureWindow { samples: 1, interval: Duration::ZERO };
    let mut procedure = CalibrationProcedure::new(&mut source, TextLineFormat, 1, window);
    let outcomes = procedure.run(&[JoystickId::FIRST], &mut ImmediateGate::default(), &store).unwrap();
    assert!(outcomes[0].unresolved.is_empty());

    // Single-sample capture: no jitter, thresholds are half the span
    let settings = ResolverSettings { prefer_device_direction: false, ..ResolverSettings::default() };
    let resolvers = load_resolvers(&store, 1, settings).unwrap();
    assert_eq!(resolvers[0].thresholds().up, 74);

    let log = EventLog::default();
    let emitter = InputEmitter::new(
        MockKeyboardBackend::with_log(log.clone()),
        MockMouseBackend::with_log(log.clone()),
        ControlMode::KeyHold.emitter_mode(),
        vec![ControlMode::KeyHold.default_map(0)],
    );

    let hub = BroadcastHub::new();
    let subscriber = hub.subscribe();

    let telemetry = MockLineSource::from_lines([
        "X: 2048 Y: 1950",
        "X: 2048 Y: 1940",
        "X: 1950 Y: 1950",
        "X: 2050 Y: 2050",
    ]);
    let mut bridge = Bridge::new(telemetry, FrameReader::new(TextLineFormat, 1), resolvers, BridgeSettings::default())
        .unwrap()
        .with_emitter(emitter)
        .with_hub(hub.clone());

    let directions: Vec<Direction> = (0..4)
        .filter_map(|_| bridge.tick())
        .map(|resolved| resolved[0].direction)
        .collect();
    assert_eq!(directions, vec![Direction::Up, Direction::Up, Direction::UpLeft, Direction::Center]);

    // Primary diagonal keeps "w" held through up-left
    assert_eq!(
        log.events(),
        vec![InputEvent::KeyDown("w".into()), InputEvent::KeyUp("w".into())]
    );
    assert_eq!(
        subscriber.latest().as_deref(),
        Some(r#"{"mode":"2","dx":0,"dy":0,"direction":"center"}"#)
    );
    assert_eq!(bridge.stats().publishes, 4);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_center_refuses_to_start() {
    let dir = scratch_dir("no-center");
    let store = CalibrationStore::new(&dir, 1);

    // Center stalled during capture: profile is still written
    let mut source = MockLineSource::new();
    source.push_timeout();
    for line in ["X: 2048 Y: 0", "X: 2048 Y: 4095", "X: 0 Y: 2048", "X: 4095 Y: 2048"] {
        source.push_line(line);
    }
    let window = CaptureWindow { samples: 1, interval: Duration::ZERO };
    let mut procedure = CalibrationProcedure::new(&mut source, TextLineFormat, 1, window);
    let outcomes = procedure.run(&[JoystickId::FIRST], &mut ImmediateGate::default(), &store).unwrap();
    assert_eq!(outcomes[0].unresolved, vec![Position::Center]);
    assert!(store.path_for(JoystickId::FIRST).exists());

    let err = load_resolvers(&store, 1, ResolverSettings::default()).unwrap_err();
    assert!(matches!(err, BridgeError::Calibration { joystick: JoystickId::FIRST, .. }));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_file_refuses_to_start() {
    let store = CalibrationStore::new(scratch_dir("absent"), 2);
    assert!(load_resolvers(&store, 2, ResolverSettings::default()).is_err());
}

#[test]
fn dual_layout_broadcasts_both_sticks() {
    let dir = scratch_dir("dual");
    let store = CalibrationStore::new(&dir, 2);
    store.save(JoystickId::FIRST, &profile()).unwrap();
    store.save(JoystickId::SECOND, &profile()).unwrap();
    let resolvers = load_resolvers(&store, 2, ResolverSettings::default()).unwrap();

    let hub = BroadcastHub::new();
    let subscriber = hub.subscribe();
    let telemetry = MockLineSource::from_lines([
        "Joystick 2 X: 2048 Y: 2048 Direction: DownRight",
        "Joystick 1 X: 2200 Y: 2048",
    ]);
    let settings = BridgeSettings { mode: ControlMode::Mouse, ..BridgeSettings::default() };
    let mut bridge: Bridge<_, _, MockKeyboardBackend, MockMouseBackend> =
        Bridge::new(telemetry, FrameReader::new(TextLineFormat, 2), resolvers, settings)
            .unwrap()
            .with_hub(hub.clone());

    bridge.tick().unwrap();
    let document: serde_json::Value = serde_json::from_str(&subscriber.latest().unwrap()).unwrap();
    assert_eq!(
        document,
        serde_json::json!({
            "mode": "1",
            "joystick1": {"dx": 152, "dy": 0, "direction": "right"},
            "joystick2": {"dx": 0, "dy": 0, "direction": "down-right"},
        })
    );

    let _ = std::fs::remove_dir_all(&dir);
}
