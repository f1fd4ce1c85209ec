//! Integration tests for mock backends

use stick_bridge::backend::{
    mock_backends, EventLog, InputEvent, KeyboardBackend, MockKeyboardBackend, MockMouseBackend, MouseBackend,
    MouseButton,
};

fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

#[test]
fn test_mock_keyboard_backend() {
    init_logging();
    let backend = MockKeyboardBackend::new();

    assert!(backend.key_down("w").is_ok());
    assert!(backend.key_up("w").is_ok());
    assert!(backend.key_press("space").is_ok());

    // Mock accepts any key name (unlike real backend)
    assert!(backend.key_down("invalid_key").is_ok());
    assert_eq!(backend.log().len(), 5);
}

#[test]
fn test_mock_mouse_backend() {
    init_logging();
    let backend = MockMouseBackend::new();

    assert!(backend.move_relative(10, -5).is_ok());
    assert!(backend.click(MouseButton::Right).is_ok());
    assert_eq!(
        backend.log().events(),
        vec![
            InputEvent::Move { dx: 10, dy: -5 },
            InputEvent::ButtonDown(MouseButton::Right),
            InputEvent::ButtonUp(MouseButton::Right),
        ]
    );
}

#[test]
fn test_shared_log_orders_across_devices() {
    let log = EventLog::default();
    let keyboard = MockKeyboardBackend::with_log(log.clone());
    let mouse = MockMouseBackend::with_log(log.clone());

    keyboard.key_down("a").unwrap();
    mouse.button_down(MouseButton::Left).unwrap();
    keyboard.key_up("a").unwrap();

    assert_eq!(log.key_downs("a"), 1);
    assert_eq!(log.key_ups("a"), 1);
    assert_eq!(log.events()[1], InputEvent::ButtonDown(MouseButton::Left));
}

#[test]
fn test_boxed_mock_pair() {
    let ((keyboard, mouse), log) = mock_backends();
    keyboard.key_press("up").unwrap();
    mouse.move_relative(1, 1).unwrap();
    assert_eq!(log.drain().len(), 3);
}
