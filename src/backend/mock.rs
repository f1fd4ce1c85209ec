//! Mock input backends
//!
//! Log every event at info level instead of touching the OS, and record it
//! in a shared [`EventLog`] so tests can assert on the exact sequence.

use crate::backend::{BackendError, KeyboardBackend, MouseBackend, MouseButton};
use log::info;
use std::sync::{Arc, Mutex, PoisonError};

/// One injected input event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(String),
    KeyUp(String),
    ButtonDown(MouseButton),
    ButtonUp(MouseButton),
    Move { dx: i32, dy: i32 },
}

/// Shared, cloneable record of emitted events
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<InputEvent>>>,
}

impl EventLog {
    fn push(&self, event: InputEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Snapshot of every event so far
    pub fn events(&self) -> Vec<InputEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Return and forget every event so far
    pub fn drain(&self) -> Vec<InputEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many times `key` went down
    pub fn key_downs(&self, key: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, InputEvent::KeyDown(k) if k == key))
            .count()
    }

    /// How many times `key` went up
    pub fn key_ups(&self, key: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, InputEvent::KeyUp(k) if k == key))
            .count()
    }
}

/// Keyboard backend that logs and records instead of injecting.
#[derive(Debug, Clone, Default)]
pub struct MockKeyboardBackend {
    log: EventLog,
}

impl MockKeyboardBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(log: EventLog) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }
}

impl KeyboardBackend for MockKeyboardBackend {
    fn key_down(&self, key: &str) -> Result<(), BackendError> {
        info!("[MOCK KEYBOARD] Key DOWN: {}", key);
        self.log.push(InputEvent::KeyDown(key.to_string()));
        Ok(())
    }

    fn key_up(&self, key: &str) -> Result<(), BackendError> {
        info!("[MOCK KEYBOARD] Key UP: {}", key);
        self.log.push(InputEvent::KeyUp(key.to_string()));
        Ok(())
    }
}

/// Mouse backend that logs and records instead of injecting.
#[derive(Debug, Clone, Default)]
pub struct MockMouseBackend {
    log: EventLog,
}

impl MockMouseBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(log: EventLog) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }
}

impl MouseBackend for MockMouseBackend {
    fn move_relative(&self, dx: i32, dy: i32) -> Result<(), BackendError> {
        info!("[MOCK MOUSE] Move relative: dx={}, dy={}", dx, dy);
        self.log.push(InputEvent::Move { dx, dy });
        Ok(())
    }

    fn button_down(&self, button: MouseButton) -> Result<(), BackendError> {
        info!("[MOCK MOUSE] Button DOWN: {}", button);
        self.log.push(InputEvent::ButtonDown(button));
        Ok(())
    }

    fn button_up(&self, button: MouseButton) -> Result<(), BackendError> {
        info!("[MOCK MOUSE] Button UP: {}", button);
        self.log.push(InputEvent::ButtonUp(button));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_records_in_order() {
        let keyboard = MockKeyboardBackend::new();
        keyboard.key_down("w").unwrap();
        keyboard.key_press("space").unwrap();
        keyboard.key_up("w").unwrap();

        assert_eq!(
            keyboard.log().events(),
            vec![
                InputEvent::KeyDown("w".into()),
                InputEvent::KeyDown("space".into()),
                InputEvent::KeyUp("space".into()),
                InputEvent::KeyUp("w".into()),
            ]
        );
        assert_eq!(keyboard.log().key_downs("w"), 1);
    }

    #[test]
    fn clones_share_the_log() {
        let mouse = MockMouseBackend::new();
        let other = mouse.clone();
        other.move_relative(3, -4).unwrap();
        assert_eq!(mouse.log().drain(), vec![InputEvent::Move { dx: 3, dy: -4 }]);
        assert!(mouse.log().is_empty());
    }
}
