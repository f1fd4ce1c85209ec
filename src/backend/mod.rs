//! Injected-input backends
//!
//! The emitter only ever presses, releases and moves; these traits are the
//! whole surface it sees. Windows gets a real `SendInput` implementation,
//! every platform gets recording mocks.

pub mod mock;
#[cfg(windows)]
pub mod sendinput;

pub use mock::{EventLog, InputEvent, MockKeyboardBackend, MockMouseBackend};
#[cfg(windows)]
pub use sendinput::{SendInputKeyboard, SendInputMouse};

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend operation failed: {0}")]
    Operation(String),

    #[error("Unsupported key: {0}")]
    UnsupportedKey(String),

    #[error("Unsupported mouse button: {0}")]
    UnsupportedButton(String),

    #[error("Platform not supported")]
    PlatformNotSupported,
}

/// Keyboard side of the injected-input capability
pub trait KeyboardBackend {
    /// Key down event
    fn key_down(&self, key: &str) -> Result<(), BackendError>;

    /// Key up event
    fn key_up(&self, key: &str) -> Result<(), BackendError>;

    fn key_press(&self, key: &str) -> Result<(), BackendError> {
        self.key_down(key)?;
        self.key_up(key)
    }
}

/// Pointer side of the injected-input capability
pub trait MouseBackend {
    /// Move the pointer by (dx, dy) pixels
    fn move_relative(&self, dx: i32, dy: i32) -> Result<(), BackendError>;

    fn button_down(&self, button: MouseButton) -> Result<(), BackendError>;

    fn button_up(&self, button: MouseButton) -> Result<(), BackendError>;

    fn click(&self, button: MouseButton) -> Result<(), BackendError> {
        self.button_down(button)?;
        self.button_up(button)
    }
}

impl<T: KeyboardBackend + ?Sized> KeyboardBackend for Box<T> {
    fn key_down(&self, key: &str) -> Result<(), BackendError> {
        (**self).key_down(key)
    }

    fn key_up(&self, key: &str) -> Result<(), BackendError> {
        (**self).key_up(key)
    }
}

impl<T: MouseBackend + ?Sized> MouseBackend for Box<T> {
    fn move_relative(&self, dx: i32, dy: i32) -> Result<(), BackendError> {
        (**self).move_relative(dx, dy)
    }

    fn button_down(&self, button: MouseButton) -> Result<(), BackendError> {
        (**self).button_down(button)
    }

    fn button_up(&self, button: MouseButton) -> Result<(), BackendError> {
        (**self).button_up(button)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn name(self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MouseButton {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" | "mouse1" => Ok(MouseButton::Left),
            "right" | "r" | "mouse2" => Ok(MouseButton::Right),
            "middle" | "m" | "mouse3" => Ok(MouseButton::Middle),
            _ => Err(BackendError::UnsupportedButton(s.to_string())),
        }
    }
}

/// Boxed keyboard + mouse pair
pub type BackendPair = (Box<dyn KeyboardBackend>, Box<dyn MouseBackend>);

/// Native input backends for the current platform
#[cfg(windows)]
pub fn platform_backends() -> Result<BackendPair, BackendError> {
    let keyboard: Box<dyn KeyboardBackend> = Box::new(SendInputKeyboard);
    let mouse: Box<dyn MouseBackend> = Box::new(SendInputMouse);
    Ok((keyboard, mouse))
}

/// Native input backends for the current platform
#[cfg(not(windows))]
pub fn platform_backends() -> Result<BackendPair, BackendError> {
    Err(BackendError::PlatformNotSupported)
}

/// Logging mocks sharing one event log
pub fn mock_backends() -> (BackendPair, EventLog) {
    let log = EventLog::default();
    let keyboard: Box<dyn KeyboardBackend> = Box::new(MockKeyboardBackend::with_log(log.clone()));
    let mouse: Box<dyn MouseBackend> = Box::new(MockMouseBackend::with_log(log.clone()));
    ((keyboard, mouse), log)
}
