//! Telemetry data types

use serde::{Deserialize, Serialize};
use std::fmt;

/// One parsed reading from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSample {
    /// Raw horizontal ADC value
    pub x: i32,

    /// Raw vertical ADC value
    pub y: i32,

    /// Direction label computed by the device firmware, if it sent one
    pub direction: Option<String>,
}

impl RawSample {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y, direction: None }
    }

    pub fn with_direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = Some(direction.into());
        self
    }
}

/// Identifies a physical joystick on the serial line (1-based, as printed by the firmware).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JoystickId(pub u8);

impl JoystickId {
    pub const FIRST: JoystickId = JoystickId(1);
    pub const SECOND: JoystickId = JoystickId(2);

    /// Zero-based slot index
    pub fn index(self) -> usize {
        usize::from(self.0.saturating_sub(1))
    }

    /// Build from a zero-based slot index
    pub fn from_index(index: usize) -> Self {
        JoystickId(u8::try_from(index + 1).unwrap_or(u8::MAX))
    }
}

impl fmt::Display for JoystickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "joystick {}", self.0)
    }
}
