//! Control modes

use crate::backend::MouseButton;
use crate::emitter::keymap::DirectionMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the emitter turns directions into input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterMode {
    /// Press on entry, release on exit
    Hold,
    /// Press + release every tick the direction is active
    Pulse,
    /// Relative pointer motion from the displacement
    Pointer,
}

/// User-facing control mode; the label is what subscribers see in `mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    Mouse,
    #[default]
    KeyHold,
    MouseClick,
    KeyPulse,
}

impl ControlMode {
    pub const ALL: [ControlMode; 4] = [
        ControlMode::Mouse,
        ControlMode::KeyHold,
        ControlMode::MouseClick,
        ControlMode::KeyPulse,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ControlMode::Mouse => "1",
            ControlMode::KeyHold => "2",
            ControlMode::MouseClick => "3",
            ControlMode::KeyPulse => "4",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ControlMode::Mouse => "mouse",
            ControlMode::KeyHold => "keyhold",
            ControlMode::MouseClick => "mouseclick",
            ControlMode::KeyPulse => "keypulse",
        }
    }

    pub fn emitter_mode(self) -> EmitterMode {
        match self {
            ControlMode::Mouse => EmitterMode::Pointer,
            ControlMode::KeyHold => EmitterMode::Hold,
            ControlMode::MouseClick | ControlMode::KeyPulse => EmitterMode::Pulse,
        }
    }

    /// Whether configured keymaps replace the built-in map
    pub fn uses_keymaps(self) -> bool {
        matches!(self, ControlMode::KeyHold | ControlMode::KeyPulse)
    }

    /// Built-in map for joystick `index` (0-based)
    pub fn default_map(self, index: usize) -> DirectionMap {
        match self {
            ControlMode::Mouse => DirectionMap::empty(),
            ControlMode::MouseClick => DirectionMap::button(MouseButton::Left),
            ControlMode::KeyHold | ControlMode::KeyPulse if index == 0 => DirectionMap::wasd(),
            ControlMode::KeyHold | ControlMode::KeyPulse => DirectionMap::arrows(),
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.label())
    }
}

/// Accepts either the name (`keyhold`) or the wire label (`2`).
impl FromStr for ControlMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ControlMode::ALL
            .into_iter()
            .find(|mode| mode.label() == s || mode.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown control mode '{}' (expected 1-4 or mouse/keyhold/mouseclick/keypulse)", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_and_names_parse() {
        assert_eq!("1".parse::<ControlMode>(), Ok(ControlMode::Mouse));
        assert_eq!("KeyHold".parse::<ControlMode>(), Ok(ControlMode::KeyHold));
        assert_eq!("3".parse::<ControlMode>(), Ok(ControlMode::MouseClick));
        assert!("5".parse::<ControlMode>().is_err());
    }

    #[test]
    fn mode_is_chosen_explicitly() {
        assert_eq!(ControlMode::Mouse.emitter_mode(), EmitterMode::Pointer);
        assert_eq!(ControlMode::KeyHold.emitter_mode(), EmitterMode::Hold);
        assert_eq!(ControlMode::KeyPulse.emitter_mode(), EmitterMode::Pulse);
        assert_eq!(ControlMode::KeyHold.default_map(1), DirectionMap::arrows());
    }

    #[test]
    fn only_key_modes_take_keymaps() {
        assert!(ControlMode::KeyHold.uses_keymaps());
        assert!(ControlMode::KeyPulse.uses_keymaps());
        assert!(!ControlMode::MouseClick.uses_keymaps());
        assert!(!ControlMode::Mouse.uses_keymaps());
    }
}
