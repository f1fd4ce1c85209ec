//! Broadcast document shapes
//!
//! Single stick: `{"mode":"2","dx":0,"dy":72,"direction":"down"}`
//!
//! Two sticks: `{"mode":"2","joystick1":{..},"joystick2":{..}}`

use crate::direction::{Direction, Resolved};
use crate::emitter::ControlMode;
use serde::{Deserialize, Serialize};

/// Resolved state of one stick as subscribers see it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StickState {
    pub dx: i32,
    pub dy: i32,
    pub direction: Direction,
}

impl From<Resolved> for StickState {
    fn from(resolved: Resolved) -> Self {
        Self {
            dx: resolved.dx,
            dy: resolved.dy,
            direction: resolved.direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Dual {
        mode: String,
        joystick1: StickState,
        joystick2: StickState,
    },
    Single {
        mode: String,
        #[serde(flatten)]
        state: StickState,
    },
}

impl Payload {
    /// Build the document for one tick; `None` for unsupported stick counts.
    pub fn from_states(mode: ControlMode, states: &[StickState]) -> Option<Self> {
        let mode = mode.label().to_string();
        match *states {
            [state] => Some(Payload::Single { mode, state }),
            [joystick1, joystick2] => Some(Payload::Dual {
                mode,
                joystick1,
                joystick2,
            }),
            _ => None,
        }
    }

    pub fn mode(&self) -> &str {
        match self {
            Payload::Dual { mode, .. } | Payload::Single { mode, .. } => mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_payload_is_flat() {
        let state = StickState { dx: 0, dy: 72, direction: Direction::Down };
        let payload = Payload::from_states(ControlMode::KeyHold, &[state]).unwrap();
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"mode": "2", "dx": 0, "dy": 72, "direction": "down"})
        );
    }

    #[test]
    fn dual_payload_nests_sticks() {
        let left = StickState { dx: -98, dy: 0, direction: Direction::Left };
        let up_right = StickState { dx: 60, dy: -60, direction: Direction::UpRight };
        let payload = Payload::from_states(ControlMode::Mouse, &[left, up_right]).unwrap();
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "mode": "1",
                "joystick1": {"dx": -98, "dy": 0, "direction": "left"},
                "joystick2": {"dx": 60, "dy": -60, "direction": "up-right"},
            })
        );
    }

    #[test]
    fn documents_read_back() {
        let text = r#"{"mode":"4","dx":1,"dy":2,"direction":"center"}"#;
        let payload: Payload = serde_json::from_str(text).unwrap();
        assert_eq!(payload.mode(), "4");
        assert!(matches!(payload, Payload::Single { .. }));
    }

    #[test]
    fn unsupported_stick_counts() {
        assert!(Payload::from_states(ControlMode::KeyHold, &[]).is_none());
        assert!(Payload::from_states(ControlMode::KeyHold, &[StickState::default(); 3]).is_none());
    }
}
