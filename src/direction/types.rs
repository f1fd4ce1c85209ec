//! Direction types

use crate::calibration::{CalibrationError, CalibrationProfile, Position};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Vertical half of a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vertical {
    Up,
    Down,
}

/// Horizontal half of a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Horizontal {
    Left,
    Right,
}

/// 8-way compass plus center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    #[default]
    Center,
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Direction {
    pub const ALL: [Direction; 9] = [
        Direction::Center,
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
        Direction::UpLeft,
        Direction::UpRight,
        Direction::DownLeft,
        Direction::DownRight,
    ];

    /// Vertical wins the primary slot; horizontal is a suffix only when vertical is set.
    pub fn compose(vertical: Option<Vertical>, horizontal: Option<Horizontal>) -> Self {
        match (vertical, horizontal) {
            (None, None) => Direction::Center,
            (Some(Vertical::Up), None) => Direction::Up,
            (Some(Vertical::Down), None) => Direction::Down,
            (None, Some(Horizontal::Left)) => Direction::Left,
            (None, Some(Horizontal::Right)) => Direction::Right,
            (Some(Vertical::Up), Some(Horizontal::Left)) => Direction::UpLeft,
            (Some(Vertical::Up), Some(Horizontal::Right)) => Direction::UpRight,
            (Some(Vertical::Down), Some(Horizontal::Left)) => Direction::DownLeft,
            (Some(Vertical::Down), Some(Horizontal::Right)) => Direction::DownRight,
        }
    }

    pub fn vertical(self) -> Option<Vertical> {
        match self {
            Direction::Up | Direction::UpLeft | Direction::UpRight => Some(Vertical::Up),
            Direction::Down | Direction::DownLeft | Direction::DownRight => Some(Vertical::Down),
            _ => None,
        }
    }

    pub fn horizontal(self) -> Option<Horizontal> {
        match self {
            Direction::Left | Direction::UpLeft | Direction::DownLeft => Some(Horizontal::Left),
            Direction::Right | Direction::UpRight | Direction::DownRight => Some(Horizontal::Right),
            _ => None,
        }
    }

    pub fn is_center(self) -> bool {
        self == Direction::Center
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Center => "center",
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::UpLeft => "up-left",
            Direction::UpRight => "up-right",
            Direction::DownLeft => "down-left",
            Direction::DownRight => "down-right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses firmware labels case-insensitively; `Up-Left`, `up_left` and `UpLeft` are all accepted.
impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "center" | "centre" | "neutral" => Ok(Direction::Center),
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            "upleft" => Ok(Direction::UpLeft),
            "upright" => Ok(Direction::UpRight),
            "downleft" => Ok(Direction::DownLeft),
            "downright" => Ok(Direction::DownRight),
            _ => Err(format!("unknown direction label: '{}'", s)),
        }
    }
}

/// Minimum displacement per direction, derived once from a calibration profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdSet {
    pub left: u32,
    pub right: u32,
    pub up: u32,
    pub down: u32,
}

impl ThresholdSet {
    pub fn uniform(value: u32) -> Self {
        Self {
            left: value,
            right: value,
            up: value,
            down: value,
        }
    }

    /// `max(0, |center - extreme| / 2 - error(center))` per extreme, using
    /// the center's X error for left/right and Y error for up/down.
    ///
    /// Fails when the profile lacks the center or any extreme.
    pub fn from_profile(profile: &CalibrationProfile) -> Result<Self, CalibrationError> {
        let missing = profile.missing_positions();
        if !missing.is_empty() {
            return Err(CalibrationError::Incomplete { missing });
        }

        let point = |position| {
            profile
                .get(position)
                .copied()
                .ok_or_else(|| CalibrationError::Incomplete { missing: vec![position] })
        };
        let center = point(Position::Center)?;

        let threshold = |center_value: i32, extreme_value: i32, error: u32| -> u32 {
            let half = (i64::from(center_value) - i64::from(extreme_value)).unsigned_abs() / 2;
            let reduced = half.saturating_sub(u64::from(error));
            u32::try_from(reduced).unwrap_or(u32::MAX)
        };

        Ok(Self {
            left: threshold(center.x, point(Position::Left)?.x, center.err_x),
            right: threshold(center.x, point(Position::Right)?.x, center.err_x),
            up: threshold(center.y, point(Position::Up)?.y, center.err_y),
            down: threshold(center.y, point(Position::Down)?.y, center.err_y),
        })
    }
}
