//! Calibration profile types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named positions captured during calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Center,
    Up,
    Down,
    Left,
    Right,
}

impl Position {
    /// Capture order used by the calibration procedure
    pub const ALL: [Position; 5] = [
        Position::Center,
        Position::Up,
        Position::Down,
        Position::Left,
        Position::Right,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Position::Center => "center",
            Position::Up => "up",
            Position::Down => "down",
            Position::Left => "left",
            Position::Right => "right",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Averaged raw coordinates for one position, with half the observed spread
/// as error bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub x: i32,
    pub y: i32,

    #[serde(default)]
    pub err_x: u32,

    #[serde(default)]
    pub err_y: u32,
}

impl CalibrationPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y, err_x: 0, err_y: 0 }
    }

    pub fn with_error(mut self, err_x: u32, err_y: u32) -> Self {
        self.err_x = err_x;
        self.err_y = err_y;
        self
    }

    /// Floor mean and half-range of a set of raw samples; `None` when empty.
    pub fn from_samples(samples: &[(i32, i32)]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let count = samples.len() as i64;
        let (mut sum_x, mut sum_y) = (0i64, 0i64);
        let (mut min_x, mut max_x) = (i32::MAX, i32::MIN);
        let (mut min_y, mut max_y) = (i32::MAX, i32::MIN);

        for &(x, y) in samples {
            sum_x += i64::from(x);
            sum_y += i64::from(y);
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }

        let half_range = |min: i32, max: i32| {
            let spread = i64::from(max) - i64::from(min);
            u32::try_from(spread / 2).unwrap_or(u32::MAX)
        };

        Some(Self {
            x: sum_x.div_euclid(count) as i32,
            y: sum_y.div_euclid(count) as i32,
            err_x: half_range(min_x, max_x),
            err_y: half_range(min_y, max_y),
        })
    }
}

/// Calibration points of one physical joystick, keyed by position.
///
/// Partial profiles are legal here; whether a profile is usable is decided
/// by the direction resolver when it derives its thresholds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalibrationProfile {
    points: BTreeMap<Position, CalibrationPoint>,
}

impl CalibrationProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, position: Position, point: CalibrationPoint) {
        self.points.insert(position, point);
    }

    pub fn with(mut self, position: Position, point: CalibrationPoint) -> Self {
        self.insert(position, point);
        self
    }

    pub fn get(&self, position: Position) -> Option<&CalibrationPoint> {
        self.points.get(&position)
    }

    pub fn center(&self) -> Option<&CalibrationPoint> {
        self.get(Position::Center)
    }

    /// Positions that have no captured point
    pub fn missing_positions(&self) -> Vec<Position> {
        Position::ALL
            .iter()
            .copied()
            .filter(|p| !self.points.contains_key(p))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.points.len() == Position::ALL.len()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, &CalibrationPoint)> {
        self.points.iter().map(|(p, c)| (*p, c))
    }
}
