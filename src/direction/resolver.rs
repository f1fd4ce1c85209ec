//! Sample → displacement + direction
//!
//! Displacement is measured from the calibrated center, snapped to zero inside
//! the deadzone, then classified against the per-direction thresholds:
//! vertical first, horizontal appended only as a suffix.

use crate::calibration::{CalibrationError, CalibrationPoint, CalibrationProfile, Position};
use crate::direction::types::{Direction, Horizontal, ThresholdSet, Vertical};
use crate::telemetry::RawSample;
use log::trace;
use serde::{Deserialize, Serialize};

/// Raw units around center treated as no movement
pub const DEFAULT_DEADZONE: u32 = 15;

/// Output of one resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Resolved {
    pub dx: i32,
    pub dy: i32,
    pub direction: Direction,
}

/// Tunables that do not come from calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverSettings {
    pub deadzone: u32,
    /// Trust a direction label reported by the device over local classification
    pub prefer_device_direction: bool,
    pub invert_y: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            deadzone: DEFAULT_DEADZONE,
            prefer_device_direction: true,
            invert_y: false,
        }
    }
}

/// Classify one sample against a threshold set and center point.
///
/// Uses the default settings, so a recognised device label wins.
pub fn resolve(raw: &RawSample, thresholds: &ThresholdSet, center: &CalibrationPoint) -> Resolved {
    DirectionResolver::new(*thresholds, *center, ResolverSettings::default()).resolve(raw)
}

fn displacement(raw: &RawSample, center: &CalibrationPoint, deadzone: u32, invert_y: bool) -> (i32, i32) {
    let snap = |delta: i32| if delta.unsigned_abs() < deadzone { 0 } else { delta };

    let dx = snap(raw.x.saturating_sub(center.x));
    let dy = snap(raw.y.saturating_sub(center.y));
    (dx, if invert_y { dy.saturating_neg() } else { dy })
}

fn classify(dx: i32, dy: i32, thresholds: &ThresholdSet) -> Direction {
    let beyond = |value: i32, limit: u32| i64::from(value) > i64::from(limit);

    let vertical = if beyond(-dy, thresholds.up) {
        Some(Vertical::Up)
    } else if beyond(dy, thresholds.down) {
        Some(Vertical::Down)
    } else {
        None
    };

    let horizontal = if beyond(-dx, thresholds.left) {
        Some(Horizontal::Left)
    } else if beyond(dx, thresholds.right) {
        Some(Horizontal::Right)
    } else {
        None
    };

    Direction::compose(vertical, horizontal)
}

/// Resolver bound to one joystick's calibration.
#[derive(Debug, Clone)]
pub struct DirectionResolver {
    thresholds: ThresholdSet,
    center: CalibrationPoint,
    settings: ResolverSettings,
}

impl DirectionResolver {
    pub fn new(thresholds: ThresholdSet, center: CalibrationPoint, settings: ResolverSettings) -> Self {
        Self {
            thresholds,
            center,
            settings,
        }
    }

    /// Build a resolver from a loaded profile.
    ///
    /// Refuses profiles that lack the center or any extreme.
    pub fn from_profile(profile: &CalibrationProfile, settings: ResolverSettings) -> Result<Self, CalibrationError> {
        let thresholds = ThresholdSet::from_profile(profile)?;
        let center = profile
            .center()
            .copied()
            .ok_or_else(|| CalibrationError::Incomplete {
                missing: vec![Position::Center],
            })?;
        Ok(Self::new(thresholds, center, settings))
    }

    pub fn thresholds(&self) -> &ThresholdSet {
        &self.thresholds
    }

    pub fn center(&self) -> &CalibrationPoint {
        &self.center
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn resolve(&self, raw: &RawSample) -> Resolved {
        let (dx, dy) = displacement(raw, &self.center, self.settings.deadzone, self.settings.invert_y);

        let reported = if self.settings.prefer_device_direction {
            raw.direction.as_deref().and_then(|label| match label.parse::<Direction>() {
                Ok(direction) => Some(direction),
                Err(e) => {
                    trace!("{}; classifying locally", e);
                    None
                }
            })
        } else {
            None
        };

        let direction = reported.unwrap_or_else(|| classify(dx, dy, &self.thresholds));
        Resolved { dx, dy, direction }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn center() -> CalibrationPoint {
        CalibrationPoint::new(2048, 2048)
    }

    fn resolver(settings: ResolverSettings) -> DirectionResolver {
        DirectionResolver::new(ThresholdSet::uniform(50), center(), settings)
    }

    #[test]
    fn reference_samples() {
        let thresholds = ThresholdSet::uniform(50);

        let down = resolve(&RawSample::new(2048, 2120), &thresholds, &center());
        assert_eq!(down, Resolved { dx: 0, dy: 72, direction: Direction::Down });

        let left = resolve(&RawSample::new(1950, 2048), &thresholds, &center());
        assert_eq!(left, Resolved { dx: -98, dy: 0, direction: Direction::Left });

        let still = resolve(&RawSample::new(2060, 2000), &thresholds, &center());
        assert_eq!(still, Resolved { dx: 0, dy: -48, direction: Direction::Center });
    }

    #[test]
    fn free_resolve_honours_device_label() {
        let thresholds = ThresholdSet::uniform(50);

        let labelled = resolve(&RawSample::new(2048, 2048).with_direction("Up"), &thresholds, &center());
        assert_eq!(labelled, Resolved { dx: 0, dy: 0, direction: Direction::Up });

        let unknown = resolve(&RawSample::new(2048, 2120).with_direction("Wobble"), &thresholds, &center());
        assert_eq!(unknown.direction, Direction::Down);
    }

    #[test]
    fn deadzone_always_resolves_to_center() {
        // Zero thresholds: anything outside the deadzone would register
        let thresholds = ThresholdSet::uniform(0);
        for dx in -14..=14 {
            for dy in [-14, -7, 0, 7, 14] {
                let resolved = resolve(&RawSample::new(2048 + dx, 2048 + dy), &thresholds, &center());
                assert_eq!(resolved.direction, Direction::Center, "dx={} dy={}", dx, dy);
                assert_eq!((resolved.dx, resolved.dy), (0, 0));
            }
        }

        let edge = resolve(&RawSample::new(2048 + 15, 2048), &thresholds, &center());
        assert_eq!(edge.direction, Direction::Right);
    }

    #[test]
    fn diagonal_puts_vertical_first() {
        let r = resolver(ResolverSettings::default());
        assert_eq!(r.resolve(&RawSample::new(1900, 1900)).direction, Direction::UpLeft);
        assert_eq!(r.resolve(&RawSample::new(2200, 2200)).direction, Direction::DownRight);
        assert_eq!(r.resolve(&RawSample::new(2200, 2048)).direction, Direction::Right);
    }

    #[test]
    fn device_label_takes_precedence() {
        let r = resolver(ResolverSettings::default());
        let sample = RawSample::new(2048, 2048).with_direction("Up-Right");
        let resolved = r.resolve(&sample);
        assert_eq!(resolved.direction, Direction::UpRight);
        assert_eq!((resolved.dx, resolved.dy), (0, 0));
    }

    #[test]
    fn unknown_device_label_falls_back() {
        let r = resolver(ResolverSettings::default());
        let sample = RawSample::new(2048, 2200).with_direction("Wobble");
        assert_eq!(r.resolve(&sample).direction, Direction::Down);

        let placeholder = RawSample::new(1900, 2048).with_direction("None");
        assert_eq!(r.resolve(&placeholder).direction, Direction::Left);
    }

    #[test]
    fn device_label_can_be_ignored() {
        let r = resolver(ResolverSettings {
            prefer_device_direction: false,
            ..ResolverSettings::default()
        });
        let sample = RawSample::new(2048, 2048).with_direction("Left");
        assert_eq!(r.resolve(&sample).direction, Direction::Center);
    }

    #[test]
    fn inverted_y_flips_vertical() {
        let r = resolver(ResolverSettings {
            invert_y: true,
            ..ResolverSettings::default()
        });
        let resolved = r.resolve(&RawSample::new(2048, 2120));
        assert_eq!(resolved.dy, -72);
        assert_eq!(resolved.direction, Direction::Up);
    }

    #[test]
    fn profile_without_center_is_refused() {
        let profile = CalibrationProfile::new()
            .with(Position::Up, CalibrationPoint::new(2048, 0))
            .with(Position::Down, CalibrationPoint::new(2048, 4095))
            .with(Position::Left, CalibrationPoint::new(0, 2048))
            .with(Position::Right, CalibrationPoint::new(4095, 2048));

        let err = DirectionResolver::from_profile(&profile, ResolverSettings::default()).unwrap_err();
        assert!(matches!(err, CalibrationError::Incomplete { .. }));
    }

    #[test]
    fn profile_builds_working_resolver() {
        let profile = CalibrationProfile::new()
            .with(Position::Center, CalibrationPoint::new(2048, 2048))
            .with(Position::Up, CalibrationPoint::new(2048, 1948))
            .with(Position::Down, CalibrationPoint::new(2048, 2148))
            .with(Position::Left, CalibrationPoint::new(1948, 2048))
            .with(Position::Right, CalibrationPoint::new(2148, 2048));

        let r = DirectionResolver::from_profile(&profile, ResolverSettings::default()).unwrap();
        assert_eq!(r.thresholds(), &ThresholdSet::uniform(50));
        assert_eq!(r.resolve(&RawSample::new(2048, 2120)).direction, Direction::Down);
    }
}
