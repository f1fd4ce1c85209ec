//! Direction resolution
//!
//! Converts raw samples into a centered displacement and one of nine compass
//! directions, using thresholds derived from a calibration profile.

pub mod types;
pub mod resolver;

pub use types::{Direction, Horizontal, ThresholdSet, Vertical};
pub use resolver::{resolve, DirectionResolver, Resolved, ResolverSettings, DEFAULT_DEADZONE};
