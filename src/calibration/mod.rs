//! Joystick calibration
//!
//! A calibration profile records the raw position of a stick at rest and at
//! each of its four extremes. Profiles are captured by an operator-gated
//! procedure, stored as one JSON file per joystick, and loaded when the
//! controller starts.

pub mod profile;
pub mod store;
pub mod procedure;

pub use profile::{CalibrationPoint, CalibrationProfile, Position};
pub use store::CalibrationStore;
pub use procedure::{
    CalibrationOutcome, CalibrationProcedure, CaptureWindow, ImmediateGate, ReadinessGate, StdinGate,
};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("Calibration file not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("Failed to access calibration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse calibration file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize calibration profile: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Calibration profile is missing positions: {missing:?}")]
    Incomplete { missing: Vec<Position> },

    #[error("Calibration aborted: {0}")]
    Aborted(std::io::Error),
}
