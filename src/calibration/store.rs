//! Calibration file storage
//!
//! One human-readable JSON document per joystick. Saving overwrites the
//! whole file; there is no partial merge.

use crate::calibration::profile::CalibrationProfile;
use crate::calibration::CalibrationError;
use crate::telemetry::JoystickId;
use log::{debug, info};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File name used when only one joystick is configured
const SINGLE_FILENAME: &str = "calibration_data.json";

/// Directory-backed calibration storage
#[derive(Debug, Clone)]
pub struct CalibrationStore {
    directory: PathBuf,
    multi_stick: bool,
}

impl CalibrationStore {
    /// `stick_count > 1` switches to one file per joystick identity
    pub fn new(directory: impl Into<PathBuf>, stick_count: usize) -> Self {
        Self {
            directory: directory.into(),
            multi_stick: stick_count > 1,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the calibration file for a joystick
    pub fn path_for(&self, joystick: JoystickId) -> PathBuf {
        if self.multi_stick {
            self.directory.join(format!("calibration_data_joy{}.json", joystick.0))
        } else {
            self.directory.join(SINGLE_FILENAME)
        }
    }

    /// Write a profile, replacing any previous file
    pub fn save(&self, joystick: JoystickId, profile: &CalibrationProfile) -> Result<PathBuf, CalibrationError> {
        let path = self.path_for(joystick);

        if !self.directory.as_os_str().is_empty() {
            fs::create_dir_all(&self.directory).map_err(|source| CalibrationError::Io {
                path: self.directory.clone(),
                source,
            })?;
        }

        let content = serde_json::to_string_pretty(profile)?;
        fs::write(&path, content).map_err(|source| CalibrationError::Io {
            path: path.clone(),
            source,
        })?;

        info!("Saved calibration for {} to: {}", joystick, path.display());
        Ok(path)
    }

    /// Load a profile from disk
    pub fn load(&self, joystick: JoystickId) -> Result<CalibrationProfile, CalibrationError> {
        let path = self.path_for(joystick);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CalibrationError::Missing { path });
            }
            Err(source) => return Err(CalibrationError::Io { path, source }),
        };

        let profile: CalibrationProfile =
            serde_json::from_str(&content).map_err(|source| CalibrationError::Parse {
                path: path.clone(),
                source,
            })?;

        debug!(
            "Loaded calibration for {} from {} ({} positions)",
            joystick,
            path.display(),
            profile.len()
        );
        Ok(profile)
    }
}
