//! Configuration loader and validator
//!
//! Loads bridge settings from a TOML file (`configs/default.toml` by default).
//! Every field has a default so partial files are fine.

use crate::calibration::CaptureWindow;
use crate::direction::{ResolverSettings, DEFAULT_DEADZONE};
use crate::emitter::{ControlMode, DiagonalMapping, DirectionMap, InputSymbol, DEFAULT_POINTER_SCALE};
use crate::telemetry::JoystickId;
use crate::transport::{ReconnectPolicy, SerialSettings};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "configs/default.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub sampling: SamplingConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub calibration: CalibrationConfig,

    #[serde(default)]
    pub control: ControlConfig,

    #[serde(default)]
    pub broadcast: BroadcastConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    #[serde(default = "default_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    #[serde(default = "default_reconnect_backoff_ms")]
    pub reconnect_backoff_ms: u64,

    #[serde(default = "default_reconnect_cooldown_ms")]
    pub reconnect_cooldown_ms: u64,

    /// Consecutive unparseable lines before the input buffer is flushed
    #[serde(default = "default_max_parse_errors")]
    pub max_parse_errors: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_backoff_ms: default_reconnect_backoff_ms(),
            reconnect_cooldown_ms: default_reconnect_cooldown_ms(),
            max_parse_errors: default_max_parse_errors(),
        }
    }
}

/// How many sticks the firmware reports per cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Single,
    Dual,
}

impl Layout {
    pub fn stick_count(self) -> usize {
        match self {
            Layout::Single => 1,
            Layout::Dual => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub layout: Layout,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            layout: Layout::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_deadzone")]
    pub deadzone: u32,

    #[serde(default = "default_true")]
    pub prefer_device_direction: bool,

    #[serde(default)]
    pub invert_y: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            deadzone: default_deadzone(),
            prefer_device_direction: true,
            invert_y: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Directory holding the calibration JSON files
    #[serde(default = "default_calibration_dir")]
    pub directory: PathBuf,

    #[serde(default = "default_capture_ms")]
    pub capture_ms: u64,

    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            directory: default_calibration_dir(),
            capture_ms: default_capture_ms(),
            sample_interval_ms: default_sample_interval_ms(),
        }
    }
}

/// Cardinal bindings for one joystick; unset fields stay unbound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeymapConfig {
    #[serde(default)]
    pub up: Option<String>,
    #[serde(default)]
    pub down: Option<String>,
    #[serde(default)]
    pub left: Option<String>,
    #[serde(default)]
    pub right: Option<String>,
}

impl KeymapConfig {
    fn to_map(&self, diagonal: DiagonalMapping) -> Result<DirectionMap, ConfigError> {
        let parse = |binding: &Option<String>| -> Result<Option<InputSymbol>, ConfigError> {
            binding
                .as_deref()
                .map(|name| {
                    name.parse::<InputSymbol>()
                        .map_err(|e| ConfigError::Invalid(format!("keymap binding '{}': {}", name, e)))
                })
                .transpose()
        };

        Ok(DirectionMap {
            up: parse(&self.up)?,
            down: parse(&self.down)?,
            left: parse(&self.left)?,
            right: parse(&self.right)?,
            diagonal,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    #[serde(default)]
    pub mode: ControlMode,

    #[serde(default = "default_pointer_scale")]
    pub pointer_scale: f64,

    /// Joystick number (1-based) that drives the pointer in mouse mode
    #[serde(default = "default_pointer_joystick")]
    pub pointer_joystick: u8,

    #[serde(default)]
    pub diagonal: DiagonalMapping,

    /// Per-joystick bindings; the mode's built-in maps are used when empty
    #[serde(default)]
    pub keymaps: Vec<KeymapConfig>,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            mode: ControlMode::default(),
            pointer_scale: default_pointer_scale(),
            pointer_joystick: default_pointer_joystick(),
            diagonal: DiagonalMapping::default(),
            keymaps: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: default_bind(),
        }
    }
}

fn default_port() -> String { "COM10".to_string() }
fn default_baud_rate() -> u32 { 115_200 }
fn default_read_timeout_ms() -> u64 { 100 }
fn default_max_reconnect_attempts() -> u32 { 3 }
fn default_reconnect_backoff_ms() -> u64 { 1_000 }
fn default_reconnect_cooldown_ms() -> u64 { 5_000 }
fn default_max_parse_errors() -> u32 { 5 }
fn default_poll_interval_ms() -> u64 { 50 }
fn default_deadzone() -> u32 { DEFAULT_DEADZONE }
fn default_true() -> bool { true }
fn default_calibration_dir() -> PathBuf { PathBuf::from(".") }
fn default_capture_ms() -> u64 { 2_000 }
fn default_sample_interval_ms() -> u64 { 50 }
fn default_pointer_scale() -> f64 { DEFAULT_POINTER_SCALE }
fn default_pointer_joystick() -> u8 { 1 }
fn default_bind() -> String { "0.0.0.0:8765".to_string() }

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        info!("Loading configuration from: {}", path_ref.display());

        let content = std::fs::read_to_string(path_ref)?;
        let config = Self::from_toml(&content)?;
        info!("✓ Config validation passed");
        Ok(config)
    }

    /// Load default configuration from configs/default.toml
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(DEFAULT_CONFIG_PATH)
    }

    /// Parse and validate TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;

        debug!("  - Serial: {} @ {} baud", config.serial.port, config.serial.baud_rate);
        debug!("  - Layout: {:?}, mode: {}", config.sampling.layout, config.control.mode);
        debug!("  - Broadcast: {} ({})", config.broadcast.bind, config.broadcast.enabled);

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serial.port.trim().is_empty() {
            return Err(ConfigError::Invalid("serial.port must not be empty".into()));
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::Invalid("serial.baud_rate must be positive".into()));
        }
        if self.serial.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid("serial.read_timeout_ms must be positive".into()));
        }
        if self.serial.max_reconnect_attempts == 0 {
            return Err(ConfigError::Invalid("serial.max_reconnect_attempts must be at least 1".into()));
        }
        if self.sampling.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("sampling.poll_interval_ms must be positive".into()));
        }
        if self.calibration.sample_interval_ms == 0 {
            return Err(ConfigError::Invalid("calibration.sample_interval_ms must be positive".into()));
        }
        if self.calibration.capture_ms < self.calibration.sample_interval_ms {
            return Err(ConfigError::Invalid(
                "calibration.capture_ms must cover at least one sample interval".into(),
            ));
        }
        if !self.control.pointer_scale.is_finite() || self.control.pointer_scale <= 0.0 {
            return Err(ConfigError::Invalid("control.pointer_scale must be a positive number".into()));
        }

        let sticks = self.stick_count();
        if self.control.pointer_joystick == 0 || usize::from(self.control.pointer_joystick) > sticks {
            return Err(ConfigError::Invalid(format!(
                "control.pointer_joystick must be in 1..={}",
                sticks
            )));
        }
        if self.control.keymaps.len() > sticks {
            warn!(
                "{} keymaps configured for {} joystick(s); extra keymaps are ignored",
                self.control.keymaps.len(),
                sticks
            );
        }
        for keymap in &self.control.keymaps {
            keymap.to_map(self.control.diagonal)?;
        }

        if self.broadcast.enabled {
            self.broadcast_addr()?;
        }

        Ok(())
    }

    pub fn stick_count(&self) -> usize {
        self.sampling.layout.stick_count()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.sampling.poll_interval_ms)
    }

    pub fn serial_settings(&self) -> SerialSettings {
        SerialSettings {
            port: self.serial.port.clone(),
            baud_rate: self.serial.baud_rate,
            read_timeout: Duration::from_millis(self.serial.read_timeout_ms),
            policy: ReconnectPolicy {
                max_attempts: self.serial.max_reconnect_attempts,
                backoff: Duration::from_millis(self.serial.reconnect_backoff_ms),
                cooldown: Duration::from_millis(self.serial.reconnect_cooldown_ms),
            },
        }
    }

    pub fn capture_window(&self) -> CaptureWindow {
        CaptureWindow::from_duration(
            Duration::from_millis(self.calibration.capture_ms),
            Duration::from_millis(self.calibration.sample_interval_ms),
        )
    }

    pub fn pointer_stick(&self) -> JoystickId {
        JoystickId(self.control.pointer_joystick)
    }

    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            deadzone: self.resolver.deadzone,
            prefer_device_direction: self.resolver.prefer_device_direction,
            invert_y: self.resolver.invert_y,
        }
    }

    /// One map per configured joystick.
    ///
    /// Keymaps only apply to the key modes; mouse modes keep their built-in map.
    pub fn direction_maps(&self) -> Result<Vec<DirectionMap>, ConfigError> {
        let mode = self.control.mode;
        (0..self.stick_count())
            .map(|index| match self.control.keymaps.get(index) {
                Some(keymap) if mode.uses_keymaps() => keymap.to_map(self.control.diagonal),
                _ => Ok(mode.default_map(index).with_diagonal(self.control.diagonal)),
            })
            .collect()
    }

    pub fn broadcast_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.broadcast
            .bind
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("broadcast.bind '{}': {}", self.broadcast.bind, e)))
    }
}
