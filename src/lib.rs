//! stick-bridge: serial joystick to keyboard/mouse and WebSocket bridge
//!
//! Reads joystick telemetry lines from a serial device, resolves each sample
//! into a displacement and compass direction using a stored calibration, then
//! drives injected keyboard/mouse input and broadcasts the live state to
//! WebSocket subscribers.

pub mod backend;
pub mod bridge;
pub mod broadcast;
pub mod calibration;
pub mod config;
pub mod direction;
pub mod emitter;
pub mod telemetry;
pub mod transport;

// Re-export commonly used items
pub use backend::{KeyboardBackend, MouseBackend};
pub use bridge::{load_resolvers, Bridge, BridgeError, BridgeSettings, BridgeStats};
pub use broadcast::{BroadcastHub, BroadcastServer, Payload};
pub use calibration::{CalibrationProcedure, CalibrationProfile, CalibrationStore};
pub use config::Config;
pub use direction::{Direction, DirectionResolver, Resolved};
pub use emitter::{ControlMode, InputEmitter};
pub use telemetry::{FrameReader, JoystickId, RawSample, TextLineFormat};
pub use transport::{LineSource, SerialTransport};
