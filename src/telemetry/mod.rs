//! Joystick telemetry
//!
//! Turns raw text lines from the microcontroller into typed samples.
//! The line grammar lives behind [`TelemetryFormat`] so the resolver and the
//! emitter never see the wire format.

pub mod types;
pub mod parser;
pub mod demux;
pub mod reader;

pub use types::{JoystickId, RawSample};
pub use parser::{TelemetryFormat, TextLineFormat};
pub use demux::{MultiStickDemux, StickFrame};
pub use reader::{FrameRead, FrameReader};
