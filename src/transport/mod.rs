//! Line-oriented telemetry transports
//!
//! The sampling loop only needs "give me the next line, if any" and
//! "throw away whatever is buffered". [`LineSource`] captures that, with a
//! reconnecting serial port for real hardware and a scripted source for tests.

pub mod serial;
pub mod mock;

pub use serial::{ReconnectPolicy, SerialSettings, SerialTransport, MAX_LINE_BYTES};
pub use mock::MockLineSource;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("Serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serial port error: {0}")]
    Port(#[from] serialport::Error),

    #[error("Line exceeded {limit} bytes without a newline; discarded")]
    LineTooLong { limit: usize },

    #[error("Transport closed")]
    Closed,
}

/// A source of newline-terminated telemetry lines.
pub trait LineSource {
    /// Read the next complete line.
    ///
    /// `Ok(None)` means no line arrived this tick (timeout, device silent or
    /// reconnecting); it is not an error.
    fn read_line(&mut self) -> Result<Option<String>, TransportError>;

    /// Discard buffered input to resynchronise framing
    fn flush_input(&mut self) -> Result<(), TransportError>;
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        (**self).read_line()
    }

    fn flush_input(&mut self) -> Result<(), TransportError> {
        (**self).flush_input()
    }
}
