//! Reconnecting serial transport
//!
//! Owns the serial port exclusively. Reads use a short timeout so the
//! sampling loop never blocks on a silent device, lines are capped at
//! [`MAX_LINE_BYTES`], and bytes are decoded lossily. When the port is missing or fails, the transport reopens it
//! following a [`ReconnectPolicy`] and never gives up for good.

use crate::transport::{LineSource, TransportError};
use log::{debug, info, warn};
use serialport::{ClearBuffer, SerialPort};
use std::io::{self, BufRead, BufReader, ErrorKind};
use std::thread;
use std::time::Duration;

/// Longest line kept while waiting for a newline
pub const MAX_LINE_BYTES: usize = 512;

/// Result of pulling bytes towards the next newline
#[derive(Debug, PartialEq, Eq)]
enum LineProgress {
    /// `partial` now ends with a newline
    Complete,
    /// Timed out before a newline; `partial` is kept
    Pending,
    /// `partial` grew past the limit and was discarded
    Overflow,
    /// End of stream
    Eof,
}

/// Like `read_until(b'\n')`, but stops once `partial` exceeds `limit`.
fn read_bounded<R: BufRead>(reader: &mut R, partial: &mut Vec<u8>, limit: usize) -> io::Result<LineProgress> {
    loop {
        let available = match reader.fill_buf() {
            Ok(available) => available,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                return Ok(LineProgress::Pending);
            }
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            return Ok(LineProgress::Eof);
        }

        let (taken, complete) = match available.iter().position(|&b| b == b'\n') {
            Some(end) => (end + 1, true),
            None => (available.len(), false),
        };
        partial.extend_from_slice(&available[..taken]);
        reader.consume(taken);

        if partial.len() > limit {
            partial.clear();
            return Ok(LineProgress::Overflow);
        }
        if complete {
            return Ok(LineProgress::Complete);
        }
    }
}

/// Bounded retry with backoff, then a longer cool-down before starting over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
    pub cooldown: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
            cooldown: Duration::from_secs(5),
        }
    }
}

/// Attempt bookkeeping for a [`ReconnectPolicy`].
#[derive(Debug, Clone)]
pub struct Reconnector {
    policy: ReconnectPolicy,
    attempts: u32,
}

impl Reconnector {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self { policy, attempts: 0 }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether another open attempt is allowed right now
    pub fn may_attempt(&self) -> bool {
        self.attempts < self.policy.max_attempts
    }

    /// Record a failed open; returns how long to wait before the next attempt
    pub fn on_failure(&mut self) -> Duration {
        self.attempts += 1;
        self.policy.backoff
    }

    /// All attempts used up: returns the cool-down and resets the counter
    pub fn cool_down(&mut self) -> Duration {
        self.attempts = 0;
        self.policy.cooldown
    }

    pub fn on_success(&mut self) {
        self.attempts = 0;
    }
}

/// Serial line parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout: Duration,
    pub policy: ReconnectPolicy,
}

/// Serial port transport producing telemetry lines.
pub struct SerialTransport {
    settings: SerialSettings,
    reader: Option<BufReader<Box<dyn SerialPort>>>,
    reconnector: Reconnector,
    /// Bytes of a line interrupted by a read timeout
    partial: Vec<u8>,
}

impl SerialTransport {
    /// Create a transport that opens the port lazily on first read
    pub fn new(settings: SerialSettings) -> Self {
        let reconnector = Reconnector::new(settings.policy);
        Self {
            settings,
            reader: None,
            reconnector,
            partial: Vec::new(),
        }
    }

    /// Create a transport and open the port immediately
    pub fn open(settings: SerialSettings) -> Result<Self, TransportError> {
        let mut transport = Self::new(settings);
        let port = transport.open_port()?;
        transport.attach(port);
        Ok(transport)
    }

    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    fn open_port(&self) -> Result<Box<dyn SerialPort>, TransportError> {
        serialport::new(self.settings.port.as_str(), self.settings.baud_rate)
            .timeout(self.settings.read_timeout)
            .open()
            .map_err(|source| TransportError::Open {
                port: self.settings.port.clone(),
                source,
            })
    }

    fn attach(&mut self, port: Box<dyn SerialPort>) {
        info!("✓ Opened {} at {} baud", self.settings.port, self.settings.baud_rate);
        self.reader = Some(BufReader::new(port));
        self.partial.clear();
        self.reconnector.on_success();
    }

    fn detach(&mut self) {
        if self.reader.take().is_some() {
            warn!("Serial port {} closed", self.settings.port);
        }
        self.partial.clear();
    }

    /// Make sure the port is open, following the reconnect policy.
    /// Sleeps for the backoff or cool-down when an attempt is not possible.
    fn ensure_open(&mut self) -> bool {
        if self.reader.is_some() {
            return true;
        }

        if !self.reconnector.may_attempt() {
            let pause = self.reconnector.cool_down();
            warn!(
                "Max reconnects reached for {}. Check hardware; retrying in {:?}",
                self.settings.port, pause
            );
            thread::sleep(pause);
            return false;
        }

        match self.open_port() {
            Ok(port) => {
                self.attach(port);
                true
            }
            Err(e) => {
                let wait = self.reconnector.on_failure();
                warn!(
                    "{} (attempt {}/{})",
                    e,
                    self.reconnector.attempts(),
                    self.settings.policy.max_attempts
                );
                thread::sleep(wait);
                false
            }
        }
    }
}

impl LineSource for SerialTransport {
    fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        if !self.ensure_open() {
            return Ok(None);
        }

        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        match read_bounded(reader, &mut self.partial, MAX_LINE_BYTES) {
            Ok(LineProgress::Complete) => {
                let line = String::from_utf8_lossy(&self.partial).trim().to_string();
                self.partial.clear();
                if line.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(line))
                }
            }
            Ok(LineProgress::Pending) => {
                debug!("Serial read timed out ({} partial bytes kept)", self.partial.len());
                Ok(None)
            }
            Ok(LineProgress::Overflow) => Err(TransportError::LineTooLong { limit: MAX_LINE_BYTES }),
            Ok(LineProgress::Eof) => {
                self.detach();
                Err(TransportError::Closed)
            }
            Err(e) => {
                self.detach();
                Err(TransportError::Io(e))
            }
        }
    }

    fn flush_input(&mut self) -> Result<(), TransportError> {
        self.partial.clear();
        if let Some(reader) = self.reader.as_mut() {
            let buffered = reader.buffer().len();
            reader.consume(buffered);
            reader.get_ref().clear(ClearBuffer::Input)?;
            debug!("Flushed serial input ({} buffered bytes dropped)", buffered);
        }
        Ok(())
    }
}
