//! Telemetry line grammar
//!
//! The firmware prints lines such as
//!
//! ```text
//! Raw X: 1954, Y: 1887 | Direction: Center
//! Joystick 2 X: 2051 | Y: 1990
//! ```
//!
//! Only the `X:` and `Y:` integers are required. Anything around them is
//! ignored, and `Direction:` is optional. Parsing never fails loudly: a line
//! that does not match yields `None`.

use crate::telemetry::types::{JoystickId, RawSample};

const X_LABEL: &str = "X:";
const Y_LABEL: &str = "Y:";
const DIRECTION_LABEL: &str = "Direction:";
const STICK_MARKER: &str = "Joystick";

/// A wire format for joystick telemetry.
///
/// Swapping the format (e.g. for a binary frame) only requires a new
/// implementation of this trait.
pub trait TelemetryFormat {
    /// Parse one decoded line
    fn parse(&self, line: &str) -> Option<RawSample>;

    /// Which joystick a line belongs to, for multi-stick devices
    fn route(&self, line: &str) -> Option<JoystickId>;

    /// Parse raw bytes, decoding lossily so framing garbage never surfaces as an error
    fn parse_bytes(&self, bytes: &[u8]) -> Option<RawSample> {
        let line = String::from_utf8_lossy(bytes);
        self.parse(line.trim())
    }
}

/// The plain-text `X: <int> ... Y: <int> [... Direction: <word>]` format.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLineFormat;

impl TextLineFormat {
    pub fn new() -> Self {
        Self
    }
}

impl TelemetryFormat for TextLineFormat {
    fn parse(&self, line: &str) -> Option<RawSample> {
        let (x, after_x) = labelled_int(line, X_LABEL)?;
        let (y, _) = labelled_int(&line[after_x..], Y_LABEL)?;
        let direction = labelled_word(line, DIRECTION_LABEL);
        Some(RawSample { x, y, direction })
    }

    fn route(&self, line: &str) -> Option<JoystickId> {
        let rest = line.trim_start().strip_prefix(STICK_MARKER)?;
        let (number, _) = leading_int(rest)?;
        match u8::try_from(number) {
            Ok(n) if n > 0 => Some(JoystickId(n)),
            _ => None,
        }
    }
}

/// Find the first `label` followed by an integer; returns the value and the
/// byte offset just past it.
fn labelled_int(line: &str, label: &str) -> Option<(i32, usize)> {
    let mut from = 0;
    while let Some(pos) = line[from..].find(label) {
        let start = from + pos + label.len();
        if let Some((value, len)) = leading_int(&line[start..]) {
            return Some((value, start + len));
        }
        from = start;
    }
    None
}

/// Parse an optionally signed integer at the start of `s`, skipping leading whitespace.
fn leading_int(s: &str) -> Option<(i32, usize)> {
    let trimmed = s.trim_start();
    let skipped = s.len() - trimmed.len();
    let bytes = trimmed.as_bytes();

    let sign = usize::from(bytes.first() == Some(&b'-'));
    let digits = bytes[sign..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }

    let end = sign + digits;
    trimmed[..end].parse().ok().map(|value| (value, skipped + end))
}

fn labelled_word(line: &str, label: &str) -> Option<String> {
    let pos = line.find(label)?;
    let word: String = line[pos + label.len()..]
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();

    if word.is_empty() {
        None
    } else {
        Some(word)
    }
}
