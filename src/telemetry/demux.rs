//! Multi-stick line demultiplexer
//!
//! Dual-stick firmware prints one line per stick per cycle, each prefixed with
//! `Joystick <n>`. The demultiplexer groups consecutive lines into a frame of
//! one optional sample per stick, independent of the order the lines arrive in.
//! The pending frame is the only state carried between lines.

use crate::telemetry::parser::TelemetryFormat;
use crate::telemetry::types::{JoystickId, RawSample};
use log::trace;

/// One sample slot per configured stick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StickFrame {
    samples: Vec<Option<RawSample>>,
}

impl StickFrame {
    pub(crate) fn from_samples(samples: Vec<Option<RawSample>>) -> Self {
        Self { samples }
    }

    pub fn get(&self, id: JoystickId) -> Option<&RawSample> {
        self.samples.get(id.index()).and_then(Option::as_ref)
    }

    /// True when every stick produced a sample
    pub fn is_complete(&self) -> bool {
        self.samples.iter().all(Option::is_some)
    }

    /// Number of sticks that produced no sample in this frame
    pub fn missing(&self) -> usize {
        self.samples.iter().filter(|s| s.is_none()).count()
    }

    pub fn into_samples(self) -> Vec<Option<RawSample>> {
        self.samples
    }
}

/// Groups `stick_count` consecutive lines into a [`StickFrame`].
pub struct MultiStickDemux<F: TelemetryFormat> {
    format: F,
    pending: Vec<Option<RawSample>>,
    lines_seen: usize,
}

impl<F: TelemetryFormat> MultiStickDemux<F> {
    pub fn new(format: F, stick_count: usize) -> Self {
        let stick_count = stick_count.max(1);
        Self {
            format,
            pending: vec![None; stick_count],
            lines_seen: 0,
        }
    }

    pub fn stick_count(&self) -> usize {
        self.pending.len()
    }

    /// Feed one line; returns a frame once `stick_count` lines have been seen.
    pub fn push(&mut self, line: &str) -> Option<StickFrame> {
        self.lines_seen += 1;

        match self.format.route(line) {
            Some(id) if id.index() < self.pending.len() => {
                if let Some(sample) = self.format.parse(line) {
                    self.pending[id.index()] = Some(sample);
                } else {
                    trace!("Unparseable line for {}: {:?}", id, line);
                }
            }
            Some(id) => trace!("Ignoring line for unconfigured {}", id),
            None => trace!("Ignoring line without stick marker: {:?}", line),
        }

        if self.lines_seen < self.pending.len() {
            return None;
        }

        Some(self.take_frame())
    }

    /// Drop any half-assembled frame (used after the transport resynchronises)
    pub fn reset(&mut self) {
        self.pending.iter_mut().for_each(|slot| *slot = None);
        self.lines_seen = 0;
    }

    fn take_frame(&mut self) -> StickFrame {
        let samples = self.pending.iter_mut().map(Option::take).collect();
        self.lines_seen = 0;
        StickFrame { samples }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::parser::TextLineFormat;

    #[test]
    fn frame_is_order_independent() {
        let mut demux = MultiStickDemux::new(TextLineFormat, 2);

        assert!(demux.push("Joystick 2 X: 20 Y: 21").is_none());
        let frame = demux.push("Joystick 1 X: 10 Y: 11 Direction: Up").unwrap();

        assert!(frame.is_complete());
        assert_eq!(frame.get(JoystickId::FIRST), Some(&RawSample::new(10, 11).with_direction("Up")));
        assert_eq!(frame.get(JoystickId::SECOND), Some(&RawSample::new(20, 21)));
    }

    #[test]
    fn garbled_line_leaves_slot_empty_and_does_not_leak() {
        let mut demux = MultiStickDemux::new(TextLineFormat, 2);

        assert!(demux.push("Joystick 1 X: 10 Y: 11").is_none());
        let frame = demux.push("Joyst\u{fffd}ck 2 X: 2").unwrap();
        assert_eq!(frame.missing(), 1);
        assert!(frame.get(JoystickId::SECOND).is_none());

        // Next frame starts clean
        assert!(demux.push("Joystick 2 X: 5 Y: 6").is_none());
        let frame = demux.push("noise").unwrap();
        assert!(frame.get(JoystickId::FIRST).is_none());
        assert_eq!(frame.get(JoystickId::SECOND), Some(&RawSample::new(5, 6)));
    }

    #[test]
    fn single_stick_demux_emits_every_line() {
        let mut demux = MultiStickDemux::new(TextLineFormat, 1);
        let frame = demux.push("Joystick 1 X: 1 Y: 2").unwrap();
        assert!(frame.is_complete());
    }

    #[test]
    fn reset_discards_pending() {
        let mut demux = MultiStickDemux::new(TextLineFormat, 2);
        demux.push("Joystick 1 X: 1 Y: 2");
        demux.reset();
        assert!(demux.push("Joystick 2 X: 3 Y: 4").is_none());
        let frame = demux.push("junk").unwrap();
        assert!(frame.get(JoystickId::FIRST).is_none());
    }
}
