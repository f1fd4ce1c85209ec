//! Frame reader
//!
//! Pulls lines from a [`LineSource`] and turns them into [`StickFrame`]s.
//! A single-stick device sends bare lines; a multi-stick device sends one
//! `Joystick <n>` line per stick that is demultiplexed into one frame.

use crate::telemetry::demux::{MultiStickDemux, StickFrame};
use crate::telemetry::parser::TelemetryFormat;
use crate::transport::{LineSource, TransportError};
use log::trace;

/// Outcome of one read attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameRead {
    /// A frame was assembled (possibly with missing sticks)
    Frame(StickFrame),

    /// A line arrived but did not match the grammar
    Malformed,

    /// Nothing arrived this tick
    Idle,
}

enum Layout<F: TelemetryFormat> {
    Single(F),
    Multi(MultiStickDemux<F>),
}

/// Reads telemetry frames for a fixed number of sticks.
pub struct FrameReader<F: TelemetryFormat> {
    layout: Layout<F>,
}

impl<F: TelemetryFormat> FrameReader<F> {
    /// `stick_count == 1` reads bare lines; anything larger demultiplexes by stick marker
    pub fn new(format: F, stick_count: usize) -> Self {
        let layout = if stick_count <= 1 {
            Layout::Single(format)
        } else {
            Layout::Multi(MultiStickDemux::new(format, stick_count))
        };
        Self { layout }
    }

    pub fn stick_count(&self) -> usize {
        match &self.layout {
            Layout::Single(_) => 1,
            Layout::Multi(demux) => demux.stick_count(),
        }
    }

    pub fn read_frame<S: LineSource + ?Sized>(&mut self, source: &mut S) -> Result<FrameRead, TransportError> {
        match &mut self.layout {
            Layout::Single(format) => {
                let Some(line) = source.read_line()? else {
                    return Ok(FrameRead::Idle);
                };
                match format.parse(&line) {
                    Some(sample) => Ok(FrameRead::Frame(StickFrame::from_samples(vec![Some(sample)]))),
                    None => {
                        trace!("No match: {:?}", line);
                        Ok(FrameRead::Malformed)
                    }
                }
            }
            Layout::Multi(demux) => loop {
                let Some(line) = source.read_line()? else {
                    return Ok(FrameRead::Idle);
                };
                if let Some(frame) = demux.push(&line) {
                    return Ok(FrameRead::Frame(frame));
                }
            },
        }
    }

    /// Forget any half-assembled frame
    pub fn reset(&mut self) {
        if let Layout::Multi(demux) = &mut self.layout {
            demux.reset();
        }
    }
}
