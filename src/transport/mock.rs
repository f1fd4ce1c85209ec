//! Mock line source for testing.
//!
//! Replays a scripted list of lines instead of reading a serial port, with
//! read timeouts and overlong lines mixed in. Once the script runs out every
//! read returns `Ok(None)`.

use crate::transport::{LineSource, TransportError};
use log::debug;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
enum Scripted {
    Line(String),
    Timeout,
    Overlong(usize),
}

/// Scripted line source.
#[derive(Debug, Clone, Default)]
pub struct MockLineSource {
    lines: VecDeque<Scripted>,
    flushes: usize,
}

impl MockLineSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from lines that all arrive
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(|l| Scripted::Line(l.into())).collect(),
            flushes: 0,
        }
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push_back(Scripted::Line(line.into()));
    }

    /// Queue a read that times out
    pub fn push_timeout(&mut self) {
        self.lines.push_back(Scripted::Timeout);
    }

    /// Queue a run of bytes longer than `limit` with no newline
    pub fn push_overlong(&mut self, limit: usize) {
        self.lines.push_back(Scripted::Overlong(limit));
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }

    /// How many times `flush_input` was called
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl LineSource for MockLineSource {
    fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        match self.lines.pop_front() {
            Some(Scripted::Line(line)) => Ok(Some(line)),
            Some(Scripted::Overlong(limit)) => Err(TransportError::LineTooLong { limit }),
            Some(Scripted::Timeout) | None => Ok(None),
        }
    }

    fn flush_input(&mut self) -> Result<(), TransportError> {
        debug!("[MOCK SERIAL] Flush input ({} queued lines kept)", self.lines.len());
        self.flushes += 1;
        Ok(())
    }
}
