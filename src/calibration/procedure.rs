//! Calibration procedure
//!
//! For every position the operator first confirms the stick is settled, then
//! samples are collected for a fixed window and averaged into a
//! [`CalibrationPoint`]. A position that yields no samples is reported as
//! unresolved and the rest of the profile is still written.

use crate::calibration::profile::{CalibrationPoint, CalibrationProfile, Position};
use crate::calibration::store::CalibrationStore;
use crate::calibration::CalibrationError;
use crate::telemetry::{FrameRead, FrameReader, JoystickId, TelemetryFormat};
use crate::transport::LineSource;
use log::{debug, info, warn};
use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

/// How many samples to take per position and how far apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureWindow {
    pub samples: usize,
    pub interval: Duration,
}

impl CaptureWindow {
    /// Window covering `duration` at one sample per `interval`
    pub fn from_duration(duration: Duration, interval: Duration) -> Self {
        let samples = if interval.is_zero() {
            1
        } else {
            (duration.as_millis() / interval.as_millis().max(1)).max(1) as usize
        };
        Self { samples, interval }
    }
}

impl Default for CaptureWindow {
    /// Two seconds at ~20 Hz
    fn default() -> Self {
        Self::from_duration(Duration::from_secs(2), Duration::from_millis(50))
    }
}

/// Blocks until the operator says the stick is held steady at a position.
pub trait ReadinessGate {
    fn wait_ready(&mut self, joystick: JoystickId, position: Position) -> io::Result<()>;
}

/// Prompts on stdout and waits for ENTER on stdin.
#[derive(Debug, Default)]
pub struct StdinGate;

impl ReadinessGate for StdinGate {
    fn wait_ready(&mut self, joystick: JoystickId, position: Position) -> io::Result<()> {
        print!("Move {} to {}. Press ENTER when steady...", joystick, position);
        io::stdout().flush()?;

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
        }
        Ok(())
    }
}

/// Starts every capture immediately (tests, scripted runs).
#[derive(Debug, Default)]
pub struct ImmediateGate {
    pub prompts: Vec<(JoystickId, Position)>,
}

impl ReadinessGate for ImmediateGate {
    fn wait_ready(&mut self, joystick: JoystickId, position: Position) -> io::Result<()> {
        self.prompts.push((joystick, position));
        Ok(())
    }
}

/// Result of calibrating one joystick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationOutcome {
    pub joystick: JoystickId,
    pub profile: CalibrationProfile,
    /// Positions for which no sample arrived
    pub unresolved: Vec<Position>,
}

/// Runs the capture over a telemetry source.
pub struct CalibrationProcedure<'a, S: LineSource, F: TelemetryFormat> {
    source: &'a mut S,
    reader: FrameReader<F>,
    window: CaptureWindow,
}

impl<'a, S: LineSource, F: TelemetryFormat> CalibrationProcedure<'a, S, F> {
    pub fn new(source: &'a mut S, format: F, stick_count: usize, window: CaptureWindow) -> Self {
        Self {
            source,
            reader: FrameReader::new(format, stick_count),
            window,
        }
    }

    /// Capture every position of one joystick
    pub fn capture<G: ReadinessGate>(
        &mut self,
        joystick: JoystickId,
        gate: &mut G,
    ) -> Result<CalibrationOutcome, CalibrationError> {
        let mut profile = CalibrationProfile::new();
        let mut unresolved = Vec::new();

        for position in Position::ALL {
            gate.wait_ready(joystick, position).map_err(CalibrationError::Aborted)?;

            // Drop whatever piled up while the operator was moving the stick
            if let Err(e) = self.source.flush_input() {
                debug!("Flush before capture failed: {}", e);
            }
            self.reader.reset();

            let samples = self.collect(joystick);
            match CalibrationPoint::from_samples(&samples) {
                Some(point) => {
                    info!(
                        "  {}: X={}±{}, Y={}±{} ({} samples)",
                        position,
                        point.x,
                        point.err_x,
                        point.y,
                        point.err_y,
                        samples.len()
                    );
                    profile.insert(position, point);
                }
                None => {
                    warn!("No samples for {} {}", joystick, position);
                    unresolved.push(position);
                }
            }
        }

        Ok(CalibrationOutcome {
            joystick,
            profile,
            unresolved,
        })
    }

    /// Capture each joystick in turn and write its profile to the store
    pub fn run<G: ReadinessGate>(
        &mut self,
        joysticks: &[JoystickId],
        gate: &mut G,
        store: &CalibrationStore,
    ) -> Result<Vec<CalibrationOutcome>, CalibrationError> {
        let mut outcomes = Vec::with_capacity(joysticks.len());

        for &joystick in joysticks {
            info!("Calibrating {}", joystick);
            let outcome = self.capture(joystick, gate)?;
            store.save(joystick, &outcome.profile)?;
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    fn collect(&mut self, joystick: JoystickId) -> Vec<(i32, i32)> {
        let mut samples = Vec::with_capacity(self.window.samples);

        for _ in 0..self.window.samples {
            match self.reader.read_frame(&mut *self.source) {
                Ok(FrameRead::Frame(frame)) => {
                    if let Some(sample) = frame.get(joystick) {
                        samples.push((sample.x, sample.y));
                    }
                }
                Ok(FrameRead::Malformed) | Ok(FrameRead::Idle) => {}
                Err(e) => warn!("Serial error during calibration: {}", e),
            }

            if !self.window.interval.is_zero() {
                thread::sleep(self.window.interval);
            }
        }

        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::TextLineFormat;
    use crate::transport::MockLineSource;

    fn window(samples: usize) -> CaptureWindow {
        CaptureWindow {
            samples,
            interval: Duration::ZERO,
        }
    }

    #[test]
    fn default_window_is_forty_samples() {
        let window = CaptureWindow::default();
        assert_eq!(window.samples, 40);
        assert_eq!(window.interval, Duration::from_millis(50));
    }

    #[test]
    fn captures_every_position_in_order() {
        let mut source = MockLineSource::new();
        for (x, y) in [(2048, 2048), (2048, 0), (2048, 4095), (0, 2048), (4095, 2048)] {
            source.push_line(format!("X: {} Y: {}", x, y));
            source.push_line(format!("X: {} Y: {}", x + 2, y));
        }

        let mut gate = ImmediateGate::default();
        let mut procedure = CalibrationProcedure::new(&mut source, TextLineFormat, 1, window(2));
        let outcome = procedure.capture(JoystickId::FIRST, &mut gate).unwrap();

        assert!(outcome.unresolved.is_empty());
        assert!(outcome.profile.is_complete());
        assert_eq!(outcome.profile.get(Position::Left), Some(&CalibrationPoint::new(1, 2048).with_error(1, 0)));
        assert_eq!(gate.prompts.len(), 5);
        assert_eq!(gate.prompts[0], (JoystickId::FIRST, Position::Center));
    }

    #[test]
    fn stalled_position_is_unresolved() {
        let mut source = MockLineSource::new();
        source.push_line("X: 2048 Y: 2048");
        // up: serial stalls
        source.push_timeout();
        for line in ["X: 2048 Y: 4000", "X: 100 Y: 2048", "X: 4000 Y: 2048"] {
            source.push_line(line);
        }

        let mut gate = ImmediateGate::default();
        let mut procedure = CalibrationProcedure::new(&mut source, TextLineFormat, 1, window(1));
        let outcome = procedure.capture(JoystickId::FIRST, &mut gate).unwrap();

        assert_eq!(outcome.unresolved, vec![Position::Up]);
        assert_eq!(outcome.profile.len(), 4);
        assert!(outcome.profile.center().is_some());
    }

    #[test]
    fn dual_layout_only_keeps_requested_stick() {
        let mut source = MockLineSource::new();
        for _ in Position::ALL {
            source.push_line("Joystick 1 X: 10 Y: 10");
            source.push_line("Joystick 2 X: 20 Y: 20");
        }

        let mut gate = ImmediateGate::default();
        let mut procedure = CalibrationProcedure::new(&mut source, TextLineFormat, 2, window(1));
        let outcome = procedure.capture(JoystickId::SECOND, &mut gate).unwrap();

        assert_eq!(outcome.profile.center(), Some(&CalibrationPoint::new(20, 20)));
    }
}
