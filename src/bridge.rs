//! Sampling loop
//!
//! Owns the telemetry source exclusively and, once per tick, reads a frame,
//! resolves every stick, drives the emitter and publishes to the broadcast
//! hub. Nothing but the stop channel ends the loop.

use crate::backend::{KeyboardBackend, MouseBackend};
use crate::broadcast::{BroadcastHub, Payload, StickState};
use crate::calibration::{CalibrationError, CalibrationStore};
use crate::direction::{DirectionResolver, Resolved, ResolverSettings};
use crate::emitter::{ControlMode, InputEmitter};
use crate::telemetry::{FrameRead, FrameReader, JoystickId, StickFrame, TelemetryFormat};
use crate::transport::{LineSource, TransportError};
use crossbeam_channel::{select, tick, Receiver};
use log::{debug, info, trace, warn};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Calibration for {joystick} is unusable: {source}")]
    Calibration {
        joystick: JoystickId,
        #[source]
        source: CalibrationError,
    },

    #[error("{sticks} joystick(s) configured but {resolvers} resolver(s) supplied")]
    ResolverCount { sticks: usize, resolvers: usize },
}

/// Load and check the calibration of every joystick.
///
/// Fails on the first joystick whose profile is missing, unreadable or
/// incomplete; the loop must not start in that case.
pub fn load_resolvers(
    store: &CalibrationStore,
    stick_count: usize,
    settings: ResolverSettings,
) -> Result<Vec<DirectionResolver>, BridgeError> {
    (0..stick_count.max(1))
        .map(JoystickId::from_index)
        .map(|joystick| {
            let profile = store
                .load(joystick)
                .map_err(|source| BridgeError::Calibration { joystick, source })?;
            let resolver = DirectionResolver::from_profile(&profile, settings)
                .map_err(|source| BridgeError::Calibration { joystick, source })?;
            info!(
                "Calibration loaded for {}: center ({}, {}), thresholds {:?}",
                joystick,
                resolver.center().x,
                resolver.center().y,
                resolver.thresholds()
            );
            Ok(resolver)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSettings {
    pub mode: ControlMode,
    /// Consecutive parse failures tolerated before the input is flushed
    pub max_parse_errors: u32,
    pub poll_interval: Duration,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            mode: ControlMode::default(),
            max_parse_errors: 5,
            poll_interval: Duration::from_millis(50),
        }
    }
}

/// Counters for one run of the loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub ticks: u64,
    pub samples: u64,
    pub idle: u64,
    pub parse_failures: u64,
    pub flushes: u64,
    pub transport_errors: u64,
    pub publishes: u64,
}

pub struct Bridge<S, F, K, M>
where
    S: LineSource,
    F: TelemetryFormat,
    K: KeyboardBackend,
    M: MouseBackend,
{
    source: S,
    reader: FrameReader<F>,
    resolvers: Vec<DirectionResolver>,
    emitter: Option<InputEmitter<K, M>>,
    hub: Option<BroadcastHub>,
    settings: BridgeSettings,
    consecutive_failures: u32,
    stats: BridgeStats,
}

impl<S, F, K, M> Bridge<S, F, K, M>
where
    S: LineSource,
    F: TelemetryFormat,
    K: KeyboardBackend,
    M: MouseBackend,
{
    /// One resolver per stick the reader expects, in joystick order.
    pub fn new(
        source: S,
        reader: FrameReader<F>,
        resolvers: Vec<DirectionResolver>,
        settings: BridgeSettings,
    ) -> Result<Self, BridgeError> {
        if resolvers.len() != reader.stick_count() {
            return Err(BridgeError::ResolverCount {
                sticks: reader.stick_count(),
                resolvers: resolvers.len(),
            });
        }

        Ok(Self {
            source,
            reader,
            resolvers,
            emitter: None,
            hub: None,
            settings,
            consecutive_failures: 0,
            stats: BridgeStats::default(),
        })
    }

    pub fn with_emitter(mut self, emitter: InputEmitter<K, M>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    pub fn with_hub(mut self, hub: BroadcastHub) -> Self {
        self.hub = Some(hub);
        self
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    pub fn emitter(&self) -> Option<&InputEmitter<K, M>> {
        self.emitter.as_ref()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// One iteration: read, resolve, emit, publish.
    ///
    /// Returns the resolved state of every stick when a complete frame arrived.
    pub fn tick(&mut self) -> Option<Vec<Resolved>> {
        self.stats.ticks += 1;

        match self.reader.read_frame(&mut self.source) {
            Ok(FrameRead::Frame(frame)) if frame.is_complete() => {
                self.consecutive_failures = 0;
                self.stats.samples += 1;
                Some(self.process(&frame))
            }
            Ok(FrameRead::Frame(frame)) => {
                trace!("Incomplete frame ({} stick(s) missing)", frame.missing());
                self.on_parse_failure();
                None
            }
            Ok(FrameRead::Malformed) => {
                self.on_parse_failure();
                None
            }
            Ok(FrameRead::Idle) => {
                self.stats.idle += 1;
                None
            }
            Err(TransportError::LineTooLong { limit }) => {
                debug!("Discarded line longer than {} bytes", limit);
                self.on_parse_failure();
                None
            }
            Err(e) => {
                warn!("Serial error: {}", e);
                self.stats.transport_errors += 1;
                self.reader.reset();
                None
            }
        }
    }

    fn process(&mut self, frame: &StickFrame) -> Vec<Resolved> {
        let resolved: Vec<Resolved> = self
            .resolvers
            .iter()
            .enumerate()
            .map(|(index, resolver)| {
                frame
                    .get(JoystickId::from_index(index))
                    .map(|sample| resolver.resolve(sample))
                    .unwrap_or_default()
            })
            .collect();

        for (index, state) in resolved.iter().enumerate() {
            let joystick = JoystickId::from_index(index);
            debug!("{}: dx={} dy={} {}", joystick, state.dx, state.dy, state.direction);
            if let Some(emitter) = self.emitter.as_mut() {
                emitter.tick(joystick, state);
            }
        }

        self.publish(&resolved);
        resolved
    }

    fn publish(&mut self, resolved: &[Resolved]) {
        let Some(hub) = self.hub.as_ref() else {
            return;
        };

        let states: Vec<StickState> = resolved.iter().copied().map(StickState::from).collect();
        let Some(payload) = Payload::from_states(self.settings.mode, &states) else {
            trace!("No broadcast shape for {} sticks", states.len());
            return;
        };

        match hub.publish(&payload) {
            Ok(0) => {}
            Ok(_) => self.stats.publishes += 1,
            Err(e) => warn!("Broadcast failed: {}", e),
        }
    }

    fn on_parse_failure(&mut self) {
        self.stats.parse_failures += 1;
        self.consecutive_failures += 1;

        if self.consecutive_failures > self.settings.max_parse_errors {
            warn!("{} invalid lines, flushing serial input", self.consecutive_failures);
            if let Err(e) = self.source.flush_input() {
                warn!("Flush failed: {}", e);
            }
            self.reader.reset();
            self.stats.flushes += 1;
            self.consecutive_failures = 0;
        }
    }

    /// Release everything the emitter holds
    pub fn release_all(&mut self) {
        if let Some(emitter) = self.emitter.as_mut() {
            emitter.release_all();
        }
    }

    /// Tick at the configured cadence until `stop` fires or disconnects.
    ///
    /// Held input is released before returning.
    pub fn run(&mut self, stop: &Receiver<()>) -> BridgeStats {
        let ticker = tick(self.settings.poll_interval);
        info!(
            "Sampling every {:?} in {} mode (CTRL+C to exit)",
            self.settings.poll_interval, self.settings.mode
        );

        loop {
            select! {
                recv(stop) -> _ => break,
                recv(ticker) -> _ => {
                    self.tick();
                }
            }
        }

        self.release_all();
        info!(
            "Sampling stopped: {} samples, {} parse failures, {} flushes",
            self.stats.samples, self.stats.parse_failures, self.stats.flushes
        );
        self.stats
    }
}
