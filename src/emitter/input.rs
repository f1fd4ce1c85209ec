//! Input emitter state machine

use crate::backend::{BackendError, KeyboardBackend, MouseBackend};
use crate::direction::Resolved;
use crate::emitter::keymap::DirectionMap;
use crate::emitter::mode::EmitterMode;
use crate::emitter::symbol::InputSymbol;
use crate::telemetry::JoystickId;
use log::{debug, trace, warn};
use std::collections::{BTreeSet, HashMap};

/// Pointer pixels per raw unit of displacement
pub const DEFAULT_POINTER_SCALE: f64 = 0.02;

/// Physical hold bookkeeping shared by every joystick.
///
/// A symbol is pressed when its first claimant arrives and released when its
/// last claimant leaves, so two sticks bound to the same key never release it
/// under each other.
#[derive(Debug, Default)]
struct HeldState {
    claims: HashMap<InputSymbol, u32>,
}

impl HeldState {
    /// Returns false when the physical press failed and the claim was not taken
    fn claim<K: KeyboardBackend, M: MouseBackend>(&mut self, symbol: &InputSymbol, keyboard: &K, mouse: &M) -> bool {
        let count = self.claims.get(symbol).copied().unwrap_or(0);
        if count == 0 {
            if let Err(e) = press(symbol, keyboard, mouse) {
                warn!("Failed to press '{}': {}", symbol, e);
                return false;
            }
            trace!("down '{}'", symbol);
        } else {
            trace!("'{}' already down, claims {} -> {}", symbol, count, count + 1);
        }
        self.claims.insert(symbol.clone(), count + 1);
        true
    }

    fn unclaim<K: KeyboardBackend, M: MouseBackend>(&mut self, symbol: &InputSymbol, keyboard: &K, mouse: &M) {
        let Some(count) = self.claims.get_mut(symbol) else {
            return;
        };
        *count = count.saturating_sub(1);
        if *count > 0 {
            trace!("'{}' still claimed {} time(s)", symbol, count);
            return;
        }

        self.claims.remove(symbol);
        match release(symbol, keyboard, mouse) {
            Ok(()) => trace!("up '{}'", symbol),
            Err(e) => warn!("Failed to release '{}': {}", symbol, e),
        }
    }

    fn clear_all<K: KeyboardBackend, M: MouseBackend>(&mut self, keyboard: &K, mouse: &M) {
        for (symbol, _) in self.claims.drain() {
            if let Err(e) = release(&symbol, keyboard, mouse) {
                warn!("Failed to release '{}': {}", symbol, e);
            }
        }
    }
}

fn press<K: KeyboardBackend, M: MouseBackend>(symbol: &InputSymbol, keyboard: &K, mouse: &M) -> Result<(), BackendError> {
    match symbol {
        InputSymbol::Key(key) => keyboard.key_down(key),
        InputSymbol::Mouse(button) => mouse.button_down(*button),
    }
}

fn release<K: KeyboardBackend, M: MouseBackend>(symbol: &InputSymbol, keyboard: &K, mouse: &M) -> Result<(), BackendError> {
    match symbol {
        InputSymbol::Key(key) => keyboard.key_up(key),
        InputSymbol::Mouse(button) => mouse.button_up(*button),
    }
}

fn tap<K: KeyboardBackend, M: MouseBackend>(symbol: &InputSymbol, keyboard: &K, mouse: &M) -> Result<(), BackendError> {
    match symbol {
        InputSymbol::Key(key) => keyboard.key_press(key),
        InputSymbol::Mouse(button) => mouse.click(*button),
    }
}

/// Drives the input backends from resolved directions.
pub struct InputEmitter<K, M>
where
    K: KeyboardBackend,
    M: MouseBackend,
{
    keyboard: K,
    mouse: M,
    mode: EmitterMode,
    /// One map per joystick, indexed by joystick id
    maps: Vec<DirectionMap>,
    pointer_scale: f64,
    /// Only this joystick moves the pointer
    pointer_stick: JoystickId,
    /// KeyState: symbols each joystick currently holds
    held: HashMap<JoystickId, BTreeSet<InputSymbol>>,
    physical: HeldState,
}

impl<K, M> InputEmitter<K, M>
where
    K: KeyboardBackend,
    M: MouseBackend,
{
    pub fn new(keyboard: K, mouse: M, mode: EmitterMode, maps: Vec<DirectionMap>) -> Self {
        Self {
            keyboard,
            mouse,
            mode,
            maps,
            pointer_scale: DEFAULT_POINTER_SCALE,
            pointer_stick: JoystickId::FIRST,
            held: HashMap::new(),
            physical: HeldState::default(),
        }
    }

    pub fn with_pointer_scale(mut self, scale: f64) -> Self {
        self.pointer_scale = scale;
        self
    }

    pub fn with_pointer_stick(mut self, joystick: JoystickId) -> Self {
        self.pointer_stick = joystick;
        self
    }

    pub fn mode(&self) -> EmitterMode {
        self.mode
    }

    /// Switch mode; anything held under the old mode is released first.
    pub fn set_mode(&mut self, mode: EmitterMode) {
        if mode != self.mode {
            self.release_all();
            debug!("Emitter mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }

    /// Symbols `joystick` currently holds
    pub fn held(&self, joystick: JoystickId) -> BTreeSet<InputSymbol> {
        self.held.get(&joystick).cloned().unwrap_or_default()
    }

    pub fn keyboard(&self) -> &K {
        &self.keyboard
    }

    pub fn mouse(&self) -> &M {
        &self.mouse
    }

    fn desired(&self, joystick: JoystickId, resolved: &Resolved) -> BTreeSet<InputSymbol> {
        match self.maps.get(joystick.index()) {
            Some(map) => map.symbols(resolved.direction),
            None => {
                trace!("No direction map for {}", joystick);
                BTreeSet::new()
            }
        }
    }

    /// Apply one resolved sample for `joystick`
    pub fn tick(&mut self, joystick: JoystickId, resolved: &Resolved) {
        match self.mode {
            EmitterMode::Hold => self.tick_hold(joystick, resolved),
            EmitterMode::Pulse => self.tick_pulse(joystick, resolved),
            EmitterMode::Pointer if joystick == self.pointer_stick => self.tick_pointer(resolved),
            EmitterMode::Pointer => {}
        }
    }

    fn tick_hold(&mut self, joystick: JoystickId, resolved: &Resolved) {
        let desired = self.desired(joystick, resolved);
        let mut current = self.held.remove(&joystick).unwrap_or_default();

        // Releases go out before presses
        let stale: Vec<InputSymbol> = current.difference(&desired).cloned().collect();
        for symbol in stale {
            self.physical.unclaim(&symbol, &self.keyboard, &self.mouse);
            current.remove(&symbol);
        }

        let fresh: Vec<InputSymbol> = desired.difference(&current).cloned().collect();
        for symbol in fresh {
            if self.physical.claim(&symbol, &self.keyboard, &self.mouse) {
                current.insert(symbol);
            }
        }

        if !current.is_empty() {
            self.held.insert(joystick, current);
        }
    }

    fn tick_pulse(&mut self, joystick: JoystickId, resolved: &Resolved) {
        for symbol in self.desired(joystick, resolved) {
            if let Err(e) = tap(&symbol, &self.keyboard, &self.mouse) {
                warn!("Failed to tap '{}': {}", symbol, e);
            }
        }
    }

    fn tick_pointer(&mut self, resolved: &Resolved) {
        if resolved.dx == 0 && resolved.dy == 0 {
            return;
        }

        let dx = (f64::from(resolved.dx) * self.pointer_scale) as i32;
        let dy = (f64::from(resolved.dy) * self.pointer_scale) as i32;
        if dx == 0 && dy == 0 {
            return;
        }

        if let Err(e) = self.mouse.move_relative(dx, dy) {
            warn!("Failed to move pointer by ({}, {}): {}", dx, dy, e);
        }
    }

    /// Release every physically held symbol and forget all KeyState
    pub fn release_all(&mut self) {
        if !self.held.is_empty() {
            debug!("Releasing all held input");
        }
        self.held.clear();
        self.physical.clear_all(&self.keyboard, &self.mouse);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{EventLog, InputEvent, MockKeyboardBackend, MockMouseBackend, MouseButton};
    use crate::direction::Direction;
    use crate::emitter::DiagonalMapping;

    fn emitter(mode: EmitterMode, maps: Vec<DirectionMap>) -> (InputEmitter<MockKeyboardBackend, MockMouseBackend>, EventLog) {
        let log = EventLog::default();
        let emitter = InputEmitter::new(
            MockKeyboardBackend::with_log(log.clone()),
            MockMouseBackend::with_log(log.clone()),
            mode,
            maps,
        );
        (emitter, log)
    }

    fn at(direction: Direction) -> Resolved {
        Resolved { dx: 0, dy: 0, direction }
    }

    fn key_down(k: &str) -> InputEvent {
        InputEvent::KeyDown(k.to_string())
    }

    fn key_up(k: &str) -> InputEvent {
        InputEvent::KeyUp(k.to_string())
    }

    #[test]
    fn holding_presses_once() {
        let (mut emitter, log) = emitter(EmitterMode::Hold, vec![DirectionMap::wasd()]);
        for _ in 0..10 {
            emitter.tick(JoystickId::FIRST, &at(Direction::Up));
        }
        assert_eq!(log.events(), vec![key_down("w")]);
        assert_eq!(emitter.held(JoystickId::FIRST), [InputSymbol::key("w")].into_iter().collect());
    }

    #[test]
    fn transitions_release_then_press_exactly_once() {
        let map = DirectionMap::wasd().with_diagonal(DiagonalMapping::Both);
        let (mut emitter, log) = emitter(EmitterMode::Hold, vec![map]);

        emitter.tick(JoystickId::FIRST, &at(Direction::UpLeft));
        assert_eq!(log.drain(), vec![key_down("a"), key_down("w")]);

        emitter.tick(JoystickId::FIRST, &at(Direction::UpRight));
        assert_eq!(log.drain(), vec![key_up("a"), key_down("d")]);

        emitter.tick(JoystickId::FIRST, &at(Direction::UpRight));
        assert!(log.is_empty());

        emitter.tick(JoystickId::FIRST, &at(Direction::Center));
        let released = log.drain();
        assert_eq!(released.len(), 2);
        assert!(released.contains(&key_up("w")));
        assert!(released.contains(&key_up("d")));
        assert!(emitter.held(JoystickId::FIRST).is_empty());
    }

    #[test]
    fn joysticks_use_their_own_maps() {
        let (mut emitter, log) = emitter(EmitterMode::Hold, vec![DirectionMap::wasd(), DirectionMap::arrows()]);
        emitter.tick(JoystickId::FIRST, &at(Direction::Left));
        emitter.tick(JoystickId::SECOND, &at(Direction::Left));
        assert_eq!(log.drain(), vec![key_down("a"), key_down("left")]);

        emitter.tick(JoystickId::FIRST, &at(Direction::Center));
        assert_eq!(log.drain(), vec![key_up("a")]);
        assert_eq!(emitter.held(JoystickId::SECOND).len(), 1);
    }

    #[test]
    fn shared_symbol_released_by_last_claimant() {
        let (mut emitter, log) = emitter(EmitterMode::Hold, vec![DirectionMap::wasd(), DirectionMap::wasd()]);

        emitter.tick(JoystickId::FIRST, &at(Direction::Up));
        emitter.tick(JoystickId::SECOND, &at(Direction::Up));
        assert_eq!(log.drain(), vec![key_down("w")]);

        emitter.tick(JoystickId::FIRST, &at(Direction::Center));
        assert!(log.is_empty());

        emitter.tick(JoystickId::SECOND, &at(Direction::Down));
        assert_eq!(log.drain(), vec![key_up("w"), key_down("s")]);
    }

    #[test]
    fn pulse_taps_every_tick() {
        let (mut emitter, log) = emitter(EmitterMode::Pulse, vec![DirectionMap::button(MouseButton::Left)]);
        for _ in 0..3 {
            emitter.tick(JoystickId::FIRST, &at(Direction::Right));
        }
        emitter.tick(JoystickId::FIRST, &at(Direction::Center));

        let events = log.events();
        assert_eq!(events.len(), 6);
        assert_eq!(events[0], InputEvent::ButtonDown(MouseButton::Left));
        assert_eq!(events[1], InputEvent::ButtonUp(MouseButton::Left));
        assert!(emitter.held(JoystickId::FIRST).is_empty());
    }

    #[test]
    fn pointer_moves_by_scaled_displacement() {
        let (mut emitter, log) = emitter(EmitterMode::Pointer, vec![]);
        emitter.tick(JoystickId::FIRST, &Resolved { dx: 500, dy: -250, direction: Direction::UpRight });
        emitter.tick(JoystickId::FIRST, &Resolved::default());
        // 20 * 0.02 truncates to 0
        emitter.tick(JoystickId::FIRST, &Resolved { dx: 20, dy: 0, direction: Direction::Center });

        assert_eq!(log.events(), vec![InputEvent::Move { dx: 10, dy: -5 }]);
    }

    #[test]
    fn pointer_follows_one_stick() {
        let (emitter, log) = emitter(EmitterMode::Pointer, vec![]);
        let mut emitter = emitter.with_pointer_stick(JoystickId::SECOND);
        let moved = Resolved { dx: 500, dy: 0, direction: Direction::Right };

        emitter.tick(JoystickId::FIRST, &moved);
        assert!(log.is_empty());

        emitter.tick(JoystickId::SECOND, &moved);
        assert_eq!(log.events(), vec![InputEvent::Move { dx: 10, dy: 0 }]);
    }

    #[test]
    fn release_all_clears_every_joystick() {
        let (mut emitter, log) = emitter(EmitterMode::Hold, vec![DirectionMap::wasd(), DirectionMap::arrows()]);
        emitter.tick(JoystickId::FIRST, &at(Direction::Down));
        emitter.tick(JoystickId::SECOND, &at(Direction::Right));
        log.drain();

        emitter.release_all();
        let events = log.drain();
        assert_eq!(events.len(), 2);
        assert!(events.contains(&key_up("s")));
        assert!(events.contains(&key_up("right")));

        // Nothing left to release
        emitter.release_all();
        assert!(log.is_empty());
    }

    #[test]
    fn switching_mode_releases_held() {
        let (mut emitter, log) = emitter(EmitterMode::Hold, vec![DirectionMap::wasd()]);
        emitter.tick(JoystickId::FIRST, &at(Direction::Left));
        emitter.set_mode(EmitterMode::Pulse);
        assert_eq!(log.events(), vec![key_down("a"), key_up("a")]);
        assert_eq!(emitter.mode(), EmitterMode::Pulse);
    }
}
