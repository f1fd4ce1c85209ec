//! Direction → symbol maps

use crate::backend::MouseButton;
use crate::direction::{Direction, Horizontal, Vertical};
use crate::emitter::symbol::InputSymbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How a diagonal direction is expanded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagonalMapping {
    /// Only the vertical binding (up-left => up)
    #[default]
    Primary,
    /// Both bindings (up-left => up + left)
    Both,
}

/// Bindings for the four cardinal directions of one joystick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionMap {
    pub up: Option<InputSymbol>,
    pub down: Option<InputSymbol>,
    pub left: Option<InputSymbol>,
    pub right: Option<InputSymbol>,
    pub diagonal: DiagonalMapping,
}

impl DirectionMap {
    pub fn new(up: InputSymbol, down: InputSymbol, left: InputSymbol, right: InputSymbol) -> Self {
        Self {
            up: Some(up),
            down: Some(down),
            left: Some(left),
            right: Some(right),
            diagonal: DiagonalMapping::Primary,
        }
    }

    /// Map with nothing bound
    pub fn empty() -> Self {
        Self {
            up: None,
            down: None,
            left: None,
            right: None,
            diagonal: DiagonalMapping::Primary,
        }
    }

    pub fn with_diagonal(mut self, diagonal: DiagonalMapping) -> Self {
        self.diagonal = diagonal;
        self
    }

    pub fn wasd() -> Self {
        Self::new(
            InputSymbol::key("w"),
            InputSymbol::key("s"),
            InputSymbol::key("a"),
            InputSymbol::key("d"),
        )
    }

    pub fn arrows() -> Self {
        Self::new(
            InputSymbol::key("up"),
            InputSymbol::key("down"),
            InputSymbol::key("left"),
            InputSymbol::key("right"),
        )
    }

    /// Every direction clicks the same button
    pub fn button(button: MouseButton) -> Self {
        let symbol = InputSymbol::Mouse(button);
        Self::new(symbol.clone(), symbol.clone(), symbol.clone(), symbol)
    }

    fn vertical(&self, vertical: Vertical) -> Option<&InputSymbol> {
        match vertical {
            Vertical::Up => self.up.as_ref(),
            Vertical::Down => self.down.as_ref(),
        }
    }

    fn horizontal(&self, horizontal: Horizontal) -> Option<&InputSymbol> {
        match horizontal {
            Horizontal::Left => self.left.as_ref(),
            Horizontal::Right => self.right.as_ref(),
        }
    }

    /// Symbols that should be active for `direction`; center is always empty.
    pub fn symbols(&self, direction: Direction) -> BTreeSet<InputSymbol> {
        let vertical = direction.vertical().and_then(|v| self.vertical(v));
        let horizontal = direction.horizontal().and_then(|h| self.horizontal(h));

        let both = self.diagonal == DiagonalMapping::Both;
        let picked: Vec<&InputSymbol> = match (vertical, horizontal) {
            (Some(v), Some(h)) if both => vec![v, h],
            (Some(v), _) => vec![v],
            (None, Some(h)) if both || direction.vertical().is_none() => vec![h],
            _ => Vec::new(),
        };

        picked.into_iter().cloned().collect()
    }
}

impl Default for DirectionMap {
    fn default() -> Self {
        Self::wasd()
    }
}
