//! Logical input symbols

use crate::backend::{BackendError, MouseButton};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MOUSE_PREFIX: &str = "mouse:";

/// A key name or mouse button the emitter can hold.
///
/// Written as `w`, `up`, `space` for keys and `mouse:left` for buttons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum InputSymbol {
    Key(String),
    Mouse(MouseButton),
}

impl InputSymbol {
    pub fn key(name: impl Into<String>) -> Self {
        InputSymbol::Key(name.into())
    }
}

impl fmt::Display for InputSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSymbol::Key(name) => f.write_str(name),
            InputSymbol::Mouse(button) => write!(f, "{}{}", MOUSE_PREFIX, button),
        }
    }
}

impl FromStr for InputSymbol {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(BackendError::UnsupportedKey(String::new()));
        }

        match s.get(..MOUSE_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(MOUSE_PREFIX) => {
                Ok(InputSymbol::Mouse(s[MOUSE_PREFIX.len()..].parse()?))
            }
            _ => Ok(InputSymbol::Key(s.to_ascii_lowercase())),
        }
    }
}

impl TryFrom<String> for InputSymbol {
    type Error = BackendError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InputSymbol> for String {
    fn from(symbol: InputSymbol) -> Self {
        symbol.to_string()
    }
}
