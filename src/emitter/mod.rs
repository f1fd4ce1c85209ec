//! Input emission
//!
//! Turns resolved directions into press/release/move calls on the input
//! backends. Hold mode keeps a per-joystick set of held symbols and only
//! emits the difference on each tick; pulse mode taps every tick; pointer
//! mode moves the cursor by the scaled displacement.

pub mod symbol;
pub mod keymap;
pub mod mode;
pub mod input;

pub use symbol::InputSymbol;
pub use keymap::{DiagonalMapping, DirectionMap};
pub use mode::{ControlMode, EmitterMode};
pub use input::{InputEmitter, DEFAULT_POINTER_SCALE};
