//! Windows `SendInput` backends.
//!
//! Keys are injected by hardware scancode (`KEYEVENTF_SCANCODE`), which games
//! pick up more reliably than virtual keys. Scancodes above `0xFF` carry the
//! `0xE0` prefix and are sent with `KEYEVENTF_EXTENDEDKEY`.

use crate::backend::{BackendError, KeyboardBackend, MouseBackend, MouseButton};
use windows::Win32::Foundation::GetLastError;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, KEYEVENTF_SCANCODE, MOUSEEVENTF_LEFTDOWN,
    MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP, MOUSEEVENTF_MOVE,
    MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, MOUSEINPUT, MOUSE_EVENT_FLAGS, VIRTUAL_KEY,
};

/// US layout Set 1 scancodes for `a`..=`z`
const LETTERS: [u16; 26] = [
    0x1E, 0x30, 0x2E, 0x20, 0x12, 0x21, 0x22, 0x23, 0x17, 0x24, 0x25, 0x26, 0x32, 0x31, 0x18,
    0x19, 0x10, 0x13, 0x1F, 0x14, 0x16, 0x2F, 0x11, 0x2D, 0x15, 0x2C,
];

/// Scancode for a key name (case-insensitive)
pub fn scancode(name: &str) -> Option<u16> {
    let name = name.trim().to_ascii_lowercase();

    if let [c] = name.as_bytes() {
        match c {
            b'a'..=b'z' => return Some(LETTERS[usize::from(c - b'a')]),
            b'1'..=b'9' => return Some(0x02 + u16::from(c - b'1')),
            b'0' => return Some(0x0B),
            _ => {}
        }
    }

    let code = match name.as_str() {
        "up" | "uparrow" => 0xE048,
        "down" | "downarrow" => 0xE050,
        "left" | "leftarrow" => 0xE04B,
        "right" | "rightarrow" => 0xE04D,
        "space" | "spacebar" => 0x39,
        "enter" | "return" => 0x1C,
        "escape" | "esc" => 0x01,
        "tab" => 0x0F,
        "backspace" => 0x0E,
        "shift" | "lshift" => 0x2A,
        "rshift" => 0x36,
        "ctrl" | "control" | "lctrl" => 0x1D,
        "rctrl" => 0xE01D,
        "alt" | "lalt" => 0x38,
        "ralt" => 0xE038,
        _ => return None,
    };
    Some(code)
}

fn send(input: INPUT) -> Result<(), BackendError> {
    // SAFETY: a single fully initialised INPUT with its correct size
    let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
    if sent == 0 {
        let err = unsafe { GetLastError() };
        Err(BackendError::Operation(format!("SendInput failed: 0x{:08X}", err.0)))
    } else {
        Ok(())
    }
}

fn send_scancode(code: u16, mut flags: KEYBD_EVENT_FLAGS) -> Result<(), BackendError> {
    flags |= KEYEVENTF_SCANCODE;
    if code > 0xFF {
        flags |= KEYEVENTF_EXTENDEDKEY;
    }

    send(INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(0),
                wScan: code & 0xFF,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    })
}

fn send_mouse(dx: i32, dy: i32, flags: MOUSE_EVENT_FLAGS) -> Result<(), BackendError> {
    send(INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx,
                dy,
                mouseData: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    })
}

/// Scancode keyboard injection
#[derive(Debug, Clone, Copy, Default)]
pub struct SendInputKeyboard;

impl KeyboardBackend for SendInputKeyboard {
    fn key_down(&self, key: &str) -> Result<(), BackendError> {
        let code = scancode(key).ok_or_else(|| BackendError::UnsupportedKey(key.to_string()))?;
        send_scancode(code, KEYBD_EVENT_FLAGS(0))
    }

    fn key_up(&self, key: &str) -> Result<(), BackendError> {
        let code = scancode(key).ok_or_else(|| BackendError::UnsupportedKey(key.to_string()))?;
        send_scancode(code, KEYEVENTF_KEYUP)
    }
}

/// Relative pointer motion and button injection
#[derive(Debug, Clone, Copy, Default)]
pub struct SendInputMouse;

impl MouseBackend for SendInputMouse {
    fn move_relative(&self, dx: i32, dy: i32) -> Result<(), BackendError> {
        send_mouse(dx, dy, MOUSEEVENTF_MOVE)
    }

    fn button_down(&self, button: MouseButton) -> Result<(), BackendError> {
        let flags = match button {
            MouseButton::Left => MOUSEEVENTF_LEFTDOWN,
            MouseButton::Right => MOUSEEVENTF_RIGHTDOWN,
            MouseButton::Middle => MOUSEEVENTF_MIDDLEDOWN,
        };
        send_mouse(0, 0, flags)
    }

    fn button_up(&self, button: MouseButton) -> Result<(), BackendError> {
        let flags = match button {
            MouseButton::Left => MOUSEEVENTF_LEFTUP,
            MouseButton::Right => MOUSEEVENTF_RIGHTUP,
            MouseButton::Middle => MOUSEEVENTF_MIDDLEUP,
        };
        send_mouse(0, 0, flags)
    }
}
