//! Portable input events delivered by window backends.

use crate::base::geometry::IVector2;

/// Minimal portable key set. Letters refer to physical keys; use the decoded
/// character of a [`KeyboardEvent`] to distinguish case or symbols.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    LeftArrow,
    RightArrow,
    UpArrow,
    DownArrow,
    PageUp,
    PageDown,
    Control,
    Shift,
    Alt,
    Escape,
    Pause,
    Space,
    Tab,
    Return,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    Digit(u8),
    Function(u8),
    Letter(char),
    Unhandled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyboardEventType {
    KeyDown,
    KeyUp,
    /// A decoded character, possibly repeated while held.
    KeyType,
}

#[derive(Clone, Copy, Debug)]
pub struct KeyboardEvent {
    pub event_type: KeyboardEventType,
    /// The decoded unicode character, or '\0' when none applies.
    pub character: char,
    pub key: Key,
}

impl KeyboardEvent {
    pub fn new(event_type: KeyboardEventType, character: char, key: Key) -> Self {
        Self { event_type, character, key }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseKey {
    NoKey,
    Left,
    Right,
    Middle,
    ScrollUp,
    ScrollDown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseEventType {
    MouseDown,
    MouseUp,
    MouseMove,
    Scroll,
}

/// A mouse event with its position in the receiving component's parent
/// coordinate system.
#[derive(Clone, Copy, Debug)]
pub struct MouseEvent {
    pub event_type: MouseEventType,
    pub key: MouseKey,
    pub position: IVector2,
}

impl MouseEvent {
    pub fn new(event_type: MouseEventType, key: MouseKey, position: IVector2) -> Self {
        Self { event_type, key, position }
    }

    pub fn down(position: IVector2) -> Self {
        Self::new(MouseEventType::MouseDown, MouseKey::Left, position)
    }

    pub fn up(position: IVector2) -> Self {
        Self::new(MouseEventType::MouseUp, MouseKey::Left, position)
    }

    pub fn moved(position: IVector2) -> Self {
        Self::new(MouseEventType::MouseMove, MouseKey::NoKey, position)
    }

    /// The same event with its position shifted by `offset`.
    pub fn translated(&self, offset: IVector2) -> MouseEvent {
        MouseEvent { position: self.position + offset, ..*self }
    }

    /// The same event with its position divided component-wise, for pixel
    /// scale mapping.
    pub fn descaled(&self, scale: i32) -> MouseEvent {
        MouseEvent { position: self.position / scale, ..*self }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowEventType {
    Close,
    Redraw,
}

#[derive(Clone, Copy, Debug)]
pub struct WindowEvent {
    pub event_type: WindowEventType,
    pub width: i32,
    pub height: i32,
}

/// Everything a backend's event prefetch can enqueue.
#[derive(Clone, Copy, Debug)]
pub enum InputEvent {
    Mouse(MouseEvent),
    Keyboard(KeyboardEvent),
    Window(WindowEvent),
}
