use crate::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Backspace,
    Delete,
    Enter,
    Escape,
    Tab,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Other(u32),
}

/// Already-normalized input, in the engine's logical coordinate space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    CursorMoved {
        pos: Vec2,
    },
    MouseButton {
        button: MouseButton,
        pressed: bool,
        pos: Vec2,
    },
    /// `delta.y > 0` scrolls content up (towards the start).
    Wheel {
        pos: Vec2,
        delta: Vec2,
    },
    Char(char),
    Key {
        key: Key,
        pressed: bool,
        repeat: bool,
    },
}
