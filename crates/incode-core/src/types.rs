use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Windows Scancode + Extended flag key identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScKey {
    pub sc: u16,
    pub ext: bool,
}

impl ScKey {
    pub const fn new(sc: u16, ext: bool) -> Self {
        Self { sc, ext }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdge {
    Down,
    Up,
}

/// Raw notification from the hook layer.
#[derive(Debug, Clone)]
pub struct KeyEvent {
    pub key: ScKey,
    pub edge: KeyEdge,
    /// Set by hook layers that can tell synthesized input apart (LLKHF_INJECTED).
    pub injected: bool,
    pub t: Instant,
}

impl KeyEvent {
    pub fn down(key: ScKey, t: Instant) -> Self {
        Self {
            key,
            edge: KeyEdge::Down,
            injected: false,
            t,
        }
    }

    pub fn up(key: ScKey, t: Instant) -> Self {
        Self {
            key,
            edge: KeyEdge::Up,
            injected: false,
            t,
        }
    }
}

/// Action to be taken by the hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Pass,
    Block,
}

/// Absolute screen coordinate. Negative values are valid on multi-monitor desktops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Display bounds in virtual-desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub const fn center(&self) -> Point {
        Point::new(self.left + self.width / 2, self.top + self.height / 2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
}
