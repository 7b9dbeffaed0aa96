use crate::types::{MouseButton, Point, Rect};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

/// Where synthesized mouse and keyboard output goes.
///
/// Calls are fire-and-forget; the engine logs failures and carries on.
pub trait OutputSink: Send {
    fn move_cursor_to(&mut self, x: i32, y: i32) -> anyhow::Result<()>;
    fn scroll_vertical(&mut self, amount: i32) -> anyhow::Result<()>;
    fn button_down(&mut self, button: MouseButton) -> anyhow::Result<()>;
    fn button_up(&mut self, button: MouseButton) -> anyhow::Result<()>;
    fn inject_text(&mut self, text: &str) -> anyhow::Result<()>;
}

/// Cursor and monitor queries.
pub trait DisplayGeometry: Send {
    fn cursor_position(&self) -> Point;
    /// Bounds of the display containing `at`.
    fn display_bounds(&self, at: Point) -> Rect;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    MoveTo(i32, i32),
    Scroll(i32),
    ButtonDown(MouseButton),
    ButtonUp(MouseButton),
    Text(String),
}

/// Sink that records every call. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    calls: Arc<Mutex<Vec<SinkCall>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().clone()
    }

    pub fn take(&self) -> Vec<SinkCall> {
        std::mem::take(&mut *self.calls.lock())
    }

    fn push(&self, call: SinkCall) {
        trace!("sink: {:?}", call);
        self.calls.lock().push(call);
    }
}

impl OutputSink for RecordingSink {
    fn move_cursor_to(&mut self, x: i32, y: i32) -> anyhow::Result<()> {
        self.push(SinkCall::MoveTo(x, y));
        Ok(())
    }

    fn scroll_vertical(&mut self, amount: i32) -> anyhow::Result<()> {
        self.push(SinkCall::Scroll(amount));
        Ok(())
    }

    fn button_down(&mut self, button: MouseButton) -> anyhow::Result<()> {
        self.push(SinkCall::ButtonDown(button));
        Ok(())
    }

    fn button_up(&mut self, button: MouseButton) -> anyhow::Result<()> {
        self.push(SinkCall::ButtonUp(button));
        Ok(())
    }

    fn inject_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.push(SinkCall::Text(text.to_string()));
        Ok(())
    }
}

/// A single fixed display with a settable cursor, for headless runs.
#[derive(Debug, Clone)]
pub struct FixedDisplay {
    pub bounds: Rect,
    cursor: Arc<Mutex<Point>>,
}

impl FixedDisplay {
    pub fn new(bounds: Rect, cursor: Point) -> Self {
        Self {
            bounds,
            cursor: Arc::new(Mutex::new(cursor)),
        }
    }

    pub fn set_cursor(&self, p: Point) {
        *self.cursor.lock() = p;
    }
}

impl DisplayGeometry for FixedDisplay {
    fn cursor_position(&self) -> Point {
        *self.cursor.lock()
    }

    fn display_bounds(&self, _at: Point) -> Rect {
        self.bounds
    }
}
