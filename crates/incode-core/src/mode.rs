use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Passive: everything except the override key passes through.
    Idle,
    /// Intercepting bound keys and driving the cursor.
    Controlled,
}

/// What the engine must do in response to an override-key edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeTransition {
    None,
    EnterControl,
    /// Pressed again inside the debounce window: center the cursor, stay idle.
    CenterCursor,
    ExitControl,
}

#[derive(Debug, Clone)]
pub struct ModeController {
    mode: Mode,
    control_started: Option<Instant>,
    debounce: Duration,
}

impl ModeController {
    pub fn new(debounce: Duration) -> Self {
        Self {
            mode: Mode::Idle,
            control_started: None,
            debounce,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_controlled(&self) -> bool {
        self.mode == Mode::Controlled
    }

    pub fn on_override_down(&mut self, now: Instant) -> ModeTransition {
        if self.mode == Mode::Controlled {
            // key-repeat of the held override key
            return ModeTransition::None;
        }
        let recent = self
            .control_started
            .map_or(false, |t| now.saturating_duration_since(t) < self.debounce);
        if recent {
            return ModeTransition::CenterCursor;
        }
        self.mode = Mode::Controlled;
        self.control_started = Some(now);
        ModeTransition::EnterControl
    }

    pub fn on_override_up(&mut self) -> ModeTransition {
        if self.mode == Mode::Controlled {
            self.mode = Mode::Idle;
            ModeTransition::ExitControl
        } else {
            ModeTransition::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_press_inside_window_centers() {
        let mut m = ModeController::new(Duration::from_millis(300));
        let t0 = Instant::now();

        assert_eq!(m.on_override_down(t0), ModeTransition::EnterControl);
        assert_eq!(m.on_override_up(), ModeTransition::ExitControl);
        assert!(!m.is_controlled());

        let t1 = t0 + Duration::from_millis(150);
        assert_eq!(m.on_override_down(t1), ModeTransition::CenterCursor);
        assert!(!m.is_controlled());
        assert_eq!(m.on_override_up(), ModeTransition::None);
        assert!(!m.is_controlled());
    }

    #[test]
    fn test_presses_outside_window_both_control() {
        let mut m = ModeController::new(Duration::from_millis(300));
        let t0 = Instant::now();

        assert_eq!(m.on_override_down(t0), ModeTransition::EnterControl);
        m.on_override_up();
        let t1 = t0 + Duration::from_millis(300);
        assert_eq!(m.on_override_down(t1), ModeTransition::EnterControl);
        assert!(m.is_controlled());
        m.on_override_up();
        // The window restarts from the second entry.
        let t2 = t1 + Duration::from_millis(100);
        assert_eq!(m.on_override_down(t2), ModeTransition::CenterCursor);
    }

    #[test]
    fn test_repeat_while_controlled_is_ignored() {
        let mut m = ModeController::new(Duration::from_millis(300));
        let t0 = Instant::now();
        m.on_override_down(t0);
        assert_eq!(
            m.on_override_down(t0 + Duration::from_millis(500)),
            ModeTransition::None
        );
        m.on_override_up();
        // Debounce still measured from the original press at t0.
        assert_eq!(
            m.on_override_down(t0 + Duration::from_millis(550)),
            ModeTransition::EnterControl
        );
    }
}
