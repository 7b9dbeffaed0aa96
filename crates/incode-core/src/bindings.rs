use crate::types::{MouseButton, ScKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// What a bound key does while control is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    ScrollUp,
    ScrollDown,
    LeftButtonHold,
    RightButtonHold,
    EnterAbbreviationMode,
    Cancel,
}

impl LogicalAction {
    /// Movement actions share one acceleration ramp.
    pub fn is_movement(self) -> bool {
        matches!(
            self,
            LogicalAction::MoveUp
                | LogicalAction::MoveDown
                | LogicalAction::MoveLeft
                | LogicalAction::MoveRight
        )
    }

    pub fn button(self) -> Option<MouseButton> {
        match self {
            LogicalAction::LeftButtonHold => Some(MouseButton::Left),
            LogicalAction::RightButtonHold => Some(MouseButton::Right),
            _ => None,
        }
    }

    /// +1 for scroll up, -1 for scroll down.
    pub fn scroll_sign(self) -> Option<i32> {
        match self {
            LogicalAction::ScrollUp => Some(1),
            LogicalAction::ScrollDown => Some(-1),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActionBinding {
    pub action: LogicalAction,
    pub held_since: Option<Instant>,
}

impl ActionBinding {
    pub fn new(action: LogicalAction) -> Self {
        Self {
            action,
            held_since: None,
        }
    }

    pub fn is_held(&self) -> bool {
        self.held_since.is_some()
    }
}

/// Result of feeding a physical edge into the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyChange {
    /// The key has no binding.
    Unbound,
    /// Bound, but the edge changed nothing (OS key-repeat, or release of an idle key).
    Unchanged(LogicalAction),
    Pressed(LogicalAction),
    Released(LogicalAction),
}

/// Owned per-key hold state. At most one binding per physical key.
#[derive(Debug, Clone, Default)]
pub struct KeyTable {
    bindings: HashMap<ScKey, ActionBinding>,
}

impl KeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bindings(bindings: impl IntoIterator<Item = (ScKey, LogicalAction)>) -> Self {
        let mut table = Self::new();
        for (key, action) in bindings {
            table.bind(key, action);
        }
        table
    }

    /// Rebinding a key replaces its action and clears its hold.
    pub fn bind(&mut self, key: ScKey, action: LogicalAction) {
        self.bindings.insert(key, ActionBinding::new(action));
    }

    pub fn get(&self, key: ScKey) -> Option<&ActionBinding> {
        self.bindings.get(&key)
    }

    pub fn action_of(&self, key: ScKey) -> Option<LogicalAction> {
        self.bindings.get(&key).map(|b| b.action)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn on_key_down(&mut self, key: ScKey, now: Instant) -> KeyChange {
        let Some(binding) = self.bindings.get_mut(&key) else {
            return KeyChange::Unbound;
        };
        // Hook layers repeat key-down while the key stays pressed.
        if binding.held_since.is_some() {
            return KeyChange::Unchanged(binding.action);
        }
        binding.held_since = Some(now);
        KeyChange::Pressed(binding.action)
    }

    pub fn on_key_up(&mut self, key: ScKey) -> KeyChange {
        let Some(binding) = self.bindings.get_mut(&key) else {
            return KeyChange::Unbound;
        };
        match binding.held_since.take() {
            Some(_) => KeyChange::Released(binding.action),
            None => KeyChange::Unchanged(binding.action),
        }
    }

    /// Currently held bindings with their hold start.
    pub fn held(&self) -> impl Iterator<Item = (LogicalAction, Instant)> + '_ {
        self.bindings
            .values()
            .filter_map(|b| b.held_since.map(|t| (b.action, t)))
    }

    /// Earliest hold start among movement actions, `None` when no movement key is held.
    pub fn earliest_movement(&self) -> Option<Instant> {
        self.held()
            .filter(|(action, _)| action.is_movement())
            .map(|(_, t)| t)
            .min()
    }

    /// Clears every hold, returning the actions that were latched.
    pub fn release_all(&mut self) -> Vec<LogicalAction> {
        let mut released = Vec::new();
        for binding in self.bindings.values_mut() {
            if binding.held_since.take().is_some() {
                released.push(binding.action);
            }
        }
        released
    }
}
