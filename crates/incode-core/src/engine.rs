use crate::abbrev::{AbbrevOutcome, AbbrevResult, AbbreviationTable, Expander};
use crate::bindings::{KeyChange, KeyTable, LogicalAction};
use crate::config::{Config, Tuning};
use crate::error::Result;
use crate::keymap;
use crate::mode::{Mode, ModeController, ModeTransition};
use crate::motion::{Motion, TickOutput};
use crate::runtime::TickControl;
use crate::sink::{DisplayGeometry, OutputSink};
use crate::types::{KeyAction, KeyEdge, KeyEvent, Point, ScKey};
use crossbeam_channel::Sender;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Notifications for a UI layer (abbreviation popup, sound cues, tray state).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ControlChanged(bool),
    CursorCentered(Point),
    ShowAbbreviations(Vec<(String, String)>),
    HideAbbreviations,
    Abbreviation(AbbrevOutcome),
}

type Listener = Box<dyn Fn(&EngineEvent) + Send + Sync>;

/// All interception state behind one owner. Callers serialize access
/// (see `runtime::SharedEngine`).
pub struct Engine {
    tuning: Tuning,
    override_key: ScKey,
    keys: KeyTable,
    mode: ModeController,
    motion: Motion,
    expander: Expander,
    /// Keys whose key-down was consumed; their key-up is consumed too.
    swallowed: HashSet<ScKey>,
    sink: Box<dyn OutputSink>,
    display: Box<dyn DisplayGeometry>,
    on_event: Option<Listener>,
    tick_control: Option<Sender<TickControl>>,
}

impl Engine {
    pub fn new(
        config: &Config,
        sink: Box<dyn OutputSink>,
        display: Box<dyn DisplayGeometry>,
    ) -> Result<Self> {
        config.tuning.validate()?;
        let override_key = config.override_scancode()?;
        let motion = Motion::new(&config.tuning)?;
        let keys = KeyTable::from_bindings(
            config
                .resolved_bindings()
                .into_iter()
                .filter(|(k, _)| *k != override_key),
        );
        let expander = Expander::new(AbbreviationTable::from_map(&config.abbreviations));

        info!(
            "Engine: override key {:?}, {} bindings, {} abbreviations.",
            config.override_key,
            keys.len(),
            expander.table().len()
        );

        Ok(Self {
            tuning: config.tuning.clone(),
            override_key,
            keys,
            mode: ModeController::new(Duration::from_millis(config.center_debounce_ms)),
            motion,
            expander,
            swallowed: HashSet::new(),
            sink,
            display,
            on_event: None,
            tick_control: None,
        })
    }

    /// The listener runs with the engine borrowed; it must not call back into it.
    pub fn set_on_event(&mut self, cb: impl Fn(&EngineEvent) + Send + Sync + 'static) {
        self.on_event = Some(Box::new(cb));
    }

    pub fn set_tick_control(&mut self, tx: Sender<TickControl>) {
        self.tick_control = Some(tx);
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn speed(&self) -> f64 {
        self.tuning.speed
    }

    pub fn accel(&self) -> f64 {
        self.tuning.accel
    }

    pub fn scroll_scale(&self) -> f64 {
        self.tuning.scroll_scale
    }

    pub fn scroll_accel(&self) -> f64 {
        self.tuning.scroll_accel
    }

    pub fn scroll_amount(&self) -> i32 {
        self.tuning.scroll_amount
    }

    pub fn filter_frequency(&self) -> f64 {
        self.tuning.filter_frequency
    }

    pub fn filter_resonance(&self) -> f64 {
        self.tuning.filter_resonance
    }

    /// Replaces tuning values; filters are rebuilt and re-armed at the cursor.
    pub fn set_tuning(&mut self, tuning: Tuning) -> Result<()> {
        tuning.validate()?;
        let mut motion = Motion::new(&tuning)?;
        motion.arm(self.display.cursor_position(), Instant::now());
        let period_changed = tuning.tick_hz != self.tuning.tick_hz;
        self.motion = motion;
        self.tuning = tuning;
        if period_changed && self.mode.is_controlled() {
            self.send_tick(TickControl::Start(self.tuning.tick_period()));
        }
        info!("Engine: tuning updated: {:?}", self.tuning);
        Ok(())
    }

    pub fn mode(&self) -> Mode {
        self.mode.mode()
    }

    pub fn is_controlled(&self) -> bool {
        self.mode.is_controlled()
    }

    pub fn is_abbreviating(&self) -> bool {
        self.expander.is_matching()
    }

    pub fn abbreviations(&self) -> &AbbreviationTable {
        self.expander.table()
    }

    pub fn key_table(&self) -> &KeyTable {
        &self.keys
    }

    pub fn target(&self) -> (f64, f64) {
        self.motion.target()
    }

    pub fn process_key(&mut self, event: KeyEvent) -> KeyAction {
        match event.edge {
            KeyEdge::Down => self.on_key_down(event.key, event.t, event.injected),
            KeyEdge::Up => self.on_key_up(event.key, event.injected),
        }
    }

    fn on_key_down(&mut self, key: ScKey, now: Instant, injected: bool) -> KeyAction {
        // Echo of our own expansion text: count it down, let it reach the OS.
        if self.expander.take_suppressed() {
            trace!("Suppressed synthetic key {:?}", key);
            return KeyAction::Pass;
        }
        if injected {
            return KeyAction::Pass;
        }

        if self.expander.is_matching() {
            return self.on_abbreviation_key(key);
        }

        if key == self.override_key {
            // Auto-repeat of a held override key is neither a press nor a double-tap.
            if !self.swallowed.insert(key) {
                return KeyAction::Block;
            }
            match self.mode.on_override_down(now) {
                ModeTransition::EnterControl => self.enter_control(now),
                ModeTransition::CenterCursor => self.center_cursor(now),
                _ => {}
            }
            return KeyAction::Block;
        }

        if !self.mode.is_controlled() {
            return KeyAction::Pass;
        }

        self.swallowed.insert(key);
        if let KeyChange::Pressed(action) = self.keys.on_key_down(key, now) {
            self.press_edge(action);
        }
        KeyAction::Block
    }

    fn on_key_up(&mut self, key: ScKey, injected: bool) -> KeyAction {
        if injected {
            return KeyAction::Pass;
        }

        if key == self.override_key {
            let was_swallowed = self.swallowed.remove(&key);
            if self.mode.on_override_up() == ModeTransition::ExitControl {
                self.exit_control();
                return KeyAction::Block;
            }
            return if was_swallowed {
                KeyAction::Block
            } else {
                KeyAction::Pass
            };
        }

        let change = self.keys.on_key_up(key);
        if let KeyChange::Released(action) = change {
            self.release_edge(action);
        }
        let was_swallowed = self.swallowed.remove(&key);
        if was_swallowed || matches!(change, KeyChange::Released(_)) {
            KeyAction::Block
        } else {
            KeyAction::Pass
        }
    }

    fn on_abbreviation_key(&mut self, key: ScKey) -> KeyAction {
        self.swallowed.insert(key);

        // Repeats of keys that were already down (override, trigger) are not typing.
        let held = self.keys.get(key).map_or(false, |b| b.is_held());
        if key == self.override_key || held {
            return KeyAction::Block;
        }

        if self.keys.action_of(key) == Some(LogicalAction::Cancel) {
            self.expander.cancel();
            debug!("Abbreviation cancelled");
            self.emit(EngineEvent::Abbreviation(AbbrevOutcome::Cancelled));
            self.emit(EngineEvent::HideAbbreviations);
            return KeyAction::Block;
        }

        let text = keymap::key_text(key);
        let typed = format!("{}{}", self.expander.typed(), text.to_lowercase());
        match self.expander.feed(&text) {
            AbbrevResult::Matching => {
                self.emit(EngineEvent::Abbreviation(AbbrevOutcome::Progress(typed)));
            }
            AbbrevResult::Matched(expansion) => {
                info!("Inserting abbreviation {:?}", typed);
                let result = self.sink.inject_text(&expansion);
                log_sink_error("inject_text", result);
                self.emit(EngineEvent::Abbreviation(AbbrevOutcome::Expanded {
                    trigger: typed,
                    text: expansion,
                }));
                self.emit(EngineEvent::HideAbbreviations);
            }
            AbbrevResult::NoMatch => {
                self.emit(EngineEvent::Abbreviation(AbbrevOutcome::Failed(typed)));
                self.emit(EngineEvent::HideAbbreviations);
            }
        }
        KeyAction::Block
    }

    fn press_edge(&mut self, action: LogicalAction) {
        if action == LogicalAction::EnterAbbreviationMode {
            self.expander.begin();
            self.emit(EngineEvent::Abbreviation(AbbrevOutcome::Started));
            let entries: Vec<(String, String)> = self
                .expander
                .table()
                .entries()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            self.emit(EngineEvent::ShowAbbreviations(entries));
            return;
        }
        if let Some(sign) = action.scroll_sign() {
            if self.tuning.scroll_amount != 0 {
                let result = self.sink.scroll_vertical(sign * self.tuning.scroll_amount);
                log_sink_error("scroll_vertical", result);
            }
            return;
        }
        if let Some(button) = action.button() {
            let result = self.sink.button_down(button);
            log_sink_error("button_down", result);
        }
    }

    fn release_edge(&mut self, action: LogicalAction) {
        if let Some(button) = action.button() {
            let result = self.sink.button_up(button);
            log_sink_error("button_up", result);
        }
    }

    fn enter_control(&mut self, now: Instant) {
        let pos = self.display.cursor_position();
        self.motion.arm(pos, now);
        info!("Controlling from {:?}", pos);
        self.send_tick(TickControl::Start(self.tuning.tick_period()));
        self.emit(EngineEvent::ControlChanged(true));
    }

    fn exit_control(&mut self) {
        self.send_tick(TickControl::Stop);

        // Buttons still latched lost their key-up somewhere; release them now.
        for action in self.keys.release_all() {
            self.release_edge(action);
        }
        if self.expander.cancel() {
            self.emit(EngineEvent::Abbreviation(AbbrevOutcome::Cancelled));
            self.emit(EngineEvent::HideAbbreviations);
        }

        self.motion
            .arm(self.display.cursor_position(), Instant::now());
        info!("Not controlling");
        self.emit(EngineEvent::ControlChanged(false));
    }

    fn center_cursor(&mut self, now: Instant) {
        let pos = self.display.cursor_position();
        let center = self.display.display_bounds(pos).center();
        let result = self.sink.move_cursor_to(center.x, center.y);
        log_sink_error("move_cursor_to", result);
        self.motion.arm(center, now);
        info!("Centered cursor at {:?}", center);
        self.emit(EngineEvent::CursorCentered(center));
    }

    /// Runs one motion tick. Does nothing unless control is held.
    pub fn tick(&mut self, now: Instant) -> Option<TickOutput> {
        if !self.mode.is_controlled() {
            return None;
        }
        let out = self.motion.step(now, &self.keys, &self.tuning);
        for amount in &out.scrolls {
            let result = self.sink.scroll_vertical(*amount);
            log_sink_error("scroll_vertical", result);
        }
        let result = self.sink.move_cursor_to(out.cursor.x, out.cursor.y);
        log_sink_error("move_cursor_to", result);
        Some(out)
    }

    fn send_tick(&self, cmd: TickControl) {
        if let Some(ref tx) = self.tick_control {
            if tx.send(cmd).is_err() {
                debug!("Ticker is gone, dropping {:?}", cmd);
            }
        }
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(ref cb) = self.on_event {
            cb(&event);
        }
    }
}

fn log_sink_error(what: &str, result: anyhow::Result<()>) {
    if let Err(e) = result {
        warn!("Output sink {} failed: {:#}", what, e);
    }
}
