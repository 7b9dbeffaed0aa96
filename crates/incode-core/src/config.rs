use crate::bindings::LogicalAction;
use crate::error::{Error, Result};
use crate::keymap;
use crate::types::ScKey;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Numeric tuning values. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Cursor speed in pixels per second at unit acceleration scale.
    pub speed: f64,
    /// Growth of the movement scale per second of hold.
    pub accel: f64,
    pub scroll_scale: f64,
    pub scroll_accel: f64,
    /// Wheel amount of the one-shot nudge on scroll-key press.
    pub scroll_amount: i32,
    pub filter_frequency: f64,
    pub filter_resonance: f64,
    /// Motion tick rate, also the filter sample rate.
    pub tick_hz: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            speed: 300.0,
            accel: 15.0,
            scroll_scale: 0.7,
            scroll_accel: 1.15,
            scroll_amount: 1,
            filter_frequency: 10.0,
            filter_resonance: 2.5,
            tick_hz: 100.0,
        }
    }
}

impl Tuning {
    pub fn tick_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.tick_hz)
    }

    /// Rejects values the motion loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("speed", self.speed),
            ("accel", self.accel),
            ("scroll_scale", self.scroll_scale),
            ("scroll_accel", self.scroll_accel),
            ("tick_hz", self.tick_hz),
        ] {
            if !usable(name, value) {
                return Err(Error::Config(format!("tuning {} = {} is out of range", name, value)));
            }
        }
        if self.scroll_amount < 0 {
            return Err(Error::Config(format!(
                "tuning scroll_amount = {} is negative",
                self.scroll_amount
            )));
        }
        Ok(())
    }
}

fn usable(name: &str, value: f64) -> bool {
    value.is_finite() && value >= 0.0 && !(name == "tick_hz" && value == 0.0)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tuning: Tuning,
    pub abbreviations: BTreeMap<String, String>,
    pub override_key: String,
    /// Key name -> action.
    pub bindings: BTreeMap<String, LogicalAction>,
    pub center_debounce_ms: u64,
}

fn default_bindings() -> BTreeMap<String, LogicalAction> {
    [
        ("e", LogicalAction::MoveUp),
        ("s", LogicalAction::MoveLeft),
        ("d", LogicalAction::MoveDown),
        ("f", LogicalAction::MoveRight),
        ("r", LogicalAction::ScrollUp),
        ("v", LogicalAction::ScrollDown),
        ("space", LogicalAction::LeftButtonHold),
        ("g", LogicalAction::RightButtonHold),
        ("q", LogicalAction::EnterAbbreviationMode),
        ("escape", LogicalAction::Cancel),
    ]
    .into_iter()
    .map(|(k, a)| (k.to_string(), a))
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tuning: Tuning::default(),
            abbreviations: BTreeMap::new(),
            override_key: "rcontrol".to_string(),
            bindings: default_bindings(),
            center_debounce_ms: 300,
        }
    }
}

impl Config {
    pub fn override_scancode(&self) -> Result<ScKey> {
        keymap::key_by_name(&self.override_key)
            .ok_or_else(|| Error::UnknownKey(self.override_key.clone()))
    }

    /// Resolved bindings. Unknown key names are skipped.
    pub fn resolved_bindings(&self) -> Vec<(ScKey, LogicalAction)> {
        let mut out = Vec::with_capacity(self.bindings.len());
        for (name, action) in &self.bindings {
            match keymap::key_by_name(name) {
                Some(key) => out.push((key, *action)),
                None => warn!("Ignoring binding for unknown key {:?}", name),
            }
        }
        out
    }
}

/// Reads the config file, falling back to defaults when it is missing or unreadable.
pub fn load_config<P: AsRef<Path>>(path: P) -> Config {
    let path = path.as_ref();
    match std::fs::read(path) {
        Ok(raw) => parse_config_bytes(&raw),
        Err(e) => {
            warn!("Config {:?} not readable ({}), using defaults", path, e);
            Config::default()
        }
    }
}

pub fn parse_config_bytes(raw: &[u8]) -> Config {
    let text = decode_config_bytes(raw);
    parse_config(&text)
}

/// Parses config JSON. Malformed input yields the defaults.
pub fn parse_config(text: &str) -> Config {
    match serde_json::from_str::<Config>(text) {
        Ok(cfg) => sanitize(cfg),
        Err(e) => {
            warn!("Config parse failed ({}), using defaults", e);
            Config::default()
        }
    }
}

/// Replaces individually nonsensical tuning values with their defaults.
fn sanitize(mut cfg: Config) -> Config {
    let d = Tuning::default();
    let t = &mut cfg.tuning;
    for (name, value, default) in [
        ("speed", &mut t.speed, d.speed),
        ("accel", &mut t.accel, d.accel),
        ("scroll_scale", &mut t.scroll_scale, d.scroll_scale),
        ("scroll_accel", &mut t.scroll_accel, d.scroll_accel),
        ("tick_hz", &mut t.tick_hz, d.tick_hz),
    ] {
        if !usable(name, *value) {
            warn!("Tuning {} = {} is invalid, using {}", name, value, default);
            *value = default;
        }
    }
    if t.scroll_amount < 0 {
        warn!("Tuning scroll_amount = {} is invalid", t.scroll_amount);
        t.scroll_amount = d.scroll_amount;
    }
    cfg
}

fn decode_config_bytes(raw: &[u8]) -> Cow<'_, str> {
    if let Some((enc, bom_len)) = encoding_rs::Encoding::for_bom(raw) {
        debug!("Config decoded using BOM: {}", enc.name());
        let (cow, _, had_errors) = enc.decode(&raw[bom_len..]);
        if had_errors {
            warn!("Config decode had errors (replacement characters used)");
        }
        return cow;
    }
    String::from_utf8_lossy(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg = parse_config(r#"{ "tuning": { "speed": 250 }, "abbreviations": { "td": "test@domain.com" } }"#);
        assert_eq!(cfg.tuning.speed, 250.0);
        assert_eq!(cfg.tuning.accel, 15.0);
        assert_eq!(cfg.override_key, "rcontrol");
        assert_eq!(cfg.abbreviations.get("td").map(String::as_str), Some("test@domain.com"));
        assert_eq!(cfg.bindings.len(), 10);
    }

    #[test]
    fn test_malformed_config_falls_back() {
        let cfg = parse_config("{ not json");
        assert_eq!(cfg.tuning, Tuning::default());
        assert!(cfg.abbreviations.is_empty());
    }

    #[test]
    fn test_invalid_values_are_replaced() {
        let cfg = parse_config(r#"{ "tuning": { "speed": -3, "tick_hz": 0, "scroll_amount": -1 } }"#);
        assert_eq!(cfg.tuning.speed, 300.0);
        assert_eq!(cfg.tuning.tick_hz, 100.0);
        assert_eq!(cfg.tuning.scroll_amount, 1);
    }

    #[test]
    fn test_validate_names_bad_value() {
        assert!(Tuning::default().validate().is_ok());
        let bad = Tuning {
            tick_hz: 0.0,
            ..Tuning::default()
        };
        match bad.validate() {
            Err(Error::Config(msg)) => assert!(msg.contains("tick_hz")),
            other => panic!("unexpected {:?}", other),
        }
        let bad = Tuning {
            accel: f64::NAN,
            ..Tuning::default()
        };
        assert!(matches!(bad.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_decode_utf16_with_bom() {
        let json = r#"{ "override_key": "oem_backslash" }"#;
        let mut raw = vec![0xFF, 0xFE];
        for unit in json.encode_utf16() {
            raw.extend_from_slice(&unit.to_le_bytes());
        }
        let cfg = parse_config_bytes(&raw);
        assert_eq!(cfg.override_key, "oem_backslash");
        assert_eq!(cfg.override_scancode().unwrap(), ScKey::new(0x56, false));
    }

    #[test]
    fn test_decode_utf8_with_bom() {
        let mut raw = vec![0xEF, 0xBB, 0xBF];
        raw.extend_from_slice(br#"{ "center_debounce_ms": 500 }"#);
        assert_eq!(parse_config_bytes(&raw).center_debounce_ms, 500);
    }

    #[test]
    fn test_bindings_resolution() {
        let cfg = parse_config(r#"{ "bindings": { "I": "MoveUp", "bogus": "MoveDown" } }"#);
        let resolved = cfg.resolved_bindings();
        assert_eq!(resolved, vec![(ScKey::new(0x17, false), LogicalAction::MoveUp)]);
    }

    #[test]
    fn test_unknown_override_key() {
        let cfg = parse_config(r#"{ "override_key": "hyper" }"#);
        assert!(matches!(cfg.override_scancode(), Err(Error::UnknownKey(_))));
    }

    #[test]
    fn test_missing_file() {
        let cfg = load_config("/nonexistent/incode/config.json");
        assert_eq!(cfg.center_debounce_ms, 300);
    }
}
