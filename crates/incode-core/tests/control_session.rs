use incode_core::abbrev::AbbrevOutcome;
use incode_core::config::parse_config;
use incode_core::sink::{FixedDisplay, RecordingSink, SinkCall};
use incode_core::types::{KeyAction, KeyEvent, Point, Rect, ScKey};
use incode_core::{Engine, EngineEvent};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

const RCTRL: ScKey = ScKey::new(0x1D, true);
const Q: ScKey = ScKey::new(0x10, false);
const G: ScKey = ScKey::new(0x22, false);
const M: ScKey = ScKey::new(0x32, false);
const F: ScKey = ScKey::new(0x21, false);
const A: ScKey = ScKey::new(0x1E, false);

const CONFIG: &str = r#"{
    "tuning": { "speed": 300, "accel": 15 },
    "abbreviations": { "GM": "someone@example.com", "gh": "https://github.com" }
}"#;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn right_hold_for_one_second_is_superlinear() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let sink = RecordingSink::new();
    let display = FixedDisplay::new(Rect::new(-1920, 0, 1920, 1080), Point::new(-960, 540));
    let mut engine =
        Engine::new(&parse_config(CONFIG), Box::new(sink.clone()), Box::new(display)).unwrap();

    let t0 = Instant::now();
    engine.process_key(KeyEvent::down(RCTRL, t0));
    engine.process_key(KeyEvent::down(F, t0));

    let mut xs = vec![engine.target().0];
    for i in 1..=100 {
        engine.tick(t0 + ms(10 * i));
        xs.push(engine.target().0);
    }

    let velocity: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    assert!(velocity.iter().all(|v| *v > 0.0));
    assert!(velocity.windows(2).all(|w| w[1] > w[0]));
    // 0.01 s * 300 * 15 * t summed over the hold: 22.5 * (sum of i) / 100
    let expected = -960.0 + 0.45 * (100.0 * 101.0 / 2.0);
    assert!((xs[100] - expected).abs() < 1e-6, "{} vs {}", xs[100], expected);

    let calls = sink.take();
    assert_eq!(calls.len(), 100);
    assert!(calls.iter().all(|c| matches!(c, SinkCall::MoveTo(_, 540))));
}

#[test]
fn abbreviation_session_round_trip() {
    let sink = RecordingSink::new();
    let display = FixedDisplay::new(Rect::new(0, 0, 1920, 1080), Point::new(10, 10));
    let mut engine =
        Engine::new(&parse_config(CONFIG), Box::new(sink.clone()), Box::new(display)).unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let log = events.clone();
    engine.set_on_event(move |e| log.lock().push(e.clone()));

    let t0 = Instant::now();
    engine.process_key(KeyEvent::down(RCTRL, t0));
    engine.process_key(KeyEvent::down(Q, t0 + ms(5)));
    engine.process_key(KeyEvent::up(Q, t0 + ms(15)));

    // "g" is also the right-button binding; while abbreviating it is just text
    assert_eq!(engine.process_key(KeyEvent::down(G, t0 + ms(20))), KeyAction::Block);
    assert_eq!(engine.process_key(KeyEvent::up(G, t0 + ms(25))), KeyAction::Block);
    assert_eq!(engine.process_key(KeyEvent::down(M, t0 + ms(30))), KeyAction::Block);
    assert_eq!(engine.process_key(KeyEvent::up(M, t0 + ms(35))), KeyAction::Block);
    assert_eq!(sink.take(), vec![SinkCall::Text("someone@example.com".into())]);

    // the echo of the injected text reaches the OS and nothing else
    for _ in 0.."someone@example.com".len() {
        assert_eq!(engine.process_key(KeyEvent::down(A, t0 + ms(40))), KeyAction::Pass);
    }
    assert!(!engine.is_abbreviating());
    assert!(engine.is_controlled());

    let events = events.lock();
    assert!(matches!(events[0], EngineEvent::ControlChanged(true)));
    assert_eq!(events[1], EngineEvent::Abbreviation(AbbrevOutcome::Started));
    match &events[2] {
        EngineEvent::ShowAbbreviations(list) => assert_eq!(list.len(), 2),
        other => panic!("expected popup, got {:?}", other),
    }
    assert_eq!(
        events[3],
        EngineEvent::Abbreviation(AbbrevOutcome::Progress("g".into()))
    );
    assert_eq!(
        events[4],
        EngineEvent::Abbreviation(AbbrevOutcome::Expanded {
            trigger: "gm".into(),
            text: "someone@example.com".into()
        })
    );
    assert_eq!(events[5], EngineEvent::HideAbbreviations);
}

#[test]
fn abbreviation_key_is_inert_while_idle() {
    let sink = RecordingSink::new();
    let display = FixedDisplay::new(Rect::new(0, 0, 1920, 1080), Point::new(10, 10));
    let mut engine =
        Engine::new(&parse_config(CONFIG), Box::new(sink.clone()), Box::new(display)).unwrap();

    let t0 = Instant::now();
    assert_eq!(engine.process_key(KeyEvent::down(Q, t0)), KeyAction::Pass);
    assert_eq!(engine.process_key(KeyEvent::down(G, t0)), KeyAction::Pass);
    assert_eq!(engine.process_key(KeyEvent::down(M, t0)), KeyAction::Pass);
    assert!(sink.take().is_empty());
}
