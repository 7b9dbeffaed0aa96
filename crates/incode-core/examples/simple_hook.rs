//! Loads `config.json` from the working directory and runs the hook.
//! Off Windows it replays a short scripted session against a recording sink.

use incode_core::config;

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    use incode_core::keyboard_hook::{self, SendInputSink, Win32Display};
    use incode_core::{Engine, SharedEngine, Ticker};
    use parking_lot::Mutex;
    use std::sync::Arc;

    tracing_subscriber::fmt::init();

    let cfg = config::load_config("config.json");
    let engine = Engine::new(&cfg, Box::new(SendInputSink), Box::new(Win32Display))?;
    let engine: SharedEngine = Arc::new(Mutex::new(engine));
    engine.lock().set_on_event(|e| tracing::info!("event: {:?}", e));

    let _ticker = Ticker::spawn(engine.clone());
    keyboard_hook::install_hook(engine)?;
    println!("Hold {} to steer the cursor.", cfg.override_key);
    keyboard_hook::run_event_loop();
    keyboard_hook::uninstall_hook();
    Ok(())
}

#[cfg(not(windows))]
fn main() -> anyhow::Result<()> {
    use incode_core::sink::{FixedDisplay, RecordingSink};
    use incode_core::types::{KeyEvent, Point, Rect};
    use incode_core::{keymap, Engine};
    use std::time::{Duration, Instant};

    tracing_subscriber::fmt::init();

    let cfg = config::load_config("config.json");
    let sink = RecordingSink::new();
    let display = FixedDisplay::new(Rect::new(0, 0, 1920, 1080), Point::new(960, 540));
    let mut engine = Engine::new(&cfg, Box::new(sink.clone()), Box::new(display))?;

    let key = |name: &str| {
        keymap::key_by_name(name).ok_or_else(|| anyhow::anyhow!("no key named {}", name))
    };
    let t0 = Instant::now();
    engine.process_key(KeyEvent::down(cfg.override_scancode()?, t0));
    engine.process_key(KeyEvent::down(key("f")?, t0));
    for i in 1..=50 {
        engine.tick(t0 + Duration::from_millis(10 * i));
    }
    engine.process_key(KeyEvent::up(key("f")?, t0 + Duration::from_millis(500)));
    engine.process_key(KeyEvent::up(cfg.override_scancode()?, t0 + Duration::from_millis(510)));

    for call in sink.take() {
        println!("{:?}", call);
    }
    Ok(())
}
