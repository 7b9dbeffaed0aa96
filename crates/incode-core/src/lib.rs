pub mod abbrev;
pub mod bindings;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
#[cfg(windows)]
pub mod keyboard_hook;
pub mod keymap;
pub mod mode;
pub mod motion;
pub mod runtime;
pub mod sink;
pub mod types;

pub use engine::{Engine, EngineEvent};
pub use error::Error;
pub use runtime::{SharedEngine, Ticker};
pub use types::{KeyAction, KeyEvent, ScKey};
