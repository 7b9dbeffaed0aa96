use crate::engine::Engine;
use crossbeam_channel::{select, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// The single lock serializing hook events and ticks.
pub type SharedEngine = Arc<Mutex<Engine>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    /// (Re)start ticking with the given period.
    Start(Duration),
    Stop,
    Shutdown,
}

/// Background thread that drives `Engine::tick` while control is held.
pub struct Ticker {
    tx: Sender<TickControl>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Wires the engine to a new ticker thread.
    pub fn spawn(engine: SharedEngine) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        {
            let mut e = engine.lock();
            e.set_tick_control(tx.clone());
            if e.is_controlled() {
                let _ = tx.send(TickControl::Start(e.tuning().tick_period()));
            }
        }
        let handle = std::thread::spawn(move || run_ticker(engine, rx));
        Self {
            tx,
            handle: Some(handle),
        }
    }

    pub fn shutdown(mut self) {
        self.stop_thread();
    }

    fn stop_thread(&mut self) {
        let _ = self.tx.send(TickControl::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop_thread();
    }
}

fn run_ticker(engine: SharedEngine, rx: Receiver<TickControl>) {
    info!("Tick thread started");
    let mut ticker: Option<Receiver<Instant>> = None;
    loop {
        let tick_rx = ticker.clone().unwrap_or_else(crossbeam_channel::never);
        select! {
            recv(rx) -> msg => match msg {
                Ok(TickControl::Start(period)) => {
                    debug!("Ticking every {:?}", period);
                    ticker = Some(crossbeam_channel::tick(period));
                }
                Ok(TickControl::Stop) => ticker = None,
                Ok(TickControl::Shutdown) | Err(_) => break,
            },
            recv(tick_rx) -> _ => {
                // A tick that lost the race against Stop finds the engine idle and does nothing.
                engine.lock().tick(Instant::now());
            }
        }
    }
    info!("Tick thread exited");
}
