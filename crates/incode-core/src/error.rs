use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid filter: sample rate {sample_rate} Hz, cutoff {cutoff} Hz, resonance {resonance}")]
    InvalidFilter {
        sample_rate: f64,
        cutoff: f64,
        resonance: f64,
    },
    #[error("unknown key name: {0:?}")]
    UnknownKey(String),
    #[error("config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
