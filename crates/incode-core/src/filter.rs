use crate::error::{Error, Result};
use std::f64::consts::PI;

/// Resonant second-order low-pass filter, one per cursor axis.
///
/// Index 0 of each history ring is the newest sample.
#[derive(Debug, Clone)]
pub struct LowPass {
    input: [f64; 3],
    output: [f64; 3],
    a1: f64,
    a2: f64,
    a3: f64,
    b1: f64,
    b2: f64,
}

impl LowPass {
    /// `cutoff` must lie strictly between 0 and the Nyquist frequency of `sample_rate`.
    pub fn new(sample_rate: f64, cutoff: f64, resonance: f64) -> Result<Self> {
        let valid = sample_rate.is_finite()
            && cutoff.is_finite()
            && resonance.is_finite()
            && sample_rate > 0.0
            && cutoff > 0.0
            && resonance > 0.0
            && cutoff < sample_rate / 2.0;
        if !valid {
            return Err(Error::InvalidFilter {
                sample_rate,
                cutoff,
                resonance,
            });
        }

        let c = 1.0 / (PI * cutoff / sample_rate).tan();
        let a1 = 1.0 / (1.0 + resonance * c + c * c);

        Ok(Self {
            input: [0.0; 3],
            output: [0.0; 3],
            a1,
            a2: 2.0 * a1,
            a3: a1,
            b1: 2.0 * (1.0 - c * c) * a1,
            b2: (1.0 - resonance * c + c * c) * a1,
        })
    }

    pub fn next(&mut self, value: f64) -> f64 {
        self.input[2] = self.input[1];
        self.input[1] = self.input[0];
        self.input[0] = value;
        self.output[2] = self.output[1];
        self.output[1] = self.output[0];

        self.output[0] = self.a1 * self.input[0] + self.a2 * self.input[1] + self.a3 * self.input[2]
            - self.b1 * self.output[1]
            - self.b2 * self.output[2];
        self.output[0]
    }

    /// Forces the whole history to `value` so the next output starts there.
    pub fn set(&mut self, value: f64) {
        self.input = [value; 3];
        self.output = [value; 3];
    }
}
