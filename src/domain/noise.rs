//! Low-pass filtered random signal used to bend the endless road.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::PathError;

#[derive(Clone, Debug, PartialEq)]
pub struct NoiseConfig {
    /// Bound of the output signal.
    pub amplitude: f64,
    /// Smoothing factor in `(0, 1)`. Closer to 1 relaxes slower.
    pub smoothing: f64,
    /// Probability per call of drawing a new target.
    pub resample_probability: f64,
}

impl NoiseConfig {
    pub fn validate(&self) -> Result<(), PathError> {
        if !(self.smoothing > 0.0 && self.smoothing < 1.0) {
            return Err(PathError::InvalidSmoothing(self.smoothing));
        }
        if !(0.0..=1.0).contains(&self.resample_probability) {
            return Err(PathError::InvalidProbability(self.resample_probability));
        }
        Ok(())
    }

    /// Relaxation rate `k` in `value += (target - value) * (1 - exp(-dt * k))`.
    pub fn rate(&self) -> f64 {
        60.0 * (1.0 - self.smoothing)
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            amplitude: 0.008,
            smoothing: 0.97,
            resample_probability: 0.02,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SmoothedNoise {
    target: f64,
    value: f64,
    config: NoiseConfig,
    rng: ChaCha8Rng,
}

impl SmoothedNoise {
    pub fn new(config: NoiseConfig, seed: u64) -> Self {
        Self {
            target: 0.0,
            value: 0.0,
            config: NoiseConfig {
                amplitude: config.amplitude.abs(),
                ..config
            },
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn amplitude(&self) -> f64 {
        self.config.amplitude
    }

    /// Restarts the signal from rest with a fresh random sequence.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.target = 0.0;
        self.value = 0.0;
    }

    /// Advances the signal by `dt` seconds. The result stays within `[-amplitude, amplitude]`.
    pub fn next(&mut self, dt: f64) -> f64 {
        if self.rng.random::<f64>() < self.config.resample_probability {
            let amplitude = self.config.amplitude;
            self.target = self.rng.random_range(-amplitude..=amplitude);
        }
        let blend = 1.0 - (-dt.max(0.0) * self.config.rate()).exp();
        self.value += (self.target - self.value) * blend;
        self.value
    }
}
