//! Simulated sensors for running the node without hardware.
//!
//! Values are drawn fresh on every read from plausible indoor ranges
//! and go through the same normalization as real readings.

use super::driver::{Accelerometer, LightSensor, SensorError, SensorPlatform, TemperatureSensor};
use rand::Rng;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use std::sync::{Arc, Mutex};

const STANDARD_GRAVITY: f64 = 9.806_65;

/// Platform whose bus and sensors always initialize.
pub struct SimulatedPlatform {
    rng: Arc<Mutex<ChaCha20Rng>>,
}

impl SimulatedPlatform {
    /// Creates a platform seeded from OS entropy.
    pub fn new() -> Self {
        Self::from_rng(ChaCha20Rng::from_entropy())
    }

    /// Creates a reproducible platform.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(ChaCha20Rng::seed_from_u64(seed))
    }

    fn from_rng(rng: ChaCha20Rng) -> Self {
        Self {
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    fn sensor(&self) -> SimulatedSensor {
        SimulatedSensor {
            rng: Arc::clone(&self.rng),
        }
    }
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPlatform for SimulatedPlatform {
    fn open_bus(&mut self) -> Result<(), SensorError> {
        tracing::info!("Using simulated sensor bus");
        Ok(())
    }

    fn open_light(&mut self) -> Result<Box<dyn LightSensor>, SensorError> {
        Ok(Box::new(self.sensor()))
    }

    fn open_temperature(&mut self) -> Result<Box<dyn TemperatureSensor>, SensorError> {
        Ok(Box::new(self.sensor()))
    }

    fn open_accelerometer(&mut self) -> Result<Box<dyn Accelerometer>, SensorError> {
        Ok(Box::new(self.sensor()))
    }
}

struct SimulatedSensor {
    rng: Arc<Mutex<ChaCha20Rng>>,
}

impl SimulatedSensor {
    fn sample<T>(&self, f: impl FnOnce(&mut ChaCha20Rng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut *rng)
    }
}

impl LightSensor for SimulatedSensor {
    fn lux(&self) -> Result<Option<f64>, SensorError> {
        Ok(Some(self.sample(|rng| rng.gen_range(300.0..=700.0))))
    }
}

impl TemperatureSensor for SimulatedSensor {
    fn celsius(&self) -> Result<Option<f64>, SensorError> {
        Ok(Some(self.sample(|rng| rng.gen_range(15.0..=25.0))))
    }
}

impl Accelerometer for SimulatedSensor {
    fn acceleration(&self) -> Result<Option<[f64; 3]>, SensorError> {
        Ok(Some(self.sample(|rng| {
            [
                rng.gen_range(-0.5..=0.5),
                rng.gen_range(-0.5..=0.5),
                STANDARD_GRAVITY + rng.gen_range(-0.5..=0.5),
            ]
        })))
    }
}
