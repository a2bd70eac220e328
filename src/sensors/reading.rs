//! Reading and health report types.

use super::driver::SensorError;
use serde::Serialize;

/// Capability names as they appear in reports.
pub const LIGHT: &str = "light";
/// Temperature capability name.
pub const TEMPERATURE: &str = "temperature";
/// Acceleration capability name.
pub const ACCELERATION: &str = "acceleration";

/// Why a reader produced no value.
#[derive(Debug, thiserror::Error)]
pub enum ReadFailure {
    /// Probe-time initialization failed; no read attempted.
    #[error("{0} sensor unavailable")]
    Unavailable(&'static str),
    /// The driver produced a null value.
    #[error("{0} sensor returned no value")]
    NoValue(&'static str),
    /// The driver produced NaN or infinity.
    #[error("{0} sensor returned a non-finite value")]
    NonFinite(&'static str),
    /// The driver raised an error during the read.
    #[error("{capability} read failed: {source}")]
    Driver {
        /// Capability that failed.
        capability: &'static str,
        /// Underlying driver error.
        #[source]
        source: SensorError,
    },
}

/// Outcome of a single bounded read.
pub type Reading = Result<f64, ReadFailure>;

/// Normalized values from one composite read.
///
/// Serialized field names are part of the HTTP contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReadings {
    /// Normalized light level.
    pub light: Option<f64>,
    /// Normalized temperature.
    pub temperature: Option<f64>,
    /// Normalized acceleration magnitude.
    pub acceleration: Option<f64>,
    /// Unix seconds, captured once at the start of the composite read.
    pub timestamp: f64,
}

/// Probe-time availability of each capability and the shared bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorHealth {
    /// Light sensor initialized.
    pub light: bool,
    /// Temperature sensor initialized.
    pub temperature: bool,
    /// Accelerometer initialized.
    pub acceleration: bool,
    /// Shared sensor bus initialized.
    pub i2c: bool,
}

impl SensorHealth {
    /// Number of sensors (excluding the bus) that are available.
    pub fn active_sensors(&self) -> usize {
        [self.light, self.temperature, self.acceleration]
            .iter()
            .filter(|&&up| up)
            .count()
    }

    /// Iterates `(name, available)` pairs in report order.
    pub fn entries(&self) -> [(&'static str, bool); 4] {
        [
            (LIGHT, self.light),
            (TEMPERATURE, self.temperature),
            (ACCELERATION, self.acceleration),
            ("i2c", self.i2c),
        ]
    }
}

/// Current time as fractional unix seconds.
pub fn unix_timestamp() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
