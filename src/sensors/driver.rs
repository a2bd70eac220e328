//! Sensor driver abstraction.
//!
//! Each physical sensor is reached through a small trait so the node
//! can run against kernel drivers, simulated hardware, or test fakes.

use thiserror::Error;

/// Errors raised by sensor drivers.
#[derive(Debug, Error)]
pub enum SensorError {
    /// The shared sensor bus could not be opened.
    #[error("sensor bus unavailable: {0}")]
    BusUnavailable(String),
    /// No driver for the sensor was found on the bus.
    #[error("sensor device not found: {0}")]
    DeviceNotFound(String),
    /// Reading a device file failed.
    #[error("sensor I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A device file held an unparsable value.
    #[error("failed to parse sensor value {value:?}: {reason}")]
    Parse {
        /// Raw file contents.
        value: String,
        /// Parser message.
        reason: String,
    },
}

/// Ambient light sensor (TSL2561 class).
pub trait LightSensor: Send + Sync {
    /// Reads illuminance in lux. `Ok(None)` means the driver had no value.
    fn lux(&self) -> Result<Option<f64>, SensorError>;
}

/// Temperature sensor (DHT22 class).
pub trait TemperatureSensor: Send + Sync {
    /// Reads temperature in degrees Celsius.
    fn celsius(&self) -> Result<Option<f64>, SensorError>;
}

/// Three-axis accelerometer (MPU6050 class).
pub trait Accelerometer: Send + Sync {
    /// Reads acceleration in m/s² along x, y and z.
    fn acceleration(&self) -> Result<Option<[f64; 3]>, SensorError>;
}

/// Source of sensor drivers, consulted once at probe time.
///
/// `open_bus` is always called first; the individual `open_*` methods
/// are only called if the bus came up.
pub trait SensorPlatform {
    /// Initializes the shared transport bus.
    fn open_bus(&mut self) -> Result<(), SensorError>;

    /// Creates the light sensor driver.
    fn open_light(&mut self) -> Result<Box<dyn LightSensor>, SensorError>;

    /// Creates the temperature sensor driver.
    fn open_temperature(&mut self) -> Result<Box<dyn TemperatureSensor>, SensorError>;

    /// Creates the accelerometer driver.
    fn open_accelerometer(&mut self) -> Result<Box<dyn Accelerometer>, SensorError>;
}
