//! Biosensor acquisition and normalization.
//!
//! A [`SensorNode`] probes a [`SensorPlatform`] once at startup and
//! then serves normalized readings in `[0, 1]`. Missing or failing
//! hardware degrades to absent values; it never takes the node down.

mod driver;
mod iio;
pub mod normalize;
mod node;
mod reading;
mod simulated;

pub use driver::{Accelerometer, LightSensor, SensorError, SensorPlatform, TemperatureSensor};
pub use iio::{IioPlatform, DEFAULT_IIO_ROOT};
pub use node::SensorNode;
pub use reading::{
    unix_timestamp, ReadFailure, Reading, SensorHealth, SensorReadings, ACCELERATION, LIGHT,
    TEMPERATURE,
};
pub use simulated::SimulatedPlatform;
