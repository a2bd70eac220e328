//! Sensors exposed by the Linux Industrial I/O subsystem.
//!
//! On a Raspberry Pi the TSL2561, DHT22 and MPU6050 are bound to the
//! kernel's `tsl2563`, `dht11` and `inv_mpu6050` drivers, which publish
//! their channels as sysfs attributes under `/sys/bus/iio/devices`.

use super::driver::{Accelerometer, LightSensor, SensorError, SensorPlatform, TemperatureSensor};
use std::fs;
use std::path::{Path, PathBuf};

/// Default sysfs location of IIO devices.
pub const DEFAULT_IIO_ROOT: &str = "/sys/bus/iio/devices";

const LIGHT_NAMES: &[&str] = &["tsl2560", "tsl2561", "tsl2562", "tsl2563"];
const TEMPERATURE_NAMES: &[&str] = &["dht11", "dht22"];
const ACCELEROMETER_NAMES: &[&str] = &["mpu6050"];

/// Sensor platform backed by IIO sysfs attributes.
#[derive(Debug, Clone)]
pub struct IioPlatform {
    root: PathBuf,
    devices: Vec<(String, PathBuf)>,
}

impl IioPlatform {
    /// Creates a platform rooted at the given IIO devices directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            devices: Vec::new(),
        }
    }

    fn find_device(&self, names: &[&str]) -> Result<PathBuf, SensorError> {
        self.devices
            .iter()
            .find(|(name, _)| names.contains(&name.as_str()))
            .map(|(_, dir)| dir.clone())
            .ok_or_else(|| SensorError::DeviceNotFound(names.join("/")))
    }
}

impl Default for IioPlatform {
    fn default() -> Self {
        Self::new(DEFAULT_IIO_ROOT)
    }
}

impl SensorPlatform for IioPlatform {
    fn open_bus(&mut self) -> Result<(), SensorError> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            SensorError::BusUnavailable(format!("{}: {}", self.root.display(), e))
        })?;

        self.devices.clear();
        for entry in entries.flatten() {
            let dir = entry.path();
            if let Ok(name) = fs::read_to_string(dir.join("name")) {
                tracing::debug!(device = %dir.display(), name = name.trim(), "Found IIO device");
                self.devices.push((name.trim().to_string(), dir));
            }
        }
        self.devices.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(())
    }

    fn open_light(&mut self) -> Result<Box<dyn LightSensor>, SensorError> {
        let dir = self.find_device(LIGHT_NAMES)?;
        let channel = ["in_illuminance0_input", "in_illuminance_input"]
            .iter()
            .map(|c| dir.join(c))
            .find(|p| p.exists())
            .ok_or_else(|| {
                SensorError::DeviceNotFound(format!("{}: no illuminance channel", dir.display()))
            })?;
        Ok(Box::new(IioLight { channel }))
    }

    fn open_temperature(&mut self) -> Result<Box<dyn TemperatureSensor>, SensorError> {
        let dir = self.find_device(TEMPERATURE_NAMES)?;
        let channel = require(dir.join("in_temp_input"))?;
        Ok(Box::new(IioTemperature { channel }))
    }

    fn open_accelerometer(&mut self) -> Result<Box<dyn Accelerometer>, SensorError> {
        let dir = self.find_device(ACCELEROMETER_NAMES)?;
        let axes = [
            require(dir.join("in_accel_x_raw"))?,
            require(dir.join("in_accel_y_raw"))?,
            require(dir.join("in_accel_z_raw"))?,
        ];
        let scale = read_value(&require(dir.join("in_accel_scale"))?)?
            .ok_or_else(|| SensorError::Parse {
                value: String::new(),
                reason: "empty accelerometer scale".into(),
            })?;
        Ok(Box::new(IioAccelerometer { axes, scale }))
    }
}

struct IioLight {
    channel: PathBuf,
}

impl LightSensor for IioLight {
    fn lux(&self) -> Result<Option<f64>, SensorError> {
        read_value(&self.channel)
    }
}

struct IioTemperature {
    channel: PathBuf,
}

impl TemperatureSensor for IioTemperature {
    fn celsius(&self) -> Result<Option<f64>, SensorError> {
        // Published in milli-degrees Celsius.
        Ok(read_value(&self.channel)?.map(|milli| milli / 1000.0))
    }
}

struct IioAccelerometer {
    axes: [PathBuf; 3],
    scale: f64,
}

impl Accelerometer for IioAccelerometer {
    fn acceleration(&self) -> Result<Option<[f64; 3]>, SensorError> {
        let mut out = [0.0; 3];
        for (slot, path) in out.iter_mut().zip(&self.axes) {
            match read_value(path)? {
                Some(raw) => *slot = raw * self.scale,
                None => return Ok(None),
            }
        }
        Ok(Some(out))
    }
}

fn require(path: PathBuf) -> Result<PathBuf, SensorError> {
    if path.exists() {
        Ok(path)
    } else {
        Err(SensorError::DeviceNotFound(path.display().to_string()))
    }
}

/// Reads one sysfs attribute. An empty attribute is an absent value.
fn read_value(path: &Path) -> Result<Option<f64>, SensorError> {
    let content = fs::read_to_string(path)?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|e| SensorError::Parse {
            value: trimmed.to_string(),
            reason: e.to_string(),
        })
}
