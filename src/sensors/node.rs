//! The biosensor node: probe once, then read on demand.

use super::driver::{Accelerometer, LightSensor, SensorError, SensorPlatform, TemperatureSensor};
use super::normalize;
use super::reading::{
    unix_timestamp, ReadFailure, Reading, SensorHealth, SensorReadings, ACCELERATION, LIGHT,
    TEMPERATURE,
};
use crate::capability::Capability;

/// Biosensor node holding the capabilities discovered at probe time.
///
/// The node is immutable after [`SensorNode::probe`] and can be shared
/// read-only across request handlers.
#[derive(Debug)]
pub struct SensorNode {
    bus_available: bool,
    light: Capability<Box<dyn LightSensor>>,
    temperature: Capability<Box<dyn TemperatureSensor>>,
    accelerometer: Capability<Box<dyn Accelerometer>>,
}

impl SensorNode {
    /// Probes the platform for each sensor independently.
    ///
    /// Never fails: a sensor that cannot be initialized is recorded as
    /// unavailable. If the bus itself fails, no sensor is attempted.
    pub fn probe(platform: &mut dyn SensorPlatform) -> Self {
        if let Err(e) = platform.open_bus() {
            tracing::warn!(error = %e, "Sensor bus unavailable; all sensors disabled");
            let reason = e.to_string();
            return Self {
                bus_available: false,
                light: Capability::unavailable(LIGHT, reason.clone()),
                temperature: Capability::unavailable(TEMPERATURE, reason.clone()),
                accelerometer: Capability::unavailable(ACCELERATION, reason),
            };
        }
        tracing::info!("Sensor bus initialized");

        Self {
            bus_available: true,
            light: Capability::initialize(LIGHT, || platform.open_light()),
            temperature: Capability::initialize(TEMPERATURE, || platform.open_temperature()),
            accelerometer: Capability::initialize(ACCELERATION, || platform.open_accelerometer()),
        }
    }

    /// Reads light, normalized over 0–1000 lux.
    pub fn read_light(&self) -> Reading {
        let sensor = self.light.handle().ok_or(ReadFailure::Unavailable(LIGHT))?;
        let lux = finite(LIGHT, sensor.lux())?;
        Ok(normalize::light(lux))
    }

    /// Reads temperature, normalized over 0–40 °C.
    pub fn read_temperature(&self) -> Reading {
        let sensor = self
            .temperature
            .handle()
            .ok_or(ReadFailure::Unavailable(TEMPERATURE))?;
        let celsius = finite(TEMPERATURE, sensor.celsius())?;
        Ok(normalize::temperature(celsius))
    }

    /// Reads acceleration magnitude, normalized over 0–20 m/s².
    pub fn read_acceleration(&self) -> Reading {
        let sensor = self
            .accelerometer
            .handle()
            .ok_or(ReadFailure::Unavailable(ACCELERATION))?;
        let axes = match sensor.acceleration() {
            Ok(Some(axes)) => axes,
            Ok(None) => return Err(ReadFailure::NoValue(ACCELERATION)),
            Err(source) => {
                return Err(ReadFailure::Driver {
                    capability: ACCELERATION,
                    source,
                })
            }
        };
        if axes.iter().any(|a| !a.is_finite()) {
            return Err(ReadFailure::NonFinite(ACCELERATION));
        }
        Ok(normalize::acceleration(axes))
    }

    /// Reads every sensor independently under one shared timestamp.
    pub fn read_all(&self) -> SensorReadings {
        self.read_all_with(|_, _| {})
    }

    /// Like [`SensorNode::read_all`], handing each individual outcome to `observe`.
    pub fn read_all_with<F>(&self, mut observe: F) -> SensorReadings
    where
        F: FnMut(&'static str, &Reading),
    {
        let timestamp = unix_timestamp();
        let mut settle = |capability, reading: Reading| {
            observe(capability, &reading);
            absent_on_failure(reading)
        };
        SensorReadings {
            light: settle(LIGHT, self.read_light()),
            temperature: settle(TEMPERATURE, self.read_temperature()),
            acceleration: settle(ACCELERATION, self.read_acceleration()),
            timestamp,
        }
    }

    /// Reports probe-time availability; never touches the hardware.
    pub fn health_status(&self) -> SensorHealth {
        SensorHealth {
            light: self.light.is_available(),
            temperature: self.temperature.is_available(),
            acceleration: self.accelerometer.is_available(),
            i2c: self.bus_available,
        }
    }

    /// Returns `(capability, reason)` for every sensor that failed to probe.
    pub fn probe_failures(&self) -> Vec<(&'static str, &str)> {
        [
            (self.light.name(), self.light.failure()),
            (self.temperature.name(), self.temperature.failure()),
            (self.accelerometer.name(), self.accelerometer.failure()),
        ]
        .into_iter()
        .filter_map(|(name, failure)| failure.map(|f| (name, f)))
        .collect()
    }
}

fn finite(
    capability: &'static str,
    raw: Result<Option<f64>, SensorError>,
) -> Result<f64, ReadFailure> {
    match raw {
        Ok(Some(v)) if v.is_finite() => Ok(v),
        Ok(Some(_)) => Err(ReadFailure::NonFinite(capability)),
        Ok(None) => Err(ReadFailure::NoValue(capability)),
        Err(source) => Err(ReadFailure::Driver { capability, source }),
    }
}

fn absent_on_failure(reading: Reading) -> Option<f64> {
    match reading {
        Ok(v) => Some(v),
        Err(ReadFailure::Unavailable(_)) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Sensor read failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct FixedLight(Result<Option<f64>, ()>);
    impl LightSensor for FixedLight {
        fn lux(&self) -> Result<Option<f64>, SensorError> {
            self.0
                .map_err(|_| SensorError::DeviceNotFound("light went away".into()))
        }
    }

    struct FixedTemperature(Option<f64>);
    impl TemperatureSensor for FixedTemperature {
        fn celsius(&self) -> Result<Option<f64>, SensorError> {
            Ok(self.0)
        }
    }

    struct FixedAccel([f64; 3]);
    impl Accelerometer for FixedAccel {
        fn acceleration(&self) -> Result<Option<[f64; 3]>, SensorError> {
            Ok(Some(self.0))
        }
    }

    /// Platform whose individual sensors can be set to fail at probe time.
    struct FakePlatform {
        bus_ok: bool,
        light: Option<f64>,
        light_fails_reads: bool,
        temperature: Option<Option<f64>>,
        accel: Option<[f64; 3]>,
        attempts: Arc<AtomicUsize>,
    }

    impl FakePlatform {
        fn healthy() -> Self {
            Self {
                bus_ok: true,
                light: Some(1200.0),
                light_fails_reads: false,
                temperature: Some(Some(-5.0)),
                accel: Some([0.0, 0.0, 9.81]),
                attempts: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl SensorPlatform for FakePlatform {
        fn open_bus(&mut self) -> Result<(), SensorError> {
            if self.bus_ok {
                Ok(())
            } else {
                Err(SensorError::BusUnavailable("no i2c".into()))
            }
        }

        fn open_light(&mut self) -> Result<Box<dyn LightSensor>, SensorError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let lux = self
                .light
                .ok_or_else(|| SensorError::DeviceNotFound("tsl2561".into()))?;
            let reading = if self.light_fails_reads {
                Err(())
            } else {
                Ok(Some(lux))
            };
            Ok(Box::new(FixedLight(reading)))
        }

        fn open_temperature(&mut self) -> Result<Box<dyn TemperatureSensor>, SensorError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let value = self
                .temperature
                .ok_or_else(|| SensorError::DeviceNotFound("dht22".into()))?;
            Ok(Box::new(FixedTemperature(value)))
        }

        fn open_accelerometer(&mut self) -> Result<Box<dyn Accelerometer>, SensorError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let axes = self
                .accel
                .ok_or_else(|| SensorError::DeviceNotFound("mpu6050".into()))?;
            Ok(Box::new(FixedAccel(axes)))
        }
    }

    #[test]
    fn test_healthy_node_clamps_readings() {
        let node = SensorNode::probe(&mut FakePlatform::healthy());
        let readings = node.read_all();

        assert_eq!(readings.light, Some(1.0)); // 1200 lux
        assert_eq!(readings.temperature, Some(0.0)); // -5 °C
        let accel = readings.acceleration.unwrap();
        assert!((accel - 9.81 / 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_failed_probe_reports_false_and_null() {
        let mut platform = FakePlatform::healthy();
        platform.temperature = None;
        let node = SensorNode::probe(&mut platform);

        let health = node.health_status();
        assert!(health.light);
        assert!(!health.temperature);
        assert!(health.acceleration);
        assert!(health.i2c);

        let readings = node.read_all();
        assert!(readings.temperature.is_none());
        assert!(readings.light.is_some());
        assert!(matches!(
            node.read_temperature(),
            Err(ReadFailure::Unavailable(TEMPERATURE))
        ));
        assert_eq!(node.probe_failures().len(), 1);
    }

    #[test]
    fn test_bus_failure_skips_sensor_attempts() {
        let mut platform = FakePlatform::healthy();
        platform.bus_ok = false;
        let attempts = Arc::clone(&platform.attempts);
        let node = SensorNode::probe(&mut platform);

        assert_eq!(attempts.load(Ordering::SeqCst), 0);
        let health = node.health_status();
        assert_eq!(health.active_sensors(), 0);
        assert!(!health.i2c);
        assert_eq!(node.probe_failures().len(), 3);

        let readings = node.read_all();
        assert!(readings.light.is_none());
        assert!(readings.temperature.is_none());
        assert!(readings.acceleration.is_none());
    }

    #[test]
    fn test_read_failure_is_isolated() {
        let mut platform = FakePlatform::healthy();
        platform.light_fails_reads = true;
        let node = SensorNode::probe(&mut platform);

        // Health reflects probe time, not the failing read.
        assert!(node.health_status().light);
        assert!(matches!(
            node.read_light(),
            Err(ReadFailure::Driver { capability: LIGHT, .. })
        ));

        let readings = node.read_all();
        assert!(readings.light.is_none());
        assert_eq!(readings.temperature, Some(0.0));
        assert!(readings.acceleration.is_some());
    }

    #[test]
    fn test_observer_sees_every_outcome() {
        let mut platform = FakePlatform::healthy();
        platform.accel = None;
        let node = SensorNode::probe(&mut platform);

        let mut seen = Vec::new();
        node.read_all_with(|capability, reading| seen.push((capability, reading.is_ok())));
        assert_eq!(
            seen,
            vec![(LIGHT, true), (TEMPERATURE, true), (ACCELERATION, false)]
        );
    }

    /// Sensors that take a while and note when each read finished.
    struct SlowPlatform {
        stamps: Arc<Mutex<Vec<f64>>>,
    }

    struct SlowSensor {
        stamps: Arc<Mutex<Vec<f64>>>,
    }

    impl SlowSensor {
        fn stamp(&self) {
            std::thread::sleep(Duration::from_millis(20));
            self.stamps.lock().unwrap().push(unix_timestamp());
        }
    }

    impl LightSensor for SlowSensor {
        fn lux(&self) -> Result<Option<f64>, SensorError> {
            self.stamp();
            Ok(Some(500.0))
        }
    }

    impl TemperatureSensor for SlowSensor {
        fn celsius(&self) -> Result<Option<f64>, SensorError> {
            self.stamp();
            Ok(Some(20.0))
        }
    }

    impl Accelerometer for SlowSensor {
        fn acceleration(&self) -> Result<Option<[f64; 3]>, SensorError> {
            self.stamp();
            Ok(Some([0.0, 0.0, 9.81]))
        }
    }

    impl SensorPlatform for SlowPlatform {
        fn open_bus(&mut self) -> Result<(), SensorError> {
            Ok(())
        }

        fn open_light(&mut self) -> Result<Box<dyn LightSensor>, SensorError> {
            Ok(Box::new(SlowSensor {
                stamps: Arc::clone(&self.stamps),
            }))
        }

        fn open_temperature(&mut self) -> Result<Box<dyn TemperatureSensor>, SensorError> {
            Ok(Box::new(SlowSensor {
                stamps: Arc::clone(&self.stamps),
            }))
        }

        fn open_accelerometer(&mut self) -> Result<Box<dyn Accelerometer>, SensorError> {
            Ok(Box::new(SlowSensor {
                stamps: Arc::clone(&self.stamps),
            }))
        }
    }

    #[test]
    fn test_timestamp_captured_before_reads() {
        let stamps = Arc::new(Mutex::new(Vec::new()));
        let node = SensorNode::probe(&mut SlowPlatform {
            stamps: Arc::clone(&stamps),
        });

        let readings = node.read_all();
        let stamps = stamps.lock().unwrap();
        assert_eq!(stamps.len(), 3);
        for &stamp in stamps.iter() {
            assert!(readings.timestamp <= stamp);
        }
        // One shared timestamp, taken before the first read started.
        assert!(stamps[2] - readings.timestamp >= 0.05);
    }

    #[test]
    fn test_null_and_non_finite_values_are_absent() {
        let mut platform = FakePlatform::healthy();
        platform.temperature = Some(None);
        platform.light = Some(f64::NAN);
        let node = SensorNode::probe(&mut platform);

        assert!(matches!(
            node.read_temperature(),
            Err(ReadFailure::NoValue(TEMPERATURE))
        ));
        assert!(matches!(
            node.read_light(),
            Err(ReadFailure::NonFinite(LIGHT))
        ));
    }
}
