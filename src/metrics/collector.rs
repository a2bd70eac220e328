//! Metrics collection and registry.

use crate::quantum::BackendInfo;
use crate::sensors::{Reading, SensorHealth};
use prometheus::{
    Encoder, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder,
};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Prometheus metrics registry for both services.
pub struct MetricsRegistry {
    registry: Registry,

    // Sensor metrics
    sensor_reads: IntCounterVec,
    sensor_read_failures: IntCounterVec,
    sensor_available: IntGaugeVec,

    // Entropy metrics
    entropy_requests: IntCounter,
    entropy_failures: IntCounter,
    entropy_bits: IntCounter,
    real_hardware: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new registry with all metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let sensor_reads = IntCounterVec::new(
            Opts::new("chimera_sensor_reads_total", "Sensor reads attempted"),
            &["capability"],
        )?;
        let sensor_read_failures = IntCounterVec::new(
            Opts::new(
                "chimera_sensor_read_failures_total",
                "Sensor reads that produced no value",
            ),
            &["capability"],
        )?;
        let sensor_available = IntGaugeVec::new(
            Opts::new(
                "chimera_sensor_available",
                "Probe-time availability (1=available, 0=unavailable)",
            ),
            &["capability"],
        )?;

        let entropy_requests = IntCounter::new(
            "chimera_entropy_requests_total",
            "Entropy generation requests",
        )?;
        let entropy_failures = IntCounter::new(
            "chimera_entropy_failures_total",
            "Entropy generation requests that failed",
        )?;
        let entropy_bits = IntCounter::new(
            "chimera_entropy_bits_total",
            "Total entropy bits generated",
        )?;
        let real_hardware = IntGauge::new(
            "chimera_quantum_real_hardware",
            "Whether entropy is served by real quantum hardware (1=yes, 0=no)",
        )?;

        registry.register(Box::new(sensor_reads.clone()))?;
        registry.register(Box::new(sensor_read_failures.clone()))?;
        registry.register(Box::new(sensor_available.clone()))?;
        registry.register(Box::new(entropy_requests.clone()))?;
        registry.register(Box::new(entropy_failures.clone()))?;
        registry.register(Box::new(entropy_bits.clone()))?;
        registry.register(Box::new(real_hardware.clone()))?;

        Ok(Self {
            registry,
            sensor_reads,
            sensor_read_failures,
            sensor_available,
            entropy_requests,
            entropy_failures,
            entropy_bits,
            real_hardware,
        })
    }

    /// Publishes probe-time sensor availability.
    pub fn set_sensor_health(&self, health: &SensorHealth) {
        for (name, available) in health.entries() {
            self.sensor_available
                .with_label_values(&[name])
                .set(i64::from(available));
        }
    }

    /// Counts one read of `capability`.
    pub fn record_read(&self, capability: &str, reading: &Reading) {
        self.sensor_reads.with_label_values(&[capability]).inc();
        if reading.is_err() {
            self.sensor_read_failures
                .with_label_values(&[capability])
                .inc();
        }
    }

    /// Publishes the selected quantum backend.
    pub fn set_backend(&self, info: &BackendInfo) {
        self.real_hardware.set(i64::from(info.is_real_hardware));
    }

    /// Counts one entropy request and its outcome.
    pub fn record_entropy(&self, bits: usize, succeeded: bool) {
        self.entropy_requests.inc();
        if succeeded {
            self.entropy_bits.inc_by(bits as u64);
        } else {
            self.entropy_failures.inc();
        }
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::ReadFailure;

    #[test]
    fn test_registry_creation() {
        assert!(MetricsRegistry::new().is_ok());
    }

    #[test]
    fn test_sensor_metrics() {
        let registry = MetricsRegistry::new().unwrap();
        registry.set_sensor_health(&SensorHealth {
            light: true,
            temperature: false,
            acceleration: true,
            i2c: true,
        });
        registry.record_read("light", &Ok(0.5));
        registry.record_read("temperature", &Err(ReadFailure::Unavailable("temperature")));

        let output = registry.encode().unwrap();
        assert!(output.contains(r#"chimera_sensor_available{capability="temperature"} 0"#));
        assert!(output.contains(r#"chimera_sensor_available{capability="i2c"} 1"#));
        assert!(output.contains(r#"chimera_sensor_reads_total{capability="light"} 1"#));
        assert!(output.contains(r#"chimera_sensor_read_failures_total{capability="temperature"} 1"#));
    }

    #[test]
    fn test_entropy_metrics() {
        let registry = MetricsRegistry::new().unwrap();
        registry.set_backend(&BackendInfo::hardware("ibm_quiet"));
        registry.record_entropy(256, true);
        registry.record_entropy(128, false);

        let output = registry.encode().unwrap();
        assert!(output.contains("chimera_entropy_requests_total 2"));
        assert!(output.contains("chimera_entropy_failures_total 1"));
        assert!(output.contains("chimera_entropy_bits_total 256"));
        assert!(output.contains("chimera_quantum_real_hardware 1"));
    }
}
