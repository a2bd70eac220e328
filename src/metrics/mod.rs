//! Prometheus metrics for the sensor and entropy services.
//!
//! # Metrics Exposed
//!
//! ## Sensor Metrics
//! - `chimera_sensor_reads_total{capability}` - Reads attempted
//! - `chimera_sensor_read_failures_total{capability}` - Reads that yielded no value
//! - `chimera_sensor_available{capability}` - Probe-time availability, including `i2c`
//!
//! ## Entropy Metrics
//! - `chimera_entropy_requests_total` - Entropy requests
//! - `chimera_entropy_failures_total` - Failed entropy requests
//! - `chimera_entropy_bits_total` - Bits generated
//! - `chimera_quantum_real_hardware` - 1 when served by real hardware

mod collector;

pub use collector::{MetricsError, MetricsRegistry};
