//! Chimera Nodes Library
//!
//! Two small hardware-facing services that keep working when their
//! hardware does not:
//!
//! - a **biosensor node** reading light, temperature and acceleration
//!   and normalizing each to `[0, 1]`;
//! - a **quantum entropy node** measuring qubits in superposition and
//!   returning a SHA-256 digest of the measured bits.
//!
//! # Architecture
//!
//! ```text
//! probe (once) → capabilities → read / generate → normalize / extract
//!                      ↓
//!               health reporting
//! ```
//!
//! Each capability is probed independently at startup. A failed probe
//! is recorded, never fatal: sensors report absent values and the
//! entropy node falls back to a local simulator.
//!
//! # Example
//!
//! ```no_run
//! use chimera_nodes::{
//!     quantum::{EntropySource, LocalSimulator, QuantumEntropySource},
//!     sensors::{SensorNode, SimulatedPlatform},
//! };
//!
//! let node = SensorNode::probe(&mut SimulatedPlatform::new());
//! let readings = node.read_all();
//! println!("light = {:?}", readings.light);
//!
//! let source = QuantumEntropySource::new(Box::new(LocalSimulator::new()));
//! let digest = source.generate_entropy_hash(256).unwrap();
//! assert_eq!(digest.len(), 64);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capability;
pub mod config;
pub mod metrics;
pub mod quantum;
pub mod sensors;
#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types at crate root
pub use capability::Capability;
pub use config::{ConfigError, ServiceConfig};
pub use metrics::MetricsRegistry;
pub use quantum::{BackendInfo, EntropyError, EntropySource};
pub use sensors::{SensorHealth, SensorNode, SensorReadings};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
