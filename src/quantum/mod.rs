//! Quantum entropy generation.
//!
//! Entropy comes from measuring qubits placed in equal superposition.
//! One circuit execution yields a histogram of measured bitstrings,
//! which is flattened into exactly the requested number of bits,
//! packed MSB-first and digested with SHA-256.
//!
//! ```text
//! probe (hardware → simulator fallback)
//!     ↓
//! circuit → backend.run → histogram → EntropyBatch → bytes → digest
//! ```

mod backend;
mod circuit;
pub mod extract;
mod histogram;
pub mod ibm;
mod probe;
mod simulator;
mod source;

pub use backend::{BackendError, BackendInfo, BackendKind, QuantumBackend};
pub use circuit::Circuit;
pub use extract::{EntropyBatch, MAX_BITS, MIN_BITS};
pub use histogram::Histogram;
pub use probe::{build_source, probe, probe_with};
pub use simulator::{LocalSimulator, SIMULATOR_NAME};
pub use source::{
    validate_bits, EntropyError, EntropySource, MockEntropySource, QuantumEntropySource,
    MOCK_BACKEND_NAME,
};
