//! Entropy sources: circuit-backed and cryptographic mock.

use super::backend::{BackendError, BackendInfo, QuantumBackend};
use super::extract::{self, EntropyBatch, MAX_BITS, MIN_BITS};
use super::Circuit;
use rand_core::{OsRng, RngCore};
use thiserror::Error;

/// Errors surfaced to entropy callers.
#[derive(Debug, Error)]
pub enum EntropyError {
    /// Requested bit count outside the accepted range.
    #[error("bits must be between {min} and {max}, got {requested}", min = MIN_BITS, max = MAX_BITS)]
    InvalidBitCount {
        /// The rejected bit count.
        requested: usize,
    },
    /// The backend failed while generating.
    #[error("failed to generate entropy: {0}")]
    Backend(#[from] BackendError),
}

/// Rejects bit counts outside `MIN_BITS..=MAX_BITS`.
pub fn validate_bits(bits: usize) -> Result<(), EntropyError> {
    if (MIN_BITS..=MAX_BITS).contains(&bits) {
        Ok(())
    } else {
        Err(EntropyError::InvalidBitCount { requested: bits })
    }
}

/// A source of hashed random bits.
pub trait EntropySource: Send + Sync {
    /// Produces `ceil(bits / 8)` bytes of raw entropy.
    fn generate_entropy(&self, bits: usize) -> Result<Vec<u8>, EntropyError>;

    /// Describes the backend serving requests.
    fn backend_info(&self) -> BackendInfo;

    /// SHA-256 hex digest of freshly generated entropy.
    fn generate_entropy_hash(&self, bits: usize) -> Result<String, EntropyError> {
        let entropy = self.generate_entropy(bits)?;
        Ok(extract::digest_hex(&entropy))
    }
}

/// Entropy from measuring qubits in equal superposition.
pub struct QuantumEntropySource {
    backend: Box<dyn QuantumBackend>,
    info: BackendInfo,
}

impl QuantumEntropySource {
    /// Wraps an already selected backend.
    pub fn new(backend: Box<dyn QuantumBackend>) -> Self {
        let info = backend.info();
        Self { backend, info }
    }

    /// Runs one circuit execution and flattens it into exactly `bits` bits.
    pub fn measure(&self, bits: usize) -> Result<EntropyBatch, EntropyError> {
        validate_bits(bits)?;

        let circuit = Circuit::uniform_superposition(extract::qubit_width(bits));
        let shots = extract::shot_count(bits);
        tracing::debug!(
            backend = self.info.name.as_str(),
            bits,
            qubits = circuit.num_qubits(),
            shots,
            "Executing entropy circuit"
        );

        let histogram = self.backend.run(&circuit, shots)?;
        let batch = EntropyBatch::from_histogram(&histogram, bits)?;
        tracing::trace!(bit_bias = batch.bit_bias(), "Flattened measurement histogram");
        Ok(batch)
    }
}

impl EntropySource for QuantumEntropySource {
    fn generate_entropy(&self, bits: usize) -> Result<Vec<u8>, EntropyError> {
        Ok(self.measure(bits)?.to_bytes())
    }

    fn backend_info(&self) -> BackendInfo {
        self.info.clone()
    }
}

impl std::fmt::Debug for QuantumEntropySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuantumEntropySource")
            .field("backend", &self.info)
            .finish_non_exhaustive()
    }
}

/// Name reported by the mock source.
pub const MOCK_BACKEND_NAME: &str = "mock_quantum_simulator";

/// Skips circuits entirely and draws bytes from the OS CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockEntropySource;

impl MockEntropySource {
    /// Creates the mock source.
    pub fn new() -> Self {
        Self
    }
}

impl EntropySource for MockEntropySource {
    fn generate_entropy(&self, bits: usize) -> Result<Vec<u8>, EntropyError> {
        validate_bits(bits)?;
        let mut bytes = vec![0u8; bits.div_ceil(8)];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| BackendError::Execution(format!("OS RNG failure: {e}")))?;
        Ok(bytes)
    }

    fn backend_info(&self) -> BackendInfo {
        BackendInfo::simulator(MOCK_BACKEND_NAME)
    }
}
