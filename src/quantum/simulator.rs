//! Local state-vector-free simulator for the entropy circuit.
//!
//! The circuit only ever places independent qubits in equal
//! superposition, so each measured qubit is a fair coin and the shot
//! outcome can be sampled directly.

use super::backend::{BackendError, BackendKind, QuantumBackend};
use super::{Circuit, Histogram};
use rand_core::{OsRng, RngCore};
use std::sync::Mutex;

/// Name reported for the local simulator.
pub const SIMULATOR_NAME: &str = "qasm_simulator";

/// Samples measurement outcomes from a random source.
pub struct LocalSimulator<R = OsRng> {
    rng: Mutex<R>,
}

impl LocalSimulator<OsRng> {
    /// Creates a simulator drawing from the operating system RNG.
    pub fn new() -> Self {
        Self::with_rng(OsRng)
    }
}

impl Default for LocalSimulator<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore + Send> LocalSimulator<R> {
    /// Creates a simulator over a caller-supplied RNG (seeded in tests).
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl<R: RngCore + Send> QuantumBackend for LocalSimulator<R> {
    fn name(&self) -> &str {
        SIMULATOR_NAME
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Simulator
    }

    fn run(&self, circuit: &Circuit, shots: u32) -> Result<Histogram, BackendError> {
        let width = circuit.num_qubits();
        if width == 0 || width > 32 {
            return Err(BackendError::Execution(format!(
                "simulator supports 1-32 qubits, got {width}"
            )));
        }

        let mut rng = self
            .rng
            .lock()
            .map_err(|_| BackendError::Execution("simulator RNG poisoned".into()))?;

        let mut histogram = Histogram::new();
        let mut outcome = String::with_capacity(width);
        for _ in 0..shots {
            let sample = rng.next_u32();
            outcome.clear();
            // Classical bit 0 is the rightmost character.
            for bit in (0..width).rev() {
                outcome.push(if (sample >> bit) & 1 == 1 { '1' } else { '0' });
            }
            histogram.record(&outcome);
        }

        tracing::trace!(
            qubits = width,
            shots,
            outcomes = histogram.len(),
            "Simulated circuit"
        );
        Ok(histogram)
    }
}
