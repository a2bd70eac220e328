//! Quantum execution backend abstraction.

use super::{Circuit, Histogram};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while selecting or running a backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Provider could not be reached or rejected the credential.
    #[error("backend connection failed: {0}")]
    Connection(String),
    /// No operational hardware device met the qubit requirement.
    #[error("no operational hardware backend with at least {min_qubits} qubits")]
    NoQualifyingBackend {
        /// Smallest acceptable device.
        min_qubits: u32,
    },
    /// The circuit run failed.
    #[error("circuit execution failed: {0}")]
    Execution(String),
    /// A measured bitstring was empty or not binary.
    #[error("malformed measurement outcome {0:?}")]
    MalformedOutcome(String),
    /// The histogram carried fewer bits than requested.
    #[error("backend returned {got} bits, need {need}")]
    InsufficientShots {
        /// Bits carried by the histogram.
        got: u64,
        /// Bits requested.
        need: usize,
    },
    /// Transport-level HTTP failure.
    #[error("http error: {0}")]
    Http(String),
}

/// Whether a backend is a simulator or physical hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BackendKind {
    /// Local or remote simulator.
    #[serde(rename = "simulator")]
    Simulator,
    /// Physical quantum device.
    #[serde(rename = "quantum")]
    Hardware,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Simulator => write!(f, "simulator"),
            BackendKind::Hardware => write!(f, "quantum"),
        }
    }
}

/// Descriptor of the backend serving entropy requests.
///
/// Selected once at probe time and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendInfo {
    /// Backend name as reported by the provider.
    pub name: String,
    /// Simulator or hardware.
    #[serde(rename = "type")]
    pub kind: BackendKind,
    /// True only for physical devices.
    #[serde(rename = "real_hardware")]
    pub is_real_hardware: bool,
}

impl BackendInfo {
    /// Describes a simulator backend.
    pub fn simulator(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: BackendKind::Simulator,
            is_real_hardware: false,
        }
    }

    /// Describes a physical hardware backend.
    pub fn hardware(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: BackendKind::Hardware,
            is_real_hardware: true,
        }
    }
}

/// A backend able to execute measurement circuits.
///
/// Execution is synchronous and blocking; callers on an async runtime
/// must move it onto a blocking thread.
pub trait QuantumBackend: Send + Sync {
    /// Backend name.
    fn name(&self) -> &str;

    /// Backend kind.
    fn kind(&self) -> BackendKind;

    /// Runs the circuit for `shots` shots and returns the outcome counts.
    fn run(&self, circuit: &Circuit, shots: u32) -> Result<Histogram, BackendError>;

    /// Describes this backend.
    fn info(&self) -> BackendInfo {
        match self.kind() {
            BackendKind::Simulator => BackendInfo::simulator(self.name()),
            BackendKind::Hardware => BackendInfo::hardware(self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_info_wire_format() {
        let json = serde_json::to_value(BackendInfo::simulator("qasm_simulator")).unwrap();
        assert_eq!(json["name"], "qasm_simulator");
        assert_eq!(json["type"], "simulator");
        assert_eq!(json["real_hardware"], false);

        let json = serde_json::to_value(BackendInfo::hardware("ibm_brisbane")).unwrap();
        assert_eq!(json["type"], "quantum");
        assert_eq!(json["real_hardware"], true);
    }
}
