//! The entropy circuit: Hadamard on every qubit, then measure all.

use std::fmt::Write as _;

/// A uniform-superposition measurement circuit.
///
/// Each qubit starts in |0⟩, passes through H, and is measured into the
/// classical bit of the same index, giving an independent fair coin per
/// qubit per shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Circuit {
    num_qubits: usize,
}

impl Circuit {
    /// Creates a circuit over `num_qubits` qubits.
    pub fn uniform_superposition(num_qubits: usize) -> Self {
        Self { num_qubits }
    }

    /// Number of qubits (and classical bits).
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Renders the circuit as OpenQASM 2.0 for remote execution.
    pub fn to_qasm(&self) -> String {
        let n = self.num_qubits;
        let mut qasm = String::from("OPENQASM 2.0;\ninclude \"qelib1.inc\";\n");
        let _ = writeln!(qasm, "qreg q[{n}];");
        let _ = writeln!(qasm, "creg c[{n}];");
        for i in 0..n {
            let _ = writeln!(qasm, "h q[{i}];");
        }
        qasm.push_str("measure q -> c;\n");
        qasm
    }
}
