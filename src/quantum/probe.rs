//! Startup backend selection with simulator fallback.

use super::backend::{BackendError, QuantumBackend};
use super::simulator::LocalSimulator;
use super::source::{EntropySource, MockEntropySource, QuantumEntropySource};
use crate::config::QuantumConfig;

/// Selects the backend once for the lifetime of the process.
///
/// Hardware is attempted only when requested and a credential is
/// present. Any connection or selection failure falls back to the
/// local simulator; the hardware flag is not retried later.
pub fn probe_with<F>(use_hardware: bool, api_token: Option<&str>, connect: F) -> QuantumEntropySource
where
    F: FnOnce(&str) -> Result<Box<dyn QuantumBackend>, BackendError>,
{
    let token = match (use_hardware, api_token) {
        (true, Some(token)) if !token.is_empty() => token,
        (true, _) => {
            tracing::warn!("Quantum hardware requested without an API token; using simulator");
            return simulator();
        }
        (false, _) => return simulator(),
    };

    match connect(token) {
        Ok(backend) => {
            tracing::info!(backend = backend.name(), "Using real quantum hardware");
            QuantumEntropySource::new(backend)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to connect to quantum hardware; falling back to simulator");
            simulator()
        }
    }
}

/// Probes using the configured provider.
pub fn probe(config: &QuantumConfig) -> QuantumEntropySource {
    probe_with(config.use_hardware, config.api_token.as_deref(), |token| {
        connect_hardware(config, token)
    })
}

/// Builds the configured entropy source, mock or circuit-backed.
pub fn build_source(config: &QuantumConfig) -> Box<dyn EntropySource> {
    if config.mock {
        tracing::info!("Using cryptographic mock entropy source");
        Box::new(MockEntropySource::new())
    } else {
        Box::new(probe(config))
    }
}

fn simulator() -> QuantumEntropySource {
    let sim = LocalSimulator::new();
    tracing::info!(backend = sim.name(), "Using quantum simulator");
    QuantumEntropySource::new(Box::new(sim))
}

#[cfg(feature = "ibm")]
fn connect_hardware(
    config: &QuantumConfig,
    token: &str,
) -> Result<Box<dyn QuantumBackend>, BackendError> {
    let client = super::ibm::ReqwestIbmClient::new(&config.api_url, token)?;
    let backend = super::ibm::IbmBackend::connect(client, config.min_qubits)?;
    Ok(Box::new(backend))
}

#[cfg(not(feature = "ibm"))]
fn connect_hardware(
    _config: &QuantumConfig,
    _token: &str,
) -> Result<Box<dyn QuantumBackend>, BackendError> {
    Err(BackendError::Connection(
        "built without IBM Quantum support (enable the `ibm` feature)".into(),
    ))
}
