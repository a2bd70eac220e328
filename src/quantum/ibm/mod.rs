//! IBM Quantum hardware backend.
//!
//! The backend is generic over [`IbmClient`], so selection and job
//! handling run against an in-memory client in tests and against
//! [`ReqwestIbmClient`] (feature `ibm`) in production.

pub mod client;

use std::time::{Duration, Instant};

use super::backend::{BackendError, BackendKind, QuantumBackend};
use super::{Circuit, Histogram};
use client::{BackendCandidate, IbmClient, IbmJobParams, IbmJobRequest, JobState};

#[cfg(feature = "ibm")]
pub use client::ReqwestIbmClient;

const SAMPLER_PROGRAM: &str = "sampler";

/// Picks the least busy operational hardware backend with enough qubits.
pub fn select_least_busy(
    candidates: &[BackendCandidate],
    min_qubits: u32,
) -> Option<&BackendCandidate> {
    candidates
        .iter()
        .filter(|c| c.n_qubits >= min_qubits && !c.simulator && c.operational)
        .min_by_key(|c| c.pending_jobs)
}

/// A selected IBM Quantum device.
pub struct IbmBackend<C> {
    client: C,
    name: String,
    poll_interval: Duration,
    timeout: Duration,
}

impl<C: IbmClient> IbmBackend<C> {
    /// Lists devices and binds to the least busy qualifying one.
    pub fn connect(client: C, min_qubits: u32) -> Result<Self, BackendError> {
        let candidates = client.list_backends()?;
        let selected = select_least_busy(&candidates, min_qubits)
            .ok_or(BackendError::NoQualifyingBackend { min_qubits })?;

        tracing::info!(
            backend = selected.name.as_str(),
            qubits = selected.n_qubits,
            pending_jobs = selected.pending_jobs,
            "Selected IBM Quantum backend"
        );

        Ok(Self {
            name: selected.name.clone(),
            client,
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(600),
        })
    }

    /// Overrides job polling cadence and the overall wait limit.
    pub fn with_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = interval;
        self.timeout = timeout;
        self
    }

    fn wait_for_completion(&self, job_id: &str) -> Result<(), BackendError> {
        let started = Instant::now();
        loop {
            match self.client.job_state(job_id)? {
                JobState::Completed => return Ok(()),
                JobState::Failed(reason) => {
                    return Err(BackendError::Execution(format!("job {job_id} failed: {reason}")))
                }
                JobState::Queued | JobState::Running => {}
            }
            if started.elapsed() >= self.timeout {
                return Err(BackendError::Execution(format!(
                    "job {job_id} did not finish within {:?}",
                    self.timeout
                )));
            }
            std::thread::sleep(self.poll_interval);
        }
    }
}

impl<C: IbmClient> QuantumBackend for IbmBackend<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Hardware
    }

    fn run(&self, circuit: &Circuit, shots: u32) -> Result<Histogram, BackendError> {
        let request = IbmJobRequest {
            program_id: SAMPLER_PROGRAM.to_string(),
            backend: self.name.clone(),
            params: IbmJobParams {
                circuits: vec![circuit.to_qasm()],
                shots,
            },
        };

        let job_id = self.client.submit_job(&request)?;
        tracing::debug!(job_id = job_id.as_str(), shots, "Submitted IBM Quantum job");

        self.wait_for_completion(&job_id)?;
        let counts = self.client.job_counts(&job_id)?;
        Ok(Histogram::from_counts(counts))
    }
}
