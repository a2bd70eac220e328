//! Blocking HTTP client abstraction for the IBM Quantum Runtime API.
//!
//! [`IbmClient`] hides the transport so backend selection and result
//! handling can be tested with an in-memory client.

use crate::quantum::BackendError;
use serde::Serialize;
use std::collections::BTreeMap;

/// A remote backend as advertised by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCandidate {
    /// Device name.
    pub name: String,
    /// Qubits on the device.
    pub n_qubits: u32,
    /// Whether the device is a simulator.
    pub simulator: bool,
    /// Whether the device accepts jobs.
    pub operational: bool,
    /// Jobs queued ahead of a new submission.
    pub pending_jobs: u32,
}

/// Sampler job submission.
#[derive(Debug, Serialize)]
pub struct IbmJobRequest {
    /// Runtime program to run.
    pub program_id: String,
    /// Target device name.
    pub backend: String,
    /// Program parameters.
    pub params: IbmJobParams,
}

/// Sampler job parameters.
#[derive(Debug, Serialize)]
pub struct IbmJobParams {
    /// OpenQASM circuits.
    pub circuits: Vec<String>,
    /// Shots per circuit.
    pub shots: u32,
}

/// Lifecycle state of a submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Waiting in the device queue.
    Queued,
    /// Executing.
    Running,
    /// Finished with results.
    Completed,
    /// Failed or cancelled, with the provider's reason.
    Failed(String),
}

impl JobState {
    /// Maps the provider's status string.
    pub fn parse(status: &str, reason: Option<String>) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "queued" | "validating" => JobState::Queued,
            "running" => JobState::Running,
            "completed" | "done" => JobState::Completed,
            other => JobState::Failed(reason.unwrap_or_else(|| other.to_string())),
        }
    }
}

/// Transport operations used by [`super::IbmBackend`].
pub trait IbmClient: Send + Sync {
    /// Lists every backend visible to the credential.
    fn list_backends(&self) -> Result<Vec<BackendCandidate>, BackendError>;

    /// Submits a job and returns its id.
    fn submit_job(&self, request: &IbmJobRequest) -> Result<String, BackendError>;

    /// Polls the job state.
    fn job_state(&self, job_id: &str) -> Result<JobState, BackendError>;

    /// Fetches measurement counts of a completed job.
    fn job_counts(&self, job_id: &str) -> Result<BTreeMap<String, u64>, BackendError>;
}

/// Response payloads of the Runtime REST API.
mod wire {
    #![cfg_attr(not(feature = "ibm"), allow(dead_code))]

    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Deserialize)]
    pub(super) struct DevicesResponse {
        pub devices: Vec<String>,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct ConfigurationResponse {
        pub n_qubits: u32,
        #[serde(default)]
        pub simulator: bool,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct StatusResponse {
        pub state: bool,
        #[serde(default)]
        pub length_queue: u32,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct JobResponse {
        pub id: String,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct JobStateResponse {
        pub status: String,
        #[serde(default)]
        pub reason: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct JobResultsResponse {
        pub results: Vec<CircuitResult>,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct CircuitResult {
        pub counts: BTreeMap<String, u64>,
    }
}

#[cfg(feature = "ibm")]
use wire::*;

/// Production client using `reqwest`'s blocking API.
#[cfg(feature = "ibm")]
pub struct ReqwestIbmClient {
    client: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

#[cfg(feature = "ibm")]
impl ReqwestIbmClient {
    /// Creates a client for the given API root.
    pub fn new(base_url: &str, token: &str) -> Result<Self, BackendError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| BackendError::Http(format!("failed to create client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| BackendError::Http(format!("GET {path} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(BackendError::Connection(format!(
                "GET {path} returned {}",
                response.status()
            )));
        }

        response
            .json()
            .map_err(|e| BackendError::Http(format!("failed to parse {path}: {e}")))
    }
}

#[cfg(feature = "ibm")]
impl IbmClient for ReqwestIbmClient {
    fn list_backends(&self) -> Result<Vec<BackendCandidate>, BackendError> {
        let devices: DevicesResponse = self.get("/backends")?;
        let mut candidates = Vec::with_capacity(devices.devices.len());
        for name in devices.devices {
            let config: ConfigurationResponse =
                self.get(&format!("/backends/{name}/configuration"))?;
            let status: StatusResponse = self.get(&format!("/backends/{name}/status"))?;
            candidates.push(BackendCandidate {
                name,
                n_qubits: config.n_qubits,
                simulator: config.simulator,
                operational: status.state,
                pending_jobs: status.length_queue,
            });
        }
        Ok(candidates)
    }

    fn submit_job(&self, request: &IbmJobRequest) -> Result<String, BackendError> {
        let url = format!("{}/jobs", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .map_err(|e| BackendError::Http(format!("job submission failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(BackendError::Execution(format!(
                "IBM API returned {status}: {body}"
            )));
        }

        let job: JobResponse = response
            .json()
            .map_err(|e| BackendError::Execution(format!("failed to parse job response: {e}")))?;
        Ok(job.id)
    }

    fn job_state(&self, job_id: &str) -> Result<JobState, BackendError> {
        let state: JobStateResponse = self.get(&format!("/jobs/{job_id}"))?;
        Ok(JobState::parse(&state.status, state.reason))
    }

    fn job_counts(&self, job_id: &str) -> Result<BTreeMap<String, u64>, BackendError> {
        let results: JobResultsResponse = self.get(&format!("/jobs/{job_id}/results"))?;
        results
            .results
            .into_iter()
            .next()
            .map(|r| r.counts)
            .ok_or_else(|| BackendError::Execution(format!("job {job_id} returned no results")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_state_parsing() {
        assert_eq!(JobState::parse("Queued", None), JobState::Queued);
        assert_eq!(JobState::parse("RUNNING", None), JobState::Running);
        assert_eq!(JobState::parse("Completed", None), JobState::Completed);
        assert_eq!(
            JobState::parse("Failed", Some("calibration".into())),
            JobState::Failed("calibration".into())
        );
        assert_eq!(
            JobState::parse("Cancelled", None),
            JobState::Failed("cancelled".into())
        );
    }

    #[test]
    fn test_results_payload_shape() {
        let json = r#"{"results":[{"counts":{"00101":3,"11000":1}}]}"#;
        let parsed: wire::JobResultsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.results[0].counts["00101"], 3);
    }

    #[test]
    fn test_job_request_serialization() {
        let request = IbmJobRequest {
            program_id: "sampler".into(),
            backend: "ibm_brisbane".into(),
            params: IbmJobParams {
                circuits: vec!["OPENQASM 2.0;".into()],
                shots: 52,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["params"]["shots"], 52);
        assert_eq!(json["backend"], "ibm_brisbane");
    }
}
