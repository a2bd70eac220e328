//! Quantum entropy HTTP service.
//!
//! - `GET /api/quantum/entropy?bits=N` - SHA-256 digest of `N` fresh bits (rate limited)
//! - `GET /api/quantum/health` - Selected backend
//! - `GET /api/quantum/info` - Service capabilities
//! - `GET /metrics` - Prometheus metrics

use super::{api_error, finish, metrics_response, rate_limited, ApiError, RateLimiter};
use crate::metrics::MetricsRegistry;
use crate::quantum::{BackendInfo, BackendKind, EntropyError, EntropySource, MAX_BITS, MIN_BITS};
use crate::sensors::unix_timestamp;
use axum::{
    extract::{ConnectInfo, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

/// Bits generated when the request names none.
pub const DEFAULT_BITS: usize = 256;

/// Shared state of the quantum entropy service.
pub struct QuantumState {
    source: Box<dyn EntropySource>,
    backend: BackendInfo,
    limiter: RateLimiter,
    metrics: Arc<MetricsRegistry>,
}

impl QuantumState {
    /// Wraps a probed entropy source; publishes its backend to `metrics`.
    pub fn new(
        source: Box<dyn EntropySource>,
        limiter: RateLimiter,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        let backend = source.backend_info();
        metrics.set_backend(&backend);
        Self {
            source,
            backend,
            limiter,
            metrics,
        }
    }
}

#[derive(Debug, Serialize)]
struct EntropyResponse {
    entropy: String,
    bits: usize,
    backend: String,
    backend_type: BackendKind,
    real_hardware: bool,
    timestamp: f64,
    generation_time: f64,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    backend: String,
    backend_type: BackendKind,
    real_hardware: bool,
    timestamp: f64,
}

#[derive(Debug, Serialize)]
struct Capabilities {
    max_bits: usize,
    min_bits: usize,
    rate_limit: String,
}

#[derive(Debug, Serialize)]
struct InfoResponse {
    service: &'static str,
    version: &'static str,
    backend: BackendInfo,
    capabilities: Capabilities,
    endpoints: BTreeMap<&'static str, &'static str>,
}

/// Builds the quantum entropy router.
pub fn router(state: Arc<QuantumState>) -> Router {
    let app = Router::new()
        .route("/api/quantum/entropy", get(entropy))
        .route("/api/quantum/health", get(health))
        .route("/api/quantum/info", get(info))
        .route("/metrics", get(metrics))
        .with_state(state);

    finish(app)
}

/// Parses the `bits` query value, defaulting when absent.
fn requested_bits(params: &HashMap<String, String>) -> Result<usize, ApiError> {
    let Some(raw) = params.get("bits") else {
        return Ok(DEFAULT_BITS);
    };
    let bits: i64 = raw.trim().parse().map_err(|_| {
        api_error(
            StatusCode::BAD_REQUEST,
            "Invalid parameter",
            format!("invalid literal for bits: {:?}", raw),
        )
    })?;
    if bits < MIN_BITS as i64 || bits > MAX_BITS as i64 {
        return Err(invalid_bits());
    }
    Ok(bits as usize)
}

fn invalid_bits() -> ApiError {
    api_error(
        StatusCode::BAD_REQUEST,
        "Invalid bits parameter",
        format!("bits must be between {} and {}", MIN_BITS, MAX_BITS),
    )
}

async fn entropy(
    State(state): State<Arc<QuantumState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<EntropyResponse>, ApiError> {
    let client = peer
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    if !state.limiter.check(client, Instant::now()) {
        tracing::debug!(client = %client, "Rate limit exceeded");
        return Err(rate_limited());
    }

    let bits = requested_bits(&params)?;

    let worker = Arc::clone(&state);
    let outcome = tokio::task::spawn_blocking(move || {
        let started = Instant::now();
        let digest = worker.source.generate_entropy_hash(bits);
        (digest, started.elapsed())
    })
    .await;

    let (digest, elapsed) = match outcome {
        Ok(done) => done,
        Err(e) => {
            tracing::error!(error = %e, "Entropy task failed");
            state.metrics.record_entropy(bits, false);
            return Err(generation_failed());
        }
    };

    match digest {
        Ok(entropy) => {
            state.metrics.record_entropy(bits, true);
            Ok(Json(EntropyResponse {
                entropy,
                bits,
                backend: state.backend.name.clone(),
                backend_type: state.backend.kind,
                real_hardware: state.backend.is_real_hardware,
                timestamp: unix_timestamp(),
                generation_time: elapsed.as_secs_f64(),
            }))
        }
        Err(EntropyError::InvalidBitCount { .. }) => Err(invalid_bits()),
        Err(e) => {
            tracing::error!(error = %e, bits, "Error generating entropy");
            state.metrics.record_entropy(bits, false);
            Err(generation_failed())
        }
    }
}

fn generation_failed() -> ApiError {
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error",
        "Failed to generate quantum entropy",
    )
}

async fn health(State(state): State<Arc<QuantumState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "quantum-entropy",
        backend: state.backend.name.clone(),
        backend_type: state.backend.kind,
        real_hardware: state.backend.is_real_hardware,
        timestamp: unix_timestamp(),
    })
}

async fn info(State(state): State<Arc<QuantumState>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        service: "Chimera Quantum Entropy Service",
        version: crate::VERSION,
        backend: state.backend.clone(),
        capabilities: Capabilities {
            max_bits: MAX_BITS,
            min_bits: MIN_BITS,
            rate_limit: format!("{} requests per minute", state.limiter.limit()),
        },
        endpoints: BTreeMap::from([
            ("/api/quantum/entropy", "Generate quantum entropy"),
            ("/api/quantum/health", "Health check"),
            ("/api/quantum/info", "Service information"),
            ("/metrics", "Prometheus metrics"),
        ]),
    })
}

async fn metrics(State(state): State<Arc<QuantumState>>) -> Response {
    metrics_response(&state.metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantum::{
        BackendError, Circuit, Histogram, LocalSimulator, MockEntropySource, QuantumBackend,
        QuantumEntropySource,
    };
    use crate::server::test_support::{get_json, get_text};

    struct BrokenHardware;
    impl QuantumBackend for BrokenHardware {
        fn name(&self) -> &str {
            "ibm_broken"
        }
        fn kind(&self) -> BackendKind {
            BackendKind::Hardware
        }
        fn run(&self, _: &Circuit, _: u32) -> Result<Histogram, BackendError> {
            Err(BackendError::Execution("job cancelled".into()))
        }
    }

    fn app_with(source: Box<dyn EntropySource>, per_minute: u32) -> Router {
        let metrics = Arc::new(MetricsRegistry::new().unwrap());
        router(Arc::new(QuantumState::new(
            source,
            RateLimiter::per_minute(per_minute),
            metrics,
        )))
    }

    fn simulator_app() -> Router {
        app_with(
            Box::new(QuantumEntropySource::new(Box::new(LocalSimulator::new()))),
            1000,
        )
    }

    #[tokio::test]
    async fn test_entropy_default_bits() {
        let (status, json) = get_json(simulator_app(), "/api/quantum/entropy", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["bits"], 256);
        assert_eq!(json["entropy"].as_str().unwrap().len(), 64);
        assert_eq!(json["backend"], "qasm_simulator");
        assert_eq!(json["backend_type"], "simulator");
        assert_eq!(json["real_hardware"], false);
        assert!(json["generation_time"].as_f64().unwrap() >= 0.0);
    }

    #[tokio::test]
    async fn test_entropy_bounds() {
        let app = simulator_app();
        for uri in [
            "/api/quantum/entropy?bits=0",
            "/api/quantum/entropy?bits=4097",
            "/api/quantum/entropy?bits=-3",
        ] {
            let (status, json) = get_json(app.clone(), uri, &[]).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(json["error"], "Invalid bits parameter");
        }

        let (status, json) = get_json(app.clone(), "/api/quantum/entropy?bits=many", &[]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid parameter");

        for bits in [1, 4096] {
            let uri = format!("/api/quantum/entropy?bits={bits}");
            let (status, json) = get_json(app.clone(), &uri, &[]).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json["bits"], bits);
        }
    }

    #[tokio::test]
    async fn test_rate_limit_returns_429() {
        let app = app_with(Box::new(MockEntropySource::new()), 10);
        for _ in 0..10 {
            let (status, _) = get_json(app.clone(), "/api/quantum/entropy?bits=8", &[]).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, json) = get_json(app.clone(), "/api/quantum/entropy?bits=8", &[]).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["retry_after"], "60 seconds");

        // Health is not rate limited.
        let (status, _) = get_json(app, "/api/quantum/health", &[]).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_backend_failure_is_500() {
        let app = app_with(
            Box::new(QuantumEntropySource::new(Box::new(BrokenHardware))),
            1000,
        );
        let (status, json) = get_json(app.clone(), "/api/quantum/entropy", &[]).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "Failed to generate quantum entropy");

        let (_, body) = get_text(app, "/metrics", &[]).await;
        assert!(body.contains("chimera_entropy_failures_total 1"));
        assert!(body.contains("chimera_quantum_real_hardware 1"));
    }

    #[tokio::test]
    async fn test_health_and_info() {
        let app = app_with(Box::new(MockEntropySource::new()), 10);

        let (status, json) = get_json(app.clone(), "/api/quantum/health", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["service"], "quantum-entropy");
        assert_eq!(json["backend"], "mock_quantum_simulator");
        assert_eq!(json["backend_type"], "simulator");

        let (status, json) = get_json(app, "/api/quantum/info", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["backend"]["type"], "simulator");
        assert_eq!(json["backend"]["real_hardware"], false);
        assert_eq!(json["capabilities"]["max_bits"], 4096);
        assert_eq!(json["capabilities"]["rate_limit"], "10 requests per minute");
    }
}
