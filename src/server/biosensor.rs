//! Biosensor HTTP service.
//!
//! - `GET /api/sensors/readings` - Normalized readings (API key guarded when configured)
//! - `GET /api/sensors/health` - Probe-time availability
//! - `GET /api/sensors/info` - Service description
//! - `GET /metrics` - Prometheus metrics

use super::{api_error, finish, metrics_response, ApiError};
use crate::metrics::MetricsRegistry;
use crate::sensors::{unix_timestamp, SensorHealth, SensorNode, SensorReadings};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Shared state of the biosensor service.
pub struct BiosensorState {
    node: SensorNode,
    api_key: Option<String>,
    metrics: Arc<MetricsRegistry>,
}

impl BiosensorState {
    /// Wraps a probed node; publishes its availability to `metrics`.
    pub fn new(node: SensorNode, api_key: Option<String>, metrics: Arc<MetricsRegistry>) -> Self {
        metrics.set_sensor_health(&node.health_status());
        Self {
            node,
            api_key: api_key.filter(|k| !k.is_empty()),
            metrics,
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    sensors: SensorHealth,
    timestamp: f64,
}

#[derive(Debug, Serialize)]
struct InfoResponse {
    name: &'static str,
    version: &'static str,
    sensors: BTreeMap<&'static str, &'static str>,
    authentication: &'static str,
    endpoints: BTreeMap<&'static str, &'static str>,
}

/// Builds the biosensor router.
pub fn router(state: Arc<BiosensorState>) -> Router {
    let guarded = Router::new()
        .route("/api/sensors/readings", get(readings))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_api_key,
        ));

    let app = Router::new()
        .merge(guarded)
        .route("/api/sensors/health", get(health))
        .route("/api/sensors/info", get(info))
        .route("/metrics", get(metrics))
        .with_state(state);

    finish(app)
}

async fn require_api_key(
    State(state): State<Arc<BiosensorState>>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(expected) = &state.api_key {
        let provided = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            tracing::debug!("Rejected request with missing or invalid API key");
            return api_error(
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "Invalid or missing API key",
            )
            .into_response();
        }
    }
    next.run(request).await
}

async fn readings(
    State(state): State<Arc<BiosensorState>>,
) -> Result<Json<SensorReadings>, ApiError> {
    let worker = Arc::clone(&state);
    let readings = tokio::task::spawn_blocking(move || {
        worker
            .node
            .read_all_with(|capability, reading| worker.metrics.record_read(capability, reading))
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Sensor read task failed");
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to read sensors",
            e.to_string(),
        )
    })?;
    Ok(Json(readings))
}

async fn health(State(state): State<Arc<BiosensorState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sensors: state.node.health_status(),
        timestamp: unix_timestamp(),
    })
}

async fn info(State(state): State<Arc<BiosensorState>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "Chimera Bio Sensor API",
        version: crate::VERSION,
        sensors: BTreeMap::from([
            ("light", "TSL2561 (0-1000 lux normalized to 0-1)"),
            ("temperature", "DHT22 (0-40°C normalized to 0-1)"),
            ("acceleration", "MPU6050 (0-20 m/s² normalized to 0-1)"),
        ]),
        authentication: if state.api_key.is_some() {
            "required"
        } else {
            "optional"
        },
        endpoints: BTreeMap::from([
            ("/api/sensors/readings", "GET - Current sensor readings"),
            ("/api/sensors/health", "GET - Sensor health status"),
            ("/api/sensors/info", "GET - API information"),
            ("/metrics", "GET - Prometheus metrics"),
        ]),
    })
}

async fn metrics(State(state): State<Arc<BiosensorState>>) -> Response {
    metrics_response(&state.metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{IioPlatform, SimulatedPlatform};
    use crate::server::test_support::{get_json, get_text};

    fn simulated(api_key: Option<&str>) -> Router {
        let node = SensorNode::probe(&mut SimulatedPlatform::with_seed(3));
        let metrics = Arc::new(MetricsRegistry::new().unwrap());
        router(Arc::new(BiosensorState::new(
            node,
            api_key.map(String::from),
            metrics,
        )))
    }

    fn without_hardware() -> Router {
        let node = SensorNode::probe(&mut IioPlatform::new("/nonexistent/iio/devices"));
        let metrics = Arc::new(MetricsRegistry::new().unwrap());
        router(Arc::new(BiosensorState::new(node, None, metrics)))
    }

    #[tokio::test]
    async fn test_readings_in_unit_range() {
        let (status, json) = get_json(simulated(None), "/api/sensors/readings", &[]).await;
        assert_eq!(status, StatusCode::OK);
        for key in ["light", "temperature", "acceleration"] {
            let value = json[key].as_f64().unwrap();
            assert!((0.0..=1.0).contains(&value), "{key} = {value}");
        }
        assert!(json["timestamp"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_no_hardware_still_serves() {
        let app = without_hardware();

        let (status, json) = get_json(app.clone(), "/api/sensors/readings", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["light"].is_null());
        assert!(json["temperature"].is_null());
        assert!(json["acceleration"].is_null());

        let (status, json) = get_json(app, "/api/sensors/health", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["sensors"]["i2c"], false);
        assert_eq!(json["sensors"]["light"], false);
    }

    #[tokio::test]
    async fn test_api_key_required_when_configured() {
        let app = simulated(Some("s3cret"));

        let (status, json) = get_json(app.clone(), "/api/sensors/readings", &[]).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "Unauthorized");

        let (status, _) = get_json(
            app.clone(),
            "/api/sensors/readings",
            &[("X-API-Key", "wrong")],
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = get_json(
            app.clone(),
            "/api/sensors/readings",
            &[("X-API-Key", "s3cret")],
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Health and info stay open.
        let (status, json) = get_json(app, "/api/sensors/info", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["authentication"], "required");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (status, json) = get_json(simulated(None), "/api/sensors/nope", &[]).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Not found");
    }

    #[tokio::test]
    async fn test_metrics_count_reads() {
        let app = simulated(None);
        get_json(app.clone(), "/api/sensors/readings", &[]).await;
        let (status, body) = get_text(app, "/metrics", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"chimera_sensor_reads_total{capability="light"} 1"#));
        assert!(body.contains(r#"chimera_sensor_available{capability="i2c"} 1"#));
    }
}
