//! HTTP Server for the scorecard API.
//!
//! Provides REST endpoints for building scorecards from a taxonomy and
//! analytics rows. Fetching from the analytics backend is left to the
//! caller, which uses the returned query parameters.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | POST   | `/api/scorecard`  | Build a scorecard                    |
//! | POST   | `/api/validate`   | Check a taxonomy's shape             |
//! | POST   | `/api/classify`   | Classify one actual/target pair      |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, ClassifyRequest, ClassifyResponse, ScorecardResponse, ValidationReport};
use crate::config::EngineConfig;
use crate::error::ServerResult;
use crate::models::Direction;
use crate::parser::taxonomy_from_value;
use crate::transform::performance::{classify, format_percentage, parse_value};
use crate::transform::pipeline::{build_scorecard, ScorecardRequest};
use crate::validation::parse_taxonomy;

type AppState = Arc<EngineConfig>;
type ApiError = (StatusCode, Json<Value>);

/// Build the router with all routes and CORS.
pub fn router(config: EngineConfig) -> Router {
    // Permissive CORS for dashboard development
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/scorecard", post(scorecard))
        .route("/api/validate", post(validate_taxonomy))
        .route("/api/classify", post(classify_pair))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(Arc::new(config))
}

/// Start the HTTP server
pub async fn start_server(config: EngineConfig) -> ServerResult<()> {
    let port = config.port;
    let app = router(config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    log_info(format!("🚀 Scorecard server running on http://localhost:{}", port));
    log_info("POST /api/scorecard - Build a scorecard");
    log_info("POST /api/validate  - Validate a taxonomy");
    log_info("POST /api/classify  - Classify an actual/target pair");
    log_info("GET  /api/logs      - SSE log stream");
    log_info("GET  /health        - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "scorecard",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "scorecard": "POST /api/scorecard",
            "validate": "POST /api/validate",
            "classify": "POST /api/classify",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers skip the entries they missed
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Build a scorecard from a taxonomy, analytics rows and navigation context
async fn scorecard(
    State(config): State<AppState>,
    Json(mut request): Json<ScorecardRequest>,
) -> Result<Json<ScorecardResponse>, ApiError> {
    request.taxonomy = taxonomy_from_value(request.taxonomy);

    let options = config.pivot.clone();
    let result = tokio::task::spawn_blocking(move || build_scorecard(&request, &options))
        .await
        .map_err(|e| {
            log_error(format!("Scorecard task failed: {}", e));
            (StatusCode::INTERNAL_SERVER_ERROR, Json(error_response(&e.to_string())))
        })?;

    Ok(Json(ScorecardResponse::from(result)))
}

/// Check a taxonomy document without building anything
async fn validate_taxonomy(Json(body): Json<Value>) -> Json<ValidationReport> {
    let report = match parse_taxonomy(&taxonomy_from_value(body)) {
        Ok(group_sets) => ValidationReport {
            valid: true,
            group_sets: group_sets.len(),
            errors: Vec::new(),
        },
        Err(e) => ValidationReport {
            valid: false,
            group_sets: 0,
            errors: e.messages(),
        },
    };
    Json(report)
}

/// Classify a single actual/target pair
async fn classify_pair(
    State(config): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let thresholds = request.thresholds.unwrap_or(config.pivot.thresholds);
    if thresholds.moderate > thresholds.achieved {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(error_response("moderate threshold must not exceed achieved threshold")),
        ));
    }

    let direction = Direction::from_descending(request.descending);
    let result = classify(
        parse_value(&request.actual),
        parse_value(&request.target),
        direction,
        &thresholds,
    );

    Ok(Json(ClassifyResponse {
        ratio: Some(result.ratio).filter(|r| r.is_finite()),
        performance: format_percentage(result.ratio),
        band: result.band,
        style: result.style,
        direction,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "scorecard");
    }

    #[tokio::test]
    async fn test_validate_endpoint() {
        let Json(report) = validate_taxonomy(Json(json!({
            "dataElementGroupSets": [{ "id": "G1", "dataElementGroups": [] }]
        })))
        .await;
        assert!(report.valid);
        assert_eq!(report.group_sets, 1);

        let Json(report) = validate_taxonomy(Json(json!("nope"))).await;
        assert!(!report.valid);
        assert!(!report.errors.is_empty());
    }

    #[tokio::test]
    async fn test_classify_endpoint() {
        let state = Arc::new(EngineConfig::default());
        let request = ClassifyRequest {
            actual: "40".into(),
            target: "50".into(),
            descending: false,
            thresholds: None,
        };
        let Json(response) = classify_pair(State(state.clone()), Json(request)).await.unwrap();
        assert_eq!(response.performance, "80%");
        assert_eq!(response.band.label(), "moderate");

        let request = ClassifyRequest {
            actual: "40".into(),
            target: "".into(),
            descending: true,
            thresholds: None,
        };
        let Json(response) = classify_pair(State(state), Json(request)).await.unwrap();
        assert_eq!(response.ratio, None);
        assert_eq!(response.band.label(), "no-data");
    }

    #[tokio::test]
    async fn test_scorecard_endpoint() {
        let state = Arc::new(EngineConfig::default());
        let request: ScorecardRequest = serde_json::from_value(json!({
            "taxonomy": [{
                "id": "G1",
                "dataElementGroups": [{ "id": "Grp1", "dataElements": [{ "id": "E1" }] }]
            }],
            "rows": [
                ["E1", "_", "target", "2024Q1", "50"],
                ["E1", "_", "actual", "2024Q1", "50"]
            ],
            "context": { "periods": "2024Q1" }
        }))
        .unwrap();

        let Json(response) = scorecard(State(state), Json(request)).await.unwrap();
        assert_eq!(response.status, "ready");
        assert_eq!(response.rows[0]["2024Q1performance-group"], "achieved");
    }
}
