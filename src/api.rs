//! REST API for the stack planner.
//!
//! Provides HTTP endpoints around [`plan_packing`].
//! Uses Axum as the web framework and supports CORS.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, OptimizerConfig};
use crate::error::{PackingError, SolverError};
use crate::model::{Orientation, Placement};
use crate::optimizer::{PackingOutcome, plan_packing};
use crate::types::Axis;

#[derive(Clone)]
struct ApiState {
    optimizer_config: OptimizerConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>stack-planner API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Request structure for the packing endpoint.
///
/// `item_size` holds three equal-length columns `[m, n, l]`; item `i` has the
/// unordered edge lengths `m[i]`, `n[i]` and `l[i]`.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "container_size": [10.0, 10.0, 100.0],
        "item_size": [[2.0, 2.0, 2.0], [2.0, 1.0, 1.0], [1.0, 1.0, 2.0]],
        "margin": 5.0
    })
)]
pub struct PackRequest {
    #[schema(value_type = [f64; 3])]
    pub container_size: [f64; 3],
    #[schema(value_type = Vec<Vec<f64>>)]
    pub item_size: [Vec<f64>; 3],
    #[serde(default)]
    #[schema(nullable = true)]
    pub margin: Option<f64>,
}

/// Response of the packing endpoint.
///
/// `max_height` and `placements` are `null` when no optimal stack exists
/// (`status` is then `infeasible`, `unbounded` or `not_optimal`).
#[derive(Serialize, ToSchema)]
pub struct PackResponse {
    pub status: String,
    #[schema(nullable = true)]
    pub max_height: Option<f64>,
    #[schema(nullable = true)]
    pub placements: Option<Vec<PackedItem>>,
    #[schema(nullable = true)]
    pub solve_ms: Option<u64>,
}

/// Single placed item in the response.
///
/// # Fields
/// * `index` - Position of the item in the request columns
/// * `x`, `y` - Footprint centroid
/// * `z` - Bottom face
/// * `orientation` - Container axis for the m, n and l edge
/// * `extent` - Size along x, y and z
#[derive(Serialize, ToSchema)]
pub struct PackedItem {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub orientation: Orientation,
    #[schema(value_type = [f64; 3], example = json!([7.0, 7.0, 6.0]))]
    pub extent: [f64; 3],
}

impl From<&Placement> for PackedItem {
    fn from(placement: &Placement) -> Self {
        Self {
            index: placement.index,
            x: placement.centroid_x,
            y: placement.centroid_y,
            z: placement.bottom_z,
            orientation: placement.orientation,
            extent: placement.extent.to_array(),
        }
    }
}

impl PackResponse {
    /// Creates a PackResponse from a PackingOutcome.
    pub fn from_outcome(outcome: &PackingOutcome) -> Self {
        let status = outcome.status().code().to_string();
        match outcome.plan() {
            Some(plan) => Self {
                status,
                max_height: Some(plan.max_height),
                placements: Some(plan.placements.iter().map(PackedItem::from).collect()),
                solve_ms: Some(plan.solve_duration.as_millis() as u64),
            },
            None => Self {
                status,
                max_height: None,
                placements: None,
                solve_ms: None,
            },
        }
    }
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    code: String,
    details: String,
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    code: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    let body = ErrorResponse {
        error: error.into(),
        code: code.into(),
        details: details.into(),
    };
    (status, Json(body)).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        "invalid_json",
        err.to_string(),
    )
}

fn packing_error_response(err: PackingError) -> Response {
    let (status, title) = match &err {
        PackingError::Config(_) => (StatusCode::UNPROCESSABLE_ENTITY, "Invalid input data"),
        PackingError::Solver(SolverError::TimedOut(_)) => {
            (StatusCode::GATEWAY_TIMEOUT, "Solver time limit exceeded")
        }
        PackingError::Solver(_) => (StatusCode::SERVICE_UNAVAILABLE, "Solver failure"),
        PackingError::Decode(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Solution decoding failed"),
    };
    if status.is_server_error() {
        error!(code = err.code(), "{}", err);
    } else {
        warn!(code = err.code(), "{}", err);
    }
    error_response(status, title, err.code(), err.to_string())
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_pack, handle_health),
    components(schemas(PackRequest, PackResponse, PackedItem, Orientation, Axis, ErrorResponse)),
    tags((name = "packing", description = "Exact stack height optimization"))
)]
struct ApiDoc;

/// Builds the application router with CORS and OpenAPI routes.
pub fn build_router(optimizer_config: OptimizerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/pack", post(handle_pack))
        .route("/health", get(handle_health))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(ApiState { optimizer_config })
}

/// Starts the API server.
///
/// Blocks until the server is terminated.
pub async fn start_api_server(config: ApiConfig, optimizer_config: OptimizerConfig) {
    let app = build_router(optimizer_config);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("❌ Could not bind API server to {}: {}", addr, err);
            return;
        }
    };

    info!(
        "🚀 Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() {
        info!("💡 Local access: http://localhost:{}", config.port());
    }
    info!("📦 API Endpoints: POST /pack, GET /health");
    info!("📑 Documentation: GET /docs, GET /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        error!("❌ API server terminated with an error: {err}");
    }
}

/// Handler for POST /pack endpoint.
///
/// Solves the stacking MILP on the blocking thread pool.
///
/// # Returns
/// 200 with the sorted plan, or with `null` fields when no optimum exists;
/// 422 for malformed input; 503/504 for solver failures.
#[utoipa::path(
    post,
    path = "/pack",
    request_body = PackRequest,
    responses(
        (status = 200, description = "Solved, or no solution exists", body = PackResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Solver output could not be decoded", body = ErrorResponse),
        (status = SERVICE_UNAVAILABLE, description = "Solver failure", body = ErrorResponse),
        (status = GATEWAY_TIMEOUT, description = "Solver time limit exceeded", body = ErrorResponse)
    ),
    tag = "packing"
)]
async fn handle_pack(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    let mut packing_config = state.optimizer_config.packing_config();
    if let Some(margin) = request.margin {
        packing_config.margin = margin;
    }

    let PackRequest {
        container_size,
        item_size,
        ..
    } = request;
    info!(
        "📥 New pack request: {} items, container {:?}",
        item_size[0].len(),
        container_size
    );

    let result = tokio::task::spawn_blocking(move || {
        plan_packing(container_size, &item_size, &packing_config)
    })
    .await;

    match result {
        Ok(Ok(outcome)) => {
            let response = PackResponse::from_outcome(&outcome);
            info!(
                "📦 Result: status {}, max height {:?}",
                response.status, response.max_height
            );
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(Err(err)) => packing_error_response(err),
        Err(err) => {
            error!("❌ Packing task failed: {err}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Packing task failed",
                "task_failed",
                err.to_string(),
            )
        }
    }
}

/// Handler for GET /health.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is alive", body = String)),
    tag = "packing"
)]
async fn handle_health() -> &'static str {
    "ok"
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
