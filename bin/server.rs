// US Migration Dashboard - Web Server
// HTML page plus a JSON API over the same page model

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use migration_dashboard::{
    html::render_page, search, shaper::filter_by_origin, CountyPanel, Dashboard, DashboardConfig,
    logging::{self, LogTarget},
    Dataset, Direction, VERSION,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
struct AppState {
    dashboard: Arc<Dashboard>,
    /// County polygons, serialized once at startup
    geojson: Bytes,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ApiResponse {
        success: false,
        data: (),
        error: Some(message.into()),
    };
    (status, Json(body)).into_response()
}

fn internal_error(context: &str, err: anyhow::Error) -> Response {
    error!("{}: {:#}", context, err);
    failure(StatusCode::INTERNAL_SERVER_ERROR, format!("{}: {:#}", context, err))
}

/// Runs page-model work on the blocking pool; shaping and figure
/// building can take a while on a cold cache
async fn run_blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .context("Dashboard task panicked")?
}

#[derive(Deserialize)]
struct PageQuery {
    county: Option<String>,
}

#[derive(Deserialize)]
struct InteractionQuery {
    /// Case-insensitive match on either county name
    q: Option<String>,
    /// Exact origin name
    origin: Option<String>,
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct CountyResponse {
    #[serde(flatten)]
    panel: CountyPanel,
    page_url: String,
}

#[derive(Serialize)]
struct CacheCleared {
    removed: usize,
}

// ============================================================================
// Page
// ============================================================================

/// GET /?county=<name> - Full dashboard page
async fn serve_index(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Response {
    let dashboard = state.dashboard.clone();
    let rendered = run_blocking(move || {
        let page = dashboard.render(query.county.as_deref())?;
        Ok(render_page(&page))
    })
    .await;

    match rendered {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Error rendering dashboard: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("<h1>Dashboard unavailable</h1><pre>{:#}</pre>", e)),
            )
                .into_response()
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok(VERSION))
}

/// GET /api/page?county=<name> - Page model as JSON
async fn get_page(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Response {
    let dashboard = state.dashboard.clone();
    match run_blocking(move || dashboard.render(query.county.as_deref())).await {
        Ok(page) => (StatusCode::OK, Json(ApiResponse::ok(page))).into_response(),
        Err(e) => internal_error("Error rendering dashboard", e),
    }
}

/// GET /api/interactions?q=&origin=&limit= - Labeled county pairs
async fn get_interactions(
    State(state): State<AppState>,
    Query(query): Query<InteractionQuery>,
) -> Response {
    let dashboard = state.dashboard.clone();
    let result = run_blocking(move || {
        let rows = dashboard.table(Dataset::Interactions)?;

        let mut filtered = match &query.origin {
            Some(origin) => filter_by_origin(&rows, origin),
            None => Vec::clone(&rows),
        };
        if let Some(q) = query.q.as_deref().filter(|q| !q.trim().is_empty()) {
            filtered = search(&filtered, q);
        }
        if let Some(limit) = query.limit {
            filtered.truncate(limit);
        }
        Ok(filtered)
    })
    .await;

    match result {
        Ok(rows) => (StatusCode::OK, Json(ApiResponse::ok(rows))).into_response(),
        Err(e) => internal_error("Error shaping interactions", e),
    }
}

/// GET /api/maps/:direction - 3D map figure, `out` or `in`
async fn get_map(State(state): State<AppState>, Path(direction): Path<Direction>) -> Response {
    let dashboard = state.dashboard.clone();
    match run_blocking(move || dashboard.map(direction)).await {
        Ok(figure) => (StatusCode::OK, Json(ApiResponse::ok(figure))).into_response(),
        Err(e) => internal_error("Error building map", e),
    }
}

/// GET /api/regional - New York metro comparison
async fn get_regional(State(state): State<AppState>) -> Response {
    let dashboard = state.dashboard.clone();
    match run_blocking(move || dashboard.regional()).await {
        Ok(rows) => (StatusCode::OK, Json(ApiResponse::ok(rows))).into_response(),
        Err(e) => internal_error("Error building regional comparison", e),
    }
}

/// GET /api/counties/:name - Cards, destinations and choropleth for one county
async fn get_county(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let dashboard = state.dashboard.clone();
    let county = name.clone();
    match run_blocking(move || dashboard.county_panel(&county)).await {
        Ok(Some(panel)) => {
            let page_url = format!("/?county={}", urlencoding::encode(&name));
            (
                StatusCode::OK,
                Json(ApiResponse::ok(CountyResponse { panel, page_url })),
            )
                .into_response()
        }
        Ok(None) => failure(StatusCode::NOT_FOUND, format!("Unknown county: {}", name)),
        Err(e) => internal_error("Error building county panel", e),
    }
}

/// GET /api/pairs/:origin/:destination - Raw exemption count for one pair
async fn get_pair(
    State(state): State<AppState>,
    Path((origin, destination)): Path<(String, String)>,
) -> Response {
    let pair = state.dashboard.pair(&origin, &destination);
    (StatusCode::OK, Json(ApiResponse::ok(pair))).into_response()
}

/// GET /api/geojson - County polygons for the choropleth
async fn get_geojson(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/geo+json")],
        state.geojson.clone(),
    )
}

/// POST /api/ask - Question box
async fn ask(State(state): State<AppState>, Json(request): Json<AskRequest>) -> Response {
    let dashboard = state.dashboard.clone();

    // The chat client blocks as well
    match run_blocking(move || dashboard.ask(&request.question)).await {
        Ok(reply) => (StatusCode::OK, Json(ApiResponse::ok(reply))).into_response(),
        Err(e) => internal_error("Error preparing question context", e),
    }
}

/// GET /api/cache - What the memo cache holds
async fn get_cache(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.dashboard.cache().entries()))
}

/// POST /api/cache/clear - Drop every memoized result
async fn clear_cache(State(state): State<AppState>) -> impl IntoResponse {
    let removed = state.dashboard.cache().clear();
    info!(removed, "Cache cleared");
    Json(ApiResponse::ok(CacheCleared { removed }))
}

// ============================================================================
// Main Server
// ============================================================================

fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/page", get(get_page))
        .route("/interactions", get(get_interactions))
        .route("/maps/:direction", get(get_map))
        .route("/regional", get(get_regional))
        .route("/counties/:name", get(get_county))
        .route("/pairs/:origin/:destination", get(get_pair))
        .route("/geojson", get(get_geojson))
        .route("/ask", post(ask))
        .route("/cache", get(get_cache))
        .route("/cache/clear", post(clear_cache))
        .with_state(state.clone());

    Router::new()
        .route("/", get(serve_index))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init(&LogTarget::Stderr)?;

    info!("🌐 US Migration Dashboard - Web Server v{}", VERSION);

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = DashboardConfig::load(config_path.as_deref())?;
    let bind = config.server.bind.clone();

    let dashboard = run_blocking(move || Dashboard::load(config)).await?;
    info!(
        counties = dashboard.data().names.len(),
        pairs = dashboard.data().interactions.len(),
        polygons = dashboard.counties().features.len(),
        "✓ Data loaded"
    );

    let geojson = serde_json::to_vec(dashboard.counties())
        .context("Failed to serialize county polygons")?;

    let state = AppState {
        dashboard: Arc::new(dashboard),
        geojson: Bytes::from(geojson),
    };

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;

    info!("🚀 Server running on http://{}", bind);
    info!("   API: http://{}/api/page", bind);

    axum::serve(listener, app(state))
        .await
        .context("Server stopped")?;

    Ok(())
}
