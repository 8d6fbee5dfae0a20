//! Query server for the vendor map.
//!
//! Provides HTTP API for boundary containment, nearest and radius searches,
//! vendor distances, name suggestions, point submission and live tracking.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use clap::Parser;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use kedai::config::Config;
use kedai::tracking::{spawn_tracker, TrackSnapshot, TrackerHandle};
use kedai::{CandidatePoint, MapContext, Submission};

mod api;
use api::{
    distinct_keys, parse_point, radius_km, search_size, ApiError, DistanceQueryParams,
    DistanceResponse, FixRequest, FixResponse, HealthResponse, InsideResponse, NearestResponse,
    PointQueryParams, RadiusQueryParams, RadiusResponse, SearchQueryParams, SearchResponse,
};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Vendor map query server")]
struct Args {
    /// Path to the TOML config naming the boundary and vendor layers
    #[arg(short, long, default_value = "kedai.toml")]
    config: PathBuf,

    /// Listen address (overrides the config file)
    #[arg(short, long)]
    listen: Option<String>,

    /// Log level, used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Application state shared across handlers
struct AppState {
    context: RwLock<MapContext>,
    tracker: TrackerHandle,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Kedai Query Server");
    info!("Loading config from {}", args.config.display());

    let config = Config::load_from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    let context = MapContext::from_config(&config);
    if context.boundary().map_or(true, |b| b.is_empty()) {
        tracing::warn!("No boundary loaded; every containment check will report outside");
    }

    let state = Arc::new(AppState {
        context: RwLock::new(context),
        tracker: spawn_tracker(64),
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/inside", get(inside_handler))
        .route("/v1/nearest", get(nearest_handler))
        .route("/v1/radius", get(radius_handler))
        .route("/v1/distance", get(distance_handler))
        .route("/v1/search", get(search_handler))
        .route("/v1/submissions", post(submission_handler))
        .route("/v1/tracking", get(tracking_handler))
        .route("/v1/tracking/start", post(tracking_start_handler))
        .route("/v1/tracking/stop", post(tracking_stop_handler))
        .route("/v1/tracking/fix", post(tracking_fix_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listen = args.listen.unwrap_or(config.global.listen);
    info!("Starting server on {}", listen);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let ctx = state.context.read().await;
    Json(HealthResponse::new(ctx.boundary(), ctx.candidates().len()))
}

/// Boundary containment for one point
async fn inside_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PointQueryParams>,
) -> Result<Json<InsideResponse>, ApiError> {
    let point = parse_point(params.lat, params.lon)?;
    let inside = state.context.read().await.is_inside(point);
    Ok(Json(InsideResponse { inside }))
}

/// Closest vendor to a reference point
async fn nearest_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PointQueryParams>,
) -> Result<Json<NearestResponse>, ApiError> {
    let point = parse_point(params.lat, params.lon)?;
    let nearest = state.context.read().await.nearest(point);
    Ok(Json(NearestResponse { nearest }))
}

/// Vendors inside a circular buffer around a reference point
async fn radius_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RadiusQueryParams>,
) -> Result<Json<RadiusResponse>, ApiError> {
    let point = parse_point(params.lat, params.lon)?;
    let km = radius_km(params.radius_m)?;
    let hits = state.context.read().await.within_radius(point, km);

    Ok(Json(RadiusResponse {
        radius_m: params.radius_m,
        count: hits.len(),
        hits,
    }))
}

/// Distance between two vendors chosen by name
async fn distance_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DistanceQueryParams>,
) -> Result<Json<DistanceResponse>, ApiError> {
    let (a, b) = distinct_keys(&params.a, &params.b)?;
    let result = state
        .context
        .read()
        .await
        .distance_between(&a, &b)
        .ok_or_else(|| ApiError::NotFound(format!("unknown vendor '{}' or '{}'", a, b)))?;

    Ok(Json(DistanceResponse {
        a,
        b,
        distance_km: result.distance_km,
        distance_m: result.distance_m,
    }))
}

/// Name suggestions
async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQueryParams>,
) -> Json<SearchResponse> {
    let ctx = state.context.read().await;
    let features = ctx
        .search(&params.text, search_size(params.size))
        .into_iter()
        .cloned()
        .collect();
    Json(SearchResponse { features })
}

/// Crowd-sourced vendor submission
async fn submission_handler(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<Submission>,
) -> Result<(StatusCode, Json<CandidatePoint>), ApiError> {
    let added = state.context.write().await.submit(submission)?;
    Ok((StatusCode::CREATED, Json(added)))
}

async fn tracking_handler(State(state): State<Arc<AppState>>) -> Json<TrackSnapshot> {
    Json(state.tracker.snapshot())
}

async fn tracking_start_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TrackSnapshot>, ApiError> {
    state.tracker.start().await?;
    Ok(Json(state.tracker.snapshot()))
}

async fn tracking_stop_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TrackSnapshot>, ApiError> {
    state.tracker.stop().await?;
    Ok(Json(state.tracker.snapshot()))
}

/// Record a live position
async fn tracking_fix_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FixRequest>,
) -> Result<Json<FixResponse>, ApiError> {
    let fix = request.into_fix(Utc::now())?;
    let speed_mps = state.tracker.record(fix).await?;
    let inside = state.context.read().await.is_inside(fix.point);

    Ok(Json(FixResponse {
        speed_mps,
        inside,
        tracking: state.tracker.snapshot(),
    }))
}
