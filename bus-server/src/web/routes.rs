//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use tracing::{error, warn};

use crate::domain::{Company, Direction, RouteSelection};
use crate::eta::EtaError;
use crate::snapshot::LoadError;

use super::dto::*;
use super::state::AppState;

/// Interchange stops with broad route coverage, offered when nothing at
/// all is near the caller.
const WELL_KNOWN_STOP_IDS: [&str; 4] = ["003472", "002917", "001764", "001826"];

/// Radius of the first nearby-search tier.
const PRIMARY_RADIUS_KM: f64 = 1.0;

/// Radius of the widened second tier.
const EXTENDED_RADIUS_KM: f64 = 3.0;

const DEFAULT_NEARBY_LIMIT: usize = 10;
const DEFAULT_SEARCH_LIMIT: usize = 50;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stops/nearby", get(nearby_stops))
        .route("/api/stops/:stop_id/routes", get(stop_routes))
        .route("/api/routes/search", get(search_routes))
        .route("/api/routes/keypad", get(keypad_characters))
        .route("/api/eta", get(arrival_board))
        .route("/api/snapshot", get(snapshot_info))
        .route("/api/snapshot/reload", post(reload_snapshot))
        .route("/api/system/trim", post(trim_caches))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Stops near a location.
///
/// Without an explicit radius the search escalates: the primary radius,
/// then the extended radius, then a fixed set of well-known interchanges
/// rendered with their true distance, so the caller always gets something
/// to show. The response names the tier that produced the stops.
async fn nearby_stops(
    State(state): State<AppState>,
    Query(req): Query<NearbyRequest>,
) -> Result<Json<NearbyResponse>, AppError> {
    validate_coordinates(req.lat, req.lon)?;
    let limit = req.limit.unwrap_or(DEFAULT_NEARBY_LIMIT).min(50);

    if let Some(radius_km) = req.radius_km {
        let stops = state.engine.nearby_stops(req.lat, req.lon, radius_km, limit);
        return Ok(Json(NearbyResponse::new("explicit", &stops)));
    }

    let primary = state
        .engine
        .nearby_stops(req.lat, req.lon, PRIMARY_RADIUS_KM, limit);
    if !primary.is_empty() {
        return Ok(Json(NearbyResponse::new("primary", &primary)));
    }

    let extended = state
        .engine
        .nearby_stops(req.lat, req.lon, EXTENDED_RADIUS_KM, limit);
    if !extended.is_empty() {
        return Ok(Json(NearbyResponse::new("extended", &extended)));
    }

    let fallback = state
        .engine
        .locate_stops(req.lat, req.lon, &WELL_KNOWN_STOP_IDS);
    Ok(Json(NearbyResponse::new("fallback", &fallback)))
}

/// Route listing for one stop.
async fn stop_routes(
    State(state): State<AppState>,
    Path(stop_id): Path<String>,
) -> Result<Json<StopRoutesResponse>, AppError> {
    let page = state
        .engine
        .stop_page(&stop_id)
        .ok_or_else(|| AppError::NotFound {
            message: format!("unknown stop id: {stop_id}"),
        })?;
    Ok(Json(StopRoutesResponse::from_page(page)))
}

/// Search routes by number prefix.
async fn search_routes(
    State(state): State<AppState>,
    Query(req): Query<RouteSearchRequest>,
) -> Json<RouteSearchResponse> {
    let limit = req.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).min(200);
    let matches = state.engine.search_routes(&req.q);

    let routes = matches
        .iter()
        .take(limit)
        .map(RouteMatchResult::from_match)
        .collect();

    Json(RouteSearchResponse {
        query: req.q,
        routes,
    })
}

/// Valid next characters for a partially typed route number.
async fn keypad_characters(
    State(state): State<AppState>,
    Query(req): Query<KeypadRequest>,
) -> Json<KeypadResponse> {
    let next = state.engine.possible_next_characters(&req.q);
    Json(KeypadResponse {
        input: req.q,
        next_characters: next.iter().collect(),
    })
}

/// Live arrival board for a route selection.
async fn arrival_board(
    State(state): State<AppState>,
    Query(req): Query<EtaRequest>,
) -> Result<Json<EtaResponse>, AppError> {
    let company = Company::parse(&req.company).map_err(|_| AppError::BadRequest {
        message: format!("unknown company: {}", req.company),
    })?;
    let direction = Direction::parse(&req.direction).map_err(|_| AppError::BadRequest {
        message: format!("unknown direction: {}", req.direction),
    })?;
    let selection = RouteSelection::new(company, req.route, direction, req.stop_id);

    let aggregate = state.engine.compose_display(&selection).await?;
    Ok(Json(EtaResponse::from_aggregate(
        &aggregate,
        Utc::now().fixed_offset(),
    )))
}

/// Describe the active dataset.
async fn snapshot_info(State(state): State<AppState>) -> Json<SnapshotResponse> {
    let snapshot = state.engine.current_snapshot();
    Json(SnapshotResponse::from_snapshot(&snapshot))
}

/// Re-read the installed dataset from disk and swap it in.
async fn reload_snapshot(
    State(state): State<AppState>,
) -> Result<Json<ReloadResponse>, AppError> {
    let old_version = state.engine.snapshot_version();
    let new_version = state.engine.reload_from_disk()?;
    Ok(Json(ReloadResponse {
        old_version,
        new_version,
    }))
}

/// Drop the derived caches.
async fn trim_caches(State(state): State<AppState>) -> StatusCode {
    state.engine.handle_memory_pressure();
    StatusCode::NO_CONTENT
}

fn validate_coordinates(lat: f64, lon: f64) -> Result<(), AppError> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(AppError::BadRequest {
            message: format!("coordinates out of range: ({lat}, {lon})"),
        });
    }
    Ok(())
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<EtaError> for AppError {
    fn from(e: EtaError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl From<LoadError> for AppError {
    fn from(e: LoadError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
