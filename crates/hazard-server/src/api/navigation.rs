//! Navigation endpoints: destination, route picking and trip control.

use axum::{extract::State, http::StatusCode, Json};
use hazard_core::{EngineSnapshot, GeoPoint, RouteCandidate, RoutePreference, RouteRequest};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::error::{ensure_valid_point, ApiError};
use crate::loops::engine_loop::EngineCommand;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DestinationRequest {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub preference: RoutePreference,
}

/// Set the destination. Candidates arrive asynchronously once the routing
/// oracle answers; poll `/v1/navigation/routes` or watch the stream.
pub async fn set_destination(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DestinationRequest>,
) -> Result<(StatusCode, Json<RouteRequest>), ApiError> {
    let destination = ensure_valid_point(GeoPoint::new(req.lat, req.lng))?;
    let preference = req.preference;

    let request = state
        .call(|reply| EngineCommand::RequestRoutes {
            destination,
            preference,
            reply,
        })
        .await??;
    tracing::info!(
        "Route request {} to ({:.5}, {:.5}) preferring {:?}",
        request.id,
        destination.lat,
        destination.lng,
        preference
    );
    Ok((StatusCode::ACCEPTED, Json(request)))
}

/// Ranked candidates for the current destination.
pub async fn list_routes(State(state): State<Arc<AppState>>) -> Json<Vec<RouteCandidate>> {
    Json(state.snapshot().session.routes)
}

#[derive(Debug, Deserialize)]
pub struct SelectRouteRequest {
    pub route_id: String,
}

pub async fn select_route(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectRouteRequest>,
) -> Result<Json<EngineSnapshot>, ApiError> {
    let route_id = req.route_id;
    state
        .call(|reply| EngineCommand::SelectRoute { route_id, reply })
        .await??;
    Ok(Json(state.snapshot()))
}

pub async fn start_navigation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EngineSnapshot>, ApiError> {
    state
        .call(|reply| EngineCommand::StartNavigation { reply })
        .await??;
    Ok(Json(state.snapshot()))
}

pub async fn stop_navigation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EngineSnapshot>, ApiError> {
    state
        .call(|reply| EngineCommand::StopNavigation { reply })
        .await?;
    Ok(Json(state.snapshot()))
}

/// Clear the reroute prompt without changing route.
pub async fn dismiss_reroute(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EngineSnapshot>, ApiError> {
    state
        .call(|reply| EngineCommand::DismissReroute { reply })
        .await?;
    Ok(Json(state.snapshot()))
}

pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<EngineSnapshot> {
    Json(state.snapshot())
}
