//! Proximity alerting endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use hazard_core::{GeofenceZone, NearbyAlert};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::loops::engine_loop::EngineCommand;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GeofenceStatus {
    pub active: bool,
    pub entered_zones: Vec<GeofenceZone>,
}

fn status(state: &AppState) -> GeofenceStatus {
    let snapshot = state.snapshot();
    GeofenceStatus {
        active: snapshot.geofencing_active,
        entered_zones: snapshot.entered_zones,
    }
}

pub async fn start_geofencing(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GeofenceStatus>, ApiError> {
    state
        .call(|reply| EngineCommand::StartGeofencing { reply })
        .await?;
    Ok(Json(status(&state)))
}

pub async fn stop_geofencing(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GeofenceStatus>, ApiError> {
    state
        .call(|reply| EngineCommand::StopGeofencing { reply })
        .await?;
    Ok(Json(status(&state)))
}

/// Zones the user is currently inside.
pub async fn list_zones(State(state): State<Arc<AppState>>) -> Json<GeofenceStatus> {
    Json(status(&state))
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub radius_m: Option<f64>,
}

/// Alerts around the last known position, nearest first.
pub async fn nearby_alerts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<NearbyAlert>>, ApiError> {
    let radius_m = query.radius_m;
    if let Some(radius) = radius_m {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ApiError::BadRequest(format!("invalid radius_m {radius}")));
        }
    }

    let nearby = state
        .call(|reply| EngineCommand::Nearby { radius_m, reply })
        .await?;
    Ok(Json(nearby))
}
