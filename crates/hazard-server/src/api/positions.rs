//! Position source endpoints.

use axum::{extract::State, Json};
use hazard_core::{EngineSnapshot, PositionSample};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::error::{ensure_valid_point, ApiError};
use crate::loops::engine_loop::EngineCommand;
use crate::state::AppState;

/// Feed one GPS fix to the engine.
pub async fn submit_position(
    State(state): State<Arc<AppState>>,
    Json(sample): Json<PositionSample>,
) -> Result<Json<EngineSnapshot>, ApiError> {
    ensure_valid_point(sample.point())?;
    if let Some(speed) = sample.speed {
        if !speed.is_finite() || speed < 0.0 {
            return Err(ApiError::BadRequest(format!("invalid speed {speed}")));
        }
    }

    state
        .call(|reply| EngineCommand::Position { sample, reply })
        .await??;
    Ok(Json(state.snapshot()))
}

#[derive(Debug, Deserialize)]
pub struct PositionErrorRequest {
    pub reason: String,
}

/// The position source failed (permission denied, no signal).
pub async fn report_position_error(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PositionErrorRequest>,
) -> Result<Json<EngineSnapshot>, ApiError> {
    let reason = req.reason;
    state
        .call(|reply| EngineCommand::PositionError { reason, reply })
        .await?;
    Ok(Json(state.snapshot()))
}
