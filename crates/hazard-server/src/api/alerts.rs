//! Alert endpoints.
//!
//! Reports posted here join the same store the feed sync loop maintains.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use hazard_core::{Alert, AlertSeverity, AlertType, GeoPoint};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error::{ensure_valid_point, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateAlertRequest {
    /// Reusing an existing id updates that alert
    #[serde(default)]
    pub id: Option<String>,
    pub severity: AlertSeverity,
    #[serde(rename = "type", default = "default_alert_type")]
    pub alert_type: AlertType,
    pub lat: f64,
    pub lng: f64,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

fn default_alert_type() -> AlertType {
    AlertType::Other
}

/// List all active alerts.
pub async fn list_alerts(State(state): State<Arc<AppState>>) -> Json<Vec<Alert>> {
    Json(state.alerts().all())
}

/// Report a new hazard or update an existing one.
pub async fn create_alert(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAlertRequest>,
) -> Result<(StatusCode, Json<Alert>), ApiError> {
    let position = ensure_valid_point(GeoPoint::new(req.lat, req.lng))?;
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }

    let id = req
        .id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let alert = Alert {
        created_at: state
            .alerts()
            .get(&id)
            .and_then(|existing| existing.created_at)
            .or_else(|| Some(Utc::now())),
        id,
        severity: req.severity,
        alert_type: req.alert_type,
        position,
        title: req.title,
        description: req.description,
    };

    let is_new = state.report_alert(alert.clone()).await?;
    let status = if is_new {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(alert)))
}

/// Remove an alert that is no longer active.
pub async fn delete_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    match state.remove_alert(&id).await? {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(ApiError::AlertNotFound(id)),
    }
}
