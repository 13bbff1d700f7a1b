//! Mapping of engine and state errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hazard_core::{GeoPoint, NavError};
use serde_json::json;
use thiserror::Error;

use crate::state::EngineUnavailable;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Nav(#[from] NavError),
    #[error(transparent)]
    Unavailable(#[from] EngineUnavailable),
    #[error("{0}")]
    BadRequest(String),
    #[error("alert {0} not found")]
    AlertNotFound(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Nav(NavError::InvalidCoordinate { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Nav(NavError::InvalidRules(_)) => StatusCode::BAD_REQUEST,
            ApiError::Nav(NavError::RouteNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Nav(
                NavError::MissingDestination
                | NavError::NoPositionFix
                | NavError::NoRouteSelected
                | NavError::DegenerateRoute(_),
            ) => StatusCode::CONFLICT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::AlertNotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Reject coordinates outside WGS84 before they reach the engine.
pub fn ensure_valid_point(point: GeoPoint) -> Result<GeoPoint, ApiError> {
    if point.is_valid() {
        Ok(point)
    } else {
        Err(NavError::InvalidCoordinate {
            lat: point.lat,
            lng: point.lng,
        }
        .into())
    }
}
