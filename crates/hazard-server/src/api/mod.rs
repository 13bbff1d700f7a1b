//! HTTP API for the presentation layer.

pub mod alerts;
pub mod error;
pub mod geofence;
pub mod navigation;
pub mod positions;
mod routes;
pub mod ws;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

pub use error::ApiError;

pub fn routes() -> Router<Arc<AppState>> {
    routes::create_router()
}

#[cfg(test)]
mod tests;
