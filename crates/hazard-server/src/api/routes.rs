//! REST API routes.

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::api::{alerts, geofence, navigation, positions, ws};
use crate::state::AppState;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/v1/positions", post(positions::submit_position))
        .route("/v1/positions/error", post(positions::report_position_error))
        .route("/v1/alerts", get(alerts::list_alerts).post(alerts::create_alert))
        .route("/v1/alerts/:id", delete(alerts::delete_alert))
        .route("/v1/navigation/destination", post(navigation::set_destination))
        .route("/v1/navigation/routes", get(navigation::list_routes))
        .route("/v1/navigation/select", post(navigation::select_route))
        .route("/v1/navigation/start", post(navigation::start_navigation))
        .route("/v1/navigation/stop", post(navigation::stop_navigation))
        .route("/v1/navigation/reroute/dismiss", post(navigation::dismiss_reroute))
        .route("/v1/navigation/session", get(navigation::get_session))
        .route("/v1/geofence/start", post(geofence::start_geofencing))
        .route("/v1/geofence/stop", post(geofence::stop_geofencing))
        .route("/v1/geofence/zones", get(geofence::list_zones))
        .route("/v1/geofence/nearby", get(geofence::nearby_alerts))
        .route("/v1/stream", get(ws::ws_handler))
}
