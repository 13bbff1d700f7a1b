//! Error types for engine operations.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NavError {
    #[error("no destination set")]
    MissingDestination,
    #[error("no position fix available yet")]
    NoPositionFix,
    #[error("route {0} has no geometry or no steps")]
    DegenerateRoute(String),
    #[error("route {0} not found among current candidates")]
    RouteNotFound(String),
    #[error("no route selected")]
    NoRouteSelected,
    #[error("invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },
    #[error("invalid navigation rules: {0}")]
    InvalidRules(String),
}
