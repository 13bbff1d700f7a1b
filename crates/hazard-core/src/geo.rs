//! Spherical geometry for route scoring, geofencing and progress tracking.

use crate::models::GeoPoint;

/// Mean Earth radius used by every distance computation.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometres (haversine).
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lng - a.lng).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Great-circle distance in metres.
pub fn distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    distance_km(a, b) * 1000.0
}

/// Forward azimuth from `a` to `b`, degrees in [0, 360).
pub fn bearing_degrees(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let delta_lambda = (b.lng - a.lng).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    let deg = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if deg >= 360.0 { 0.0 } else { deg }
}

/// Minimum distance (km) from `p` to any vertex of `line`.
///
/// Vertex approximation only; segments are not projected onto. Risk and
/// reroute thresholds are calibrated against this behaviour.
/// Returns `f64::INFINITY` for an empty line.
pub fn min_distance_to_polyline(p: GeoPoint, line: &[GeoPoint]) -> f64 {
    line.iter()
        .map(|v| distance_km(p, *v))
        .fold(f64::INFINITY, f64::min)
}

/// Point reached by travelling `distance_m` from `origin` along `bearing_deg`.
pub fn destination_point(origin: GeoPoint, distance_m: f64, bearing_deg: f64) -> GeoPoint {
    let angular = distance_m / (EARTH_RADIUS_KM * 1000.0);
    let theta = bearing_deg.to_radians();
    let phi1 = origin.lat.to_radians();
    let lambda1 = origin.lng.to_radians();

    let phi2 = (phi1.sin() * angular.cos() + phi1.cos() * angular.sin() * theta.cos()).asin();
    let lambda2 = lambda1
        + (theta.sin() * angular.sin() * phi1.cos()).atan2(angular.cos() - phi1.sin() * phi2.sin());

    GeoPoint::new(
        phi2.to_degrees(),
        (lambda2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0,
    )
}
