//! OSRM `/route/v1` response model and conversion into engine routes.

use anyhow::{anyhow, Result};
use hazard_core::models::{GeoPoint, RawRoute, Step};
use serde::Deserialize;

use crate::instructions::instruction_text;

#[derive(Debug, Deserialize)]
pub struct OsrmResponse {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
pub struct OsrmRoute {
    /// Metres
    pub distance: f64,
    /// Seconds
    pub duration: f64,
    pub geometry: OsrmGeometry,
    #[serde(default)]
    pub legs: Vec<OsrmLeg>,
}

/// GeoJSON LineString; coordinates are `[lng, lat]`.
#[derive(Debug, Deserialize)]
pub struct OsrmGeometry {
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
pub struct OsrmLeg {
    #[serde(default)]
    pub steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
pub struct OsrmStep {
    pub distance: f64,
    pub duration: f64,
    #[serde(default)]
    pub name: String,
    pub maneuver: OsrmManeuver,
}

#[derive(Debug, Deserialize)]
pub struct OsrmManeuver {
    /// `[lng, lat]`
    pub location: [f64; 2],
    #[serde(rename = "type")]
    pub maneuver_type: String,
    #[serde(default)]
    pub modifier: Option<String>,
    #[serde(default)]
    pub exit: Option<u32>,
}

/// Convert an OSRM response into raw routes.
///
/// Routes without geometry or steps are skipped; the selector would reject
/// them anyway.
pub fn parse_routes(response: OsrmResponse) -> Result<Vec<RawRoute>> {
    if response.code != "Ok" {
        return Err(anyhow!(
            "Routing oracle returned {}: {}",
            response.code,
            response.message.unwrap_or_default()
        ));
    }

    let routes = response
        .routes
        .into_iter()
        .filter_map(|route| {
            let raw = convert_route(route);
            if raw.points.is_empty() || raw.steps.is_empty() {
                tracing::warn!("Skipping oracle route without geometry or steps");
                None
            } else {
                Some(raw)
            }
        })
        .collect();

    Ok(routes)
}

fn convert_route(route: OsrmRoute) -> RawRoute {
    let points = route
        .geometry
        .coordinates
        .iter()
        .map(|[lng, lat]| GeoPoint::new(*lat, *lng))
        .collect();

    let steps = route
        .legs
        .into_iter()
        .flat_map(|leg| leg.steps)
        .map(|step| {
            let [lng, lat] = step.maneuver.location;
            Step {
                point: GeoPoint::new(lat, lng),
                instruction: instruction_text(
                    &step.maneuver.maneuver_type,
                    step.maneuver.modifier.as_deref(),
                    &step.name,
                    step.maneuver.exit,
                ),
                distance_km: step.distance / 1000.0,
                duration_sec: step.duration,
            }
        })
        .collect();

    RawRoute {
        points,
        steps,
        distance_km: route.distance / 1000.0,
        duration_sec: route.duration,
    }
}
