//! Core data models for the navigation engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and inside the WGS84 range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Severity of a hazard report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertSeverity {
    Critica,
    Alta,
    Media,
    Baja,
    /// Any severity the alert feed sends that we do not know about
    #[serde(other)]
    Unknown,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Critica => "CRITICA",
            AlertSeverity::Alta => "ALTA",
            AlertSeverity::Media => "MEDIA",
            AlertSeverity::Baja => "BAJA",
            AlertSeverity::Unknown => "UNKNOWN",
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, AlertSeverity::Critica)
    }
}

/// Kind of hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Accident,
    Landslide,
    Flood,
    RoadClosure,
    Maintenance,
    #[serde(other)]
    Other,
}

/// A hazard report owned by the alert source. The engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub severity: AlertSeverity,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub position: GeoPoint,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One turn-by-turn segment of a route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Trigger point of the manoeuvre
    pub point: GeoPoint,
    pub instruction: String,
    pub distance_km: f64,
    pub duration_sec: f64,
}

/// Path geometry as returned by the routing oracle, before scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRoute {
    pub points: Vec<GeoPoint>,
    pub steps: Vec<Step>,
    pub distance_km: f64,
    pub duration_sec: f64,
}

/// A scored route candidate offered to the route picker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteCandidate {
    pub id: String,
    pub points: Vec<GeoPoint>,
    pub steps: Vec<Step>,
    pub distance_km: f64,
    pub duration_sec: f64,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    /// De-duplicated by alert id
    pub alerts_on_route: Vec<Alert>,
    pub is_recommended: bool,
}

impl RouteCandidate {
    /// Wrap an oracle route. Risk fields start neutral until scored.
    pub fn from_raw(id: impl Into<String>, raw: RawRoute) -> Self {
        Self {
            id: id.into(),
            points: raw.points,
            steps: raw.steps,
            distance_km: raw.distance_km,
            duration_sec: raw.duration_sec,
            risk_score: 0.0,
            risk_level: RiskLevel::Low,
            alerts_on_route: Vec::new(),
            is_recommended: false,
        }
    }

    /// A route with no geometry or no steps cannot be navigated.
    pub fn is_degenerate(&self) -> bool {
        self.points.is_empty() || self.steps.is_empty()
    }

    pub fn origin(&self) -> Option<GeoPoint> {
        self.points.first().copied()
    }

    pub fn destination(&self) -> Option<GeoPoint> {
        self.points.last().copied()
    }
}

/// Coarse classification of a risk score for route-picker badges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

/// How the route picker ranks candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutePreference {
    Fastest,
    Shortest,
    #[default]
    Safest,
}

/// One sample from the position source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSample {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl PositionSample {
    pub fn new(point: GeoPoint, timestamp: DateTime<Utc>) -> Self {
        Self {
            lat: point.lat,
            lng: point.lng,
            speed: None,
            heading: None,
            timestamp,
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_uses_spanish_wire_names() {
        let s: AlertSeverity = serde_json::from_str("\"CRITICA\"").unwrap();
        assert_eq!(s, AlertSeverity::Critica);
        let s: AlertSeverity = serde_json::from_str("\"EXTREMA\"").unwrap();
        assert_eq!(s, AlertSeverity::Unknown);
        assert_eq!(serde_json::to_string(&AlertSeverity::Baja).unwrap(), "\"BAJA\"");
    }

    #[test]
    fn alert_type_field_is_named_type() {
        let alert: Alert = serde_json::from_value(serde_json::json!({
            "id": "a1",
            "severity": "ALTA",
            "type": "landslide",
            "position": { "lat": 4.6, "lng": -74.1 },
            "title": "Derrumbe en la via"
        }))
        .unwrap();
        assert_eq!(alert.alert_type, AlertType::Landslide);
        assert!(alert.description.is_empty());
    }

    #[test]
    fn coordinate_validation() {
        assert!(GeoPoint::new(4.6, -74.1).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -180.5).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn empty_route_is_degenerate() {
        let route = RouteCandidate::from_raw(
            "r0",
            RawRoute {
                points: vec![GeoPoint::new(0.0, 0.0)],
                steps: Vec::new(),
                distance_km: 0.0,
                duration_sec: 0.0,
            },
        );
        assert!(route.is_degenerate());
    }
}
