//! Tunable thresholds and weights for the navigation engine.

use serde::{Deserialize, Serialize};

use crate::error::NavError;
use crate::models::AlertSeverity;

/// Per-severity multipliers used when accumulating route risk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityWeights {
    pub critica: f64,
    pub alta: f64,
    pub media: f64,
    pub baja: f64,
}

impl SeverityWeights {
    /// Weights used for live navigation.
    pub const STANDARD: SeverityWeights = SeverityWeights {
        critica: 10.0,
        alta: 5.0,
        media: 2.0,
        baja: 1.0,
    };

    /// Weights used when planning trips ahead of time.
    pub const PLANNING: SeverityWeights = SeverityWeights {
        critica: 10.0,
        alta: 6.0,
        media: 3.0,
        baja: 1.0,
    };

    pub fn weight(&self, severity: AlertSeverity) -> f64 {
        match severity {
            AlertSeverity::Critica => self.critica,
            AlertSeverity::Alta => self.alta,
            AlertSeverity::Media | AlertSeverity::Unknown => self.media,
            AlertSeverity::Baja => self.baja,
        }
    }
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Geofence radius per severity, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneRadii {
    pub critica_m: f64,
    pub alta_m: f64,
    pub media_m: f64,
    pub baja_m: f64,
    /// Used for severities we do not recognise
    pub fallback_m: f64,
}

impl ZoneRadii {
    pub fn radius_m(&self, severity: AlertSeverity) -> f64 {
        match severity {
            AlertSeverity::Critica => self.critica_m,
            AlertSeverity::Alta => self.alta_m,
            AlertSeverity::Media => self.media_m,
            AlertSeverity::Baja => self.baja_m,
            AlertSeverity::Unknown => self.fallback_m,
        }
    }
}

impl Default for ZoneRadii {
    fn default() -> Self {
        Self {
            critica_m: 1000.0,
            alta_m: 750.0,
            media_m: 500.0,
            baja_m: 250.0,
            fallback_m: 500.0,
        }
    }
}

/// Configuration shared by every engine component.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationRules {
    /// Radius within which an alert adds to a route's risk score
    pub influence_radius_km: f64,
    /// Radius within which an alert is listed as "on route"
    pub on_route_threshold_km: f64,
    pub severity_weights: SeverityWeights,
    /// Drop candidates passing close to a CRITICA alert before ranking
    pub avoid_critical_alerts: bool,
    pub critical_avoidance_radius_km: f64,
    /// A new CRITICA alert this close to the active route asks for a reroute
    pub reroute_threshold_km: f64,
    /// First turn announcement ("300 m ahead")
    pub announce_far_km: f64,
    /// Second turn announcement ("50 m ahead")
    pub announce_near_km: f64,
    /// Distance at which a step counts as reached
    pub step_arrival_km: f64,
    pub zone_radii: ZoneRadii,
    /// Default radius for nearby-alert queries
    pub nearby_radius_m: f64,
}

impl Default for NavigationRules {
    fn default() -> Self {
        Self {
            influence_radius_km: 0.5,
            on_route_threshold_km: 0.5,
            severity_weights: SeverityWeights::STANDARD,
            avoid_critical_alerts: false,
            critical_avoidance_radius_km: 0.3,
            reroute_threshold_km: 0.3,
            announce_far_km: 0.3,
            announce_near_km: 0.05,
            step_arrival_km: 0.02,
            zone_radii: ZoneRadii::default(),
            nearby_radius_m: 2000.0,
        }
    }
}

impl NavigationRules {
    /// Rules with the trip-planning weight table.
    pub fn planning() -> Self {
        Self {
            severity_weights: SeverityWeights::PLANNING,
            ..Self::default()
        }
    }

    /// Validate rules configuration.
    /// Returns list of validation errors (empty = valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let w = &self.severity_weights;

        if !(w.critica > w.alta && w.alta > w.media && w.media > w.baja && w.baja >= 0.0) {
            errors.push(format!(
                "Severity weights must satisfy CRITICA > ALTA > MEDIA > BAJA >= 0 (got {} / {} / {} / {})",
                w.critica, w.alta, w.media, w.baja
            ));
        }

        for (name, value) in [
            ("influence_radius_km", self.influence_radius_km),
            ("on_route_threshold_km", self.on_route_threshold_km),
            ("critical_avoidance_radius_km", self.critical_avoidance_radius_km),
            ("reroute_threshold_km", self.reroute_threshold_km),
            ("step_arrival_km", self.step_arrival_km),
            ("nearby_radius_m", self.nearby_radius_m),
        ] {
            if !(value.is_finite() && value > 0.0) {
                errors.push(format!("{name} must be a positive number (got {value})"));
            }
        }

        if !(self.step_arrival_km < self.announce_near_km
            && self.announce_near_km < self.announce_far_km)
        {
            errors.push(format!(
                "Announcement thresholds must satisfy step_arrival_km < announce_near_km < announce_far_km (got {} / {} / {})",
                self.step_arrival_km, self.announce_near_km, self.announce_far_km
            ));
        }

        let r = &self.zone_radii;
        if [r.critica_m, r.alta_m, r.media_m, r.baja_m, r.fallback_m]
            .iter()
            .any(|radius| !(radius.is_finite() && *radius > 0.0))
        {
            errors.push("Geofence radii must be positive".to_string());
        }

        errors
    }

    /// Validate and convert the error list into a `NavError`.
    pub fn ensure_valid(&self) -> Result<(), NavError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(NavError::InvalidRules(errors.join("; ")))
        }
    }
}
