//! Detection of new critical alerts on the active route.

use serde::{Deserialize, Serialize};

use crate::geo::min_distance_to_polyline;
use crate::models::{Alert, RouteCandidate};
use crate::rules::NavigationRules;

/// Advisory: a new critical alert sits close to the active route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerouteSignal {
    pub route_id: String,
    pub alert: Alert,
    pub distance_km: f64,
}

#[derive(Debug, Clone)]
pub struct RerouteEvaluator {
    pub threshold_km: f64,
}

impl Default for RerouteEvaluator {
    fn default() -> Self {
        Self::from_rules(&NavigationRules::default())
    }
}

impl RerouteEvaluator {
    pub fn from_rules(rules: &NavigationRules) -> Self {
        Self {
            threshold_km: rules.reroute_threshold_km,
        }
    }

    /// Check one newly created alert against the active route.
    pub fn evaluate(&self, route: &RouteCandidate, alert: &Alert) -> Option<RerouteSignal> {
        if !alert.severity.is_critical() {
            return None;
        }
        let distance_km = min_distance_to_polyline(alert.position, &route.points);
        if distance_km > self.threshold_km {
            return None;
        }

        tracing::warn!(
            "Critical alert {} is {:.0} m from active route {}",
            alert.id,
            distance_km * 1000.0,
            route.id
        );
        Some(RerouteSignal {
            route_id: route.id.clone(),
            alert: alert.clone(),
            distance_km,
        })
    }
}
