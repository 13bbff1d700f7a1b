//! Route risk scoring against the live alert set.
//!
//! Every route vertex picks up a contribution from each alert inside the
//! influence radius, weighted by severity and falling off linearly with
//! distance. Contributions are additive and uncapped.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::geo::{distance_km, min_distance_to_polyline};
use crate::models::{Alert, GeoPoint, RiskLevel, RouteCandidate};
use crate::rules::{NavigationRules, SeverityWeights};

const MEDIUM_RISK_FROM: f64 = 5.0;
const HIGH_RISK_FROM: f64 = 15.0;

/// Outcome of scoring one path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_score: f64,
    pub alerts_on_route: Vec<Alert>,
}

/// Stateless scorer; holds only configuration.
#[derive(Debug, Clone)]
pub struct RiskScorer {
    pub weights: SeverityWeights,
    pub influence_radius_km: f64,
    pub on_route_threshold_km: f64,
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self::from_rules(&NavigationRules::default())
    }
}

impl RiskScorer {
    pub fn from_rules(rules: &NavigationRules) -> Self {
        Self {
            weights: rules.severity_weights,
            influence_radius_km: rules.influence_radius_km,
            on_route_threshold_km: rules.on_route_threshold_km,
        }
    }

    /// Score a path against a snapshot of alerts.
    pub fn score(&self, points: &[GeoPoint], alerts: &[Alert]) -> RiskAssessment {
        let radius = self.influence_radius_km;
        let mut risk_score = 0.0;

        for point in points {
            for alert in alerts {
                let d = distance_km(*point, alert.position);
                if d < radius {
                    risk_score += self.weights.weight(alert.severity) * (1.0 - d / radius);
                }
            }
        }

        let mut seen = HashSet::new();
        let alerts_on_route = alerts
            .iter()
            .filter(|alert| {
                min_distance_to_polyline(alert.position, points) < self.on_route_threshold_km
            })
            .filter(|alert| seen.insert(alert.id.clone()))
            .cloned()
            .collect();

        RiskAssessment {
            risk_score,
            alerts_on_route,
        }
    }

    /// Fill in the risk fields of a candidate.
    pub fn score_candidate(&self, candidate: &mut RouteCandidate, alerts: &[Alert]) {
        let assessment = self.score(&candidate.points, alerts);
        candidate.risk_level = risk_level(assessment.risk_score);
        candidate.risk_score = assessment.risk_score;
        candidate.alerts_on_route = assessment.alerts_on_route;
    }
}

/// Bucket a risk score for display.
pub fn risk_level(score: f64) -> RiskLevel {
    if score >= HIGH_RISK_FROM {
        RiskLevel::High
    } else if score >= MEDIUM_RISK_FROM {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertSeverity, AlertType};

    fn alert(id: &str, severity: AlertSeverity, lat: f64, lng: f64) -> Alert {
        Alert {
            id: id.to_string(),
            severity,
            alert_type: AlertType::Accident,
            position: GeoPoint::new(lat, lng),
            title: format!("alert {id}"),
            description: String::new(),
            created_at: None,
        }
    }

    fn straight_line() -> Vec<GeoPoint> {
        (0..10).map(|i| GeoPoint::new(0.0, i as f64 * 0.01)).collect()
    }

    #[test]
    fn no_alerts_means_zero_risk() {
        let result = RiskScorer::default().score(&straight_line(), &[]);
        assert_eq!(result.risk_score, 0.0);
        assert!(result.alerts_on_route.is_empty());
    }

    #[test]
    fn distant_alert_is_ignored() {
        let alerts = [alert("far", AlertSeverity::Critica, 1.0, 1.0)];
        let result = RiskScorer::default().score(&straight_line(), &alerts);
        assert_eq!(result.risk_score, 0.0);
        assert!(result.alerts_on_route.is_empty());
    }

    #[test]
    fn identical_alerts_add_up() {
        let scorer = RiskScorer::default();
        let line = straight_line();
        let one = scorer.score(&line, &[alert("a", AlertSeverity::Media, 0.0, 0.03)]);
        let two = scorer.score(
            &line,
            &[
                alert("a", AlertSeverity::Media, 0.0, 0.03),
                alert("b", AlertSeverity::Media, 0.0, 0.03),
            ],
        );
        assert!((two.risk_score - 2.0 * one.risk_score).abs() < 1e-9);
        assert_eq!(two.alerts_on_route.len(), 2);
    }

    #[test]
    fn closer_alert_scores_higher() {
        let scorer = RiskScorer::default();
        let line = vec![GeoPoint::new(0.0, 0.0)];
        let near = scorer.score(&line, &[alert("n", AlertSeverity::Alta, 0.0, 0.001)]);
        let far = scorer.score(&line, &[alert("f", AlertSeverity::Alta, 0.0, 0.003)]);
        assert!(near.risk_score > far.risk_score);
        assert!(far.risk_score > 0.0);
    }

    #[test]
    fn duplicate_ids_are_listed_once() {
        let alerts = [
            alert("dup", AlertSeverity::Baja, 0.0, 0.02),
            alert("dup", AlertSeverity::Baja, 0.0, 0.02),
        ];
        let result = RiskScorer::default().score(&straight_line(), &alerts);
        assert_eq!(result.alerts_on_route.len(), 1);
    }

    #[test]
    fn on_route_threshold_is_independent_of_influence() {
        let scorer = RiskScorer {
            on_route_threshold_km: 0.1,
            ..RiskScorer::default()
        };
        // ~0.33 km north of the first vertex: scores, but is not "on route"
        let alerts = [alert("side", AlertSeverity::Alta, 0.003, 0.0)];
        let result = scorer.score(&[GeoPoint::new(0.0, 0.0)], &alerts);
        assert!(result.risk_score > 0.0);
        assert!(result.alerts_on_route.is_empty());
    }

    #[test]
    fn risk_levels() {
        assert_eq!(risk_level(0.0), RiskLevel::Low);
        assert_eq!(risk_level(7.5), RiskLevel::Medium);
        assert_eq!(risk_level(40.0), RiskLevel::High);
    }
}
