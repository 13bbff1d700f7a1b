//! Ranking of scored route candidates by user preference.

use crate::geo::min_distance_to_polyline;
use crate::models::{Alert, RouteCandidate, RoutePreference};
use crate::rules::NavigationRules;

#[derive(Debug, Clone)]
pub struct RouteSelector {
    /// Drop candidates passing near a CRITICA alert (fail-open)
    pub avoid_critical_alerts: bool,
    pub critical_avoidance_radius_km: f64,
}

impl Default for RouteSelector {
    fn default() -> Self {
        Self::from_rules(&NavigationRules::default())
    }
}

impl RouteSelector {
    pub fn from_rules(rules: &NavigationRules) -> Self {
        Self {
            avoid_critical_alerts: rules.avoid_critical_alerts,
            critical_avoidance_radius_km: rules.critical_avoidance_radius_km,
        }
    }

    /// Order candidates by preference and flag the first as recommended.
    ///
    /// Degenerate candidates are dropped. Ties keep the oracle's order.
    pub fn select(
        &self,
        candidates: Vec<RouteCandidate>,
        preference: RoutePreference,
        alerts: &[Alert],
    ) -> Vec<RouteCandidate> {
        let mut pool: Vec<RouteCandidate> = candidates
            .into_iter()
            .filter(|candidate| {
                if candidate.is_degenerate() {
                    tracing::warn!("Rejecting degenerate route candidate {}", candidate.id);
                    false
                } else {
                    true
                }
            })
            .collect();

        if self.avoid_critical_alerts {
            pool = self.filter_critical(pool, alerts);
        }

        match preference {
            RoutePreference::Fastest => {
                pool.sort_by(|a, b| a.duration_sec.total_cmp(&b.duration_sec))
            }
            RoutePreference::Shortest => {
                pool.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km))
            }
            RoutePreference::Safest => pool.sort_by(|a, b| a.risk_score.total_cmp(&b.risk_score)),
        }

        for (idx, candidate) in pool.iter_mut().enumerate() {
            candidate.is_recommended = idx == 0;
        }

        pool
    }

    fn filter_critical(
        &self,
        pool: Vec<RouteCandidate>,
        alerts: &[Alert],
    ) -> Vec<RouteCandidate> {
        let critical: Vec<&Alert> = alerts.iter().filter(|a| a.severity.is_critical()).collect();
        if critical.is_empty() {
            return pool;
        }

        let (clear, blocked): (Vec<_>, Vec<_>) = pool.into_iter().partition(|candidate| {
            critical.iter().all(|alert| {
                min_distance_to_polyline(alert.position, &candidate.points)
                    > self.critical_avoidance_radius_km
            })
        });

        if clear.is_empty() {
            tracing::warn!(
                "Every candidate passes a critical alert; keeping all {} routes",
                blocked.len()
            );
            return blocked;
        }

        if !blocked.is_empty() {
            tracing::info!(
                "Filtered {} candidate(s) near critical alerts",
                blocked.len()
            );
        }
        clear
    }
}
