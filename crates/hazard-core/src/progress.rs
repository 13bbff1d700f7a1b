//! Turn-by-turn progress along the selected route.
//!
//! State machine: `Idle -> Navigating -> Arrived`. While navigating, each fix
//! is compared against the current step's trigger point. Two announcements
//! precede every step (far and near) and reaching the trigger point advances
//! exactly one step per fix.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NavError;
use crate::geo::{bearing_degrees, distance_km};
use crate::models::{GeoPoint, PositionSample, RouteCandidate};
use crate::rules::NavigationRules;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationState {
    #[default]
    Idle,
    Navigating,
    Arrived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncementKind {
    /// First instruction when navigation starts
    Start,
    /// Far threshold ("300 m ahead")
    Approaching,
    /// Near threshold ("50 m ahead")
    Imminent,
    /// Previous step reached, this is the next one
    NextStep,
    Arrived,
}

/// A spoken/displayed turn instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub step_index: usize,
    pub kind: AnnouncementKind,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ProgressTracker {
    announce_far_km: f64,
    announce_near_km: f64,
    step_arrival_km: f64,
    state: NavigationState,
    route: Option<RouteCandidate>,
    current_step_index: usize,
    // Step index at which each threshold last fired
    far_announced_at: Option<usize>,
    near_announced_at: Option<usize>,
    last_fix: Option<(GeoPoint, DateTime<Utc>)>,
    speed_kmh: Option<f64>,
    heading_deg: Option<f64>,
    distance_to_step_km: Option<f64>,
    route_history: Vec<GeoPoint>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::from_rules(&NavigationRules::default())
    }
}

impl ProgressTracker {
    pub fn from_rules(rules: &NavigationRules) -> Self {
        Self {
            announce_far_km: rules.announce_far_km,
            announce_near_km: rules.announce_near_km,
            step_arrival_km: rules.step_arrival_km,
            state: NavigationState::Idle,
            route: None,
            current_step_index: 0,
            far_announced_at: None,
            near_announced_at: None,
            last_fix: None,
            speed_kmh: None,
            heading_deg: None,
            distance_to_step_km: None,
            route_history: Vec::new(),
        }
    }

    /// Begin following `route` from an initial fix.
    pub fn start(
        &mut self,
        route: RouteCandidate,
        fix: &PositionSample,
    ) -> Result<Announcement, NavError> {
        if route.is_degenerate() {
            return Err(NavError::DegenerateRoute(route.id));
        }

        self.stop();
        let point = fix.point();
        let first = &route.steps[0];
        let announcement = Announcement {
            step_index: 0,
            kind: AnnouncementKind::Start,
            text: first.instruction.clone(),
            distance_m: Some(distance_km(point, first.point) * 1000.0),
        };

        tracing::info!(
            "Navigation started on route {} ({} steps, {:.2} km)",
            route.id,
            route.steps.len(),
            route.distance_km
        );
        self.route_history.push(point);
        self.last_fix = Some((point, fix.timestamp));
        self.route = Some(route);
        self.state = NavigationState::Navigating;
        Ok(announcement)
    }

    /// Return to `Idle`, dropping the route and per-step memory.
    pub fn stop(&mut self) {
        self.state = NavigationState::Idle;
        self.route = None;
        self.current_step_index = 0;
        self.far_announced_at = None;
        self.near_announced_at = None;
        self.last_fix = None;
        self.speed_kmh = None;
        self.heading_deg = None;
        self.distance_to_step_km = None;
        self.route_history.clear();
    }

    /// Process one fix. Returns the announcements it triggered.
    pub fn on_position(&mut self, sample: &PositionSample) -> Vec<Announcement> {
        if self.state != NavigationState::Navigating {
            return Vec::new();
        }
        let Some(step_count) = self.route.as_ref().map(|r| r.steps.len()) else {
            return Vec::new();
        };

        let p = sample.point();
        self.route_history.push(p);
        self.update_telemetry(p, sample);

        let idx = self.current_step_index;
        let Some(step) = self.route.as_ref().and_then(|r| r.steps.get(idx)) else {
            return Vec::new();
        };
        let d = distance_km(p, step.point);
        self.distance_to_step_km = Some(d);

        let mut announcements = Vec::new();

        if d <= self.step_arrival_km {
            self.current_step_index = idx + 1;
            self.far_announced_at = None;
            self.near_announced_at = None;

            let next = self.current_step_index;
            if next < step_count {
                let next_step = self.route.as_ref().map(|r| &r.steps[next]);
                if let Some(next_step) = next_step {
                    tracing::debug!("Reached step {}, now on step {}", idx, next);
                    self.distance_to_step_km = Some(distance_km(p, next_step.point));
                    announcements.push(Announcement {
                        step_index: next,
                        kind: AnnouncementKind::NextStep,
                        text: next_step.instruction.clone(),
                        distance_m: Some(next_step.distance_km * 1000.0),
                    });
                }
            } else {
                tracing::info!("Arrived at destination");
                self.state = NavigationState::Arrived;
                self.distance_to_step_km = None;
                announcements.push(Announcement {
                    step_index: next,
                    kind: AnnouncementKind::Arrived,
                    text: "You have arrived at your destination".to_string(),
                    distance_m: None,
                });
            }
        } else if d <= self.announce_near_km {
            if self.near_announced_at != Some(idx) {
                self.near_announced_at = Some(idx);
                announcements.push(Announcement {
                    step_index: idx,
                    kind: AnnouncementKind::Imminent,
                    text: ahead_text(self.announce_near_km, &step.instruction),
                    distance_m: Some(d * 1000.0),
                });
            }
        } else if d <= self.announce_far_km && self.far_announced_at != Some(idx) {
            self.far_announced_at = Some(idx);
            announcements.push(Announcement {
                step_index: idx,
                kind: AnnouncementKind::Approaching,
                text: ahead_text(self.announce_far_km, &step.instruction),
                distance_m: Some(d * 1000.0),
            });
        }

        announcements
    }

    fn update_telemetry(&mut self, p: GeoPoint, sample: &PositionSample) {
        if let Some((prev, prev_ts)) = self.last_fix {
            let dt_s = (sample.timestamp - prev_ts).num_milliseconds() as f64 / 1000.0;
            let moved_km = distance_km(prev, p);
            if dt_s > 0.0 {
                self.speed_kmh = Some(moved_km / dt_s * 3600.0);
            } else if let Some(speed_mps) = sample.speed {
                self.speed_kmh = Some(speed_mps * 3.6);
            }
            if moved_km > 0.0 {
                self.heading_deg = Some(bearing_degrees(prev, p));
            }
        }
        if let Some(heading) = sample.heading {
            self.heading_deg = Some(heading);
        }
        self.last_fix = Some((p, sample.timestamp));
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    pub fn route(&self) -> Option<&RouteCandidate> {
        self.route.as_ref()
    }

    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    /// Speed derived from the last two fixes, km/h. Advisory only.
    pub fn speed_kmh(&self) -> Option<f64> {
        self.speed_kmh
    }

    pub fn heading_deg(&self) -> Option<f64> {
        self.heading_deg
    }

    pub fn distance_to_step_km(&self) -> Option<f64> {
        self.distance_to_step_km
    }

    pub fn route_history(&self) -> &[GeoPoint] {
        &self.route_history
    }
}

fn ahead_text(threshold_km: f64, instruction: &str) -> String {
    format!("In {:.0} m, {}", threshold_km * 1000.0, instruction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::destination_point;
    use crate::models::{RawRoute, Step};
    use chrono::Duration;

    fn step(point: GeoPoint, instruction: &str) -> Step {
        Step {
            point,
            instruction: instruction.to_string(),
            distance_km: 0.5,
            duration_sec: 60.0,
        }
    }

    fn route(steps: Vec<Step>) -> RouteCandidate {
        RouteCandidate::from_raw(
            "r",
            RawRoute {
                points: steps.iter().map(|s| s.point).collect(),
                steps,
                distance_km: 1.0,
                duration_sec: 120.0,
            },
        )
    }

    fn at(point: GeoPoint, secs: i64) -> PositionSample {
        let base = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        PositionSample::new(point, base + Duration::seconds(secs))
    }

    #[test]
    fn far_and_near_announce_once_per_step() {
        let turn = GeoPoint::new(0.0, 0.01);
        let mut tracker = ProgressTracker::default();
        let start = destination_point(turn, 1000.0, 270.0);
        tracker
            .start(route(vec![step(turn, "Turn left"), step(GeoPoint::new(0.0, 0.02), "Arrive")]), &at(start, 0))
            .unwrap();

        let mut far = 0;
        let mut near = 0;
        // approach from the west, lingering around each threshold
        for (i, dist) in [250.0, 200.0, 280.0, 150.0, 45.0, 40.0, 60.0, 30.0].iter().enumerate() {
            let p = destination_point(turn, *dist, 270.0);
            for a in tracker.on_position(&at(p, i as i64 + 1)) {
                match a.kind {
                    AnnouncementKind::Approaching => far += 1,
                    AnnouncementKind::Imminent => near += 1,
                    other => panic!("unexpected {other:?}"),
                }
            }
        }
        assert_eq!((far, near), (1, 1));
        assert_eq!(tracker.current_step_index(), 0);
    }

    #[test]
    fn reaching_last_step_arrives() {
        let end = GeoPoint::new(0.0, 0.0);
        let mut tracker = ProgressTracker::default();
        tracker.start(route(vec![step(end, "Arrive")]), &at(end, 0)).unwrap();

        let out = tracker.on_position(&at(end, 1));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, AnnouncementKind::Arrived);
        assert_eq!(tracker.state(), NavigationState::Arrived);
        assert_eq!(tracker.current_step_index(), 1);
        assert!(tracker.on_position(&at(end, 2)).is_empty());
    }

    #[test]
    fn one_step_per_fix_even_after_a_jump() {
        let here = GeoPoint::new(0.0, 0.0);
        let mut tracker = ProgressTracker::default();
        tracker
            .start(route(vec![step(here, "Depart"), step(here, "Turn right"), step(here, "Arrive")]), &at(here, 0))
            .unwrap();

        tracker.on_position(&at(here, 1));
        assert_eq!(tracker.current_step_index(), 1);
        tracker.on_position(&at(here, 2));
        assert_eq!(tracker.current_step_index(), 2);
    }

    #[test]
    fn speed_from_consecutive_fixes() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = destination_point(a, 100.0, 90.0);
        let mut tracker = ProgressTracker::default();
        let far_step = destination_point(a, 5000.0, 90.0);
        tracker.start(route(vec![step(far_step, "Arrive")]), &at(a, 0)).unwrap();
        tracker.on_position(&at(b, 10));

        let speed = tracker.speed_kmh().unwrap();
        assert!((speed - 36.0).abs() < 0.1, "speed {speed}");
        assert!((tracker.heading_deg().unwrap() - 90.0).abs() < 0.1);
        assert_eq!(tracker.route_history().len(), 2);
    }

    #[test]
    fn stop_clears_state() {
        let here = GeoPoint::new(0.0, 0.0);
        let mut tracker = ProgressTracker::default();
        tracker
            .start(route(vec![step(here, "Depart"), step(GeoPoint::new(1.0, 1.0), "Arrive")]), &at(here, 0))
            .unwrap();
        tracker.on_position(&at(here, 1));
        tracker.stop();

        assert_eq!(tracker.state(), NavigationState::Idle);
        assert_eq!(tracker.current_step_index(), 0);
        assert!(tracker.route().is_none());
        assert!(tracker.route_history().is_empty());
        assert!(tracker.on_position(&at(here, 2)).is_empty());
    }

    #[test]
    fn degenerate_route_is_rejected() {
        let mut tracker = ProgressTracker::default();
        let err = tracker
            .start(route(Vec::new()), &at(GeoPoint::new(0.0, 0.0), 0))
            .unwrap_err();
        assert_eq!(err, NavError::DegenerateRoute("r".to_string()));
        assert_eq!(tracker.state(), NavigationState::Idle);
    }
}
