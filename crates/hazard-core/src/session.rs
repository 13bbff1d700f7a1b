//! Navigation session: destination, candidate routes, active progress and
//! reroute advisories for one trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NavError;
use crate::models::{Alert, GeoPoint, PositionSample, RouteCandidate, RoutePreference};
use crate::progress::{Announcement, NavigationState, ProgressTracker};
use crate::reroute::{RerouteEvaluator, RerouteSignal};
use crate::rules::NavigationRules;

/// Ticket for one in-flight routing-oracle request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub id: u64,
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub preference: RoutePreference,
}

/// Read-only view for the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub is_navigating: bool,
    /// Increments every time navigation starts; step index and history
    /// belong to the current trip
    pub trip_id: u64,
    pub state: NavigationState,
    pub current_location: Option<GeoPoint>,
    pub destination: Option<GeoPoint>,
    pub routes: Vec<RouteCandidate>,
    pub selected_route: Option<RouteCandidate>,
    pub current_step_index: usize,
    pub route_history: Vec<GeoPoint>,
    pub speed_kmh: Option<f64>,
    pub heading_deg: Option<f64>,
    pub distance_to_step_m: Option<f64>,
    pub alerts_near_route: Vec<RerouteSignal>,
    pub needs_reroute: bool,
    pub last_fix_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NavigationSession {
    current_location: Option<PositionSample>,
    destination: Option<GeoPoint>,
    routes: Vec<RouteCandidate>,
    selected_route_id: Option<String>,
    tracker: ProgressTracker,
    reroute: RerouteEvaluator,
    alerts_near_route: Vec<RerouteSignal>,
    needs_reroute: bool,
    pending_request: Option<u64>,
    next_request_id: u64,
    trip_id: u64,
}

impl Default for NavigationSession {
    fn default() -> Self {
        Self::from_rules(&NavigationRules::default())
    }
}

impl NavigationSession {
    pub fn from_rules(rules: &NavigationRules) -> Self {
        Self {
            current_location: None,
            destination: None,
            routes: Vec::new(),
            selected_route_id: None,
            tracker: ProgressTracker::from_rules(rules),
            reroute: RerouteEvaluator::from_rules(rules),
            alerts_near_route: Vec::new(),
            needs_reroute: false,
            pending_request: None,
            next_request_id: 1,
            trip_id: 0,
        }
    }

    /// Set a new destination and issue a ticket for the routing oracle.
    ///
    /// Any active navigation and previous candidates are dropped.
    pub fn set_destination(
        &mut self,
        destination: GeoPoint,
        preference: RoutePreference,
    ) -> Result<RouteRequest, NavError> {
        let origin = self
            .current_location
            .as_ref()
            .map(PositionSample::point)
            .ok_or(NavError::NoPositionFix)?;

        if self.is_navigating() {
            tracing::info!("Destination changed while navigating; stopping current trip");
        }
        self.reset_trip();

        let id = self.next_request_id;
        self.next_request_id += 1;
        self.destination = Some(destination);
        self.pending_request = Some(id);

        Ok(RouteRequest {
            id,
            origin,
            destination,
            preference,
        })
    }

    /// Install ranked candidates for a request unless it went stale.
    pub fn accept_routes(&mut self, request: &RouteRequest, routes: Vec<RouteCandidate>) -> bool {
        if self.pending_request != Some(request.id) || self.destination != Some(request.destination)
        {
            tracing::info!(
                "Discarding stale route result for request {} ({} candidates)",
                request.id,
                routes.len()
            );
            return false;
        }

        self.pending_request = None;
        self.selected_route_id = routes
            .iter()
            .find(|r| r.is_recommended)
            .or_else(|| routes.first())
            .map(|r| r.id.clone());
        self.routes = routes;
        true
    }

    /// Pick a candidate. While navigating this ends the current trip and
    /// starts a new one on the chosen route.
    pub fn select_route(&mut self, route_id: &str) -> Result<Option<Announcement>, NavError> {
        if !self.routes.iter().any(|r| r.id == route_id) {
            return Err(NavError::RouteNotFound(route_id.to_string()));
        }
        self.selected_route_id = Some(route_id.to_string());

        if self.is_navigating() {
            return self.start_navigation().map(Some);
        }
        Ok(None)
    }

    /// Start following the selected route from the last fix.
    ///
    /// An active trip is replaced by a new one with its own step index and
    /// history.
    pub fn start_navigation(&mut self) -> Result<Announcement, NavError> {
        if self.destination.is_none() {
            return Err(NavError::MissingDestination);
        }
        let fix = self.current_location.clone().ok_or(NavError::NoPositionFix)?;
        let route = self
            .selected_route_id
            .as_deref()
            .and_then(|id| self.routes.iter().find(|r| r.id == id))
            .cloned()
            .ok_or(NavError::NoRouteSelected)?;

        let replaced = self.is_navigating();
        let first = self.tracker.start(route, &fix)?;
        if replaced {
            tracing::info!("Trip {} replaced by trip {}", self.trip_id, self.trip_id + 1);
        }
        self.trip_id += 1;
        self.clear_reroute();
        Ok(first)
    }

    /// End the trip and return to idle. The last fix is kept.
    pub fn stop_navigation(&mut self) {
        if self.is_navigating() {
            tracing::info!("Navigation stopped");
        }
        self.reset_trip();
    }

    /// Record a fix and advance progress while navigating.
    pub fn on_position(&mut self, sample: &PositionSample) -> Vec<Announcement> {
        self.current_location = Some(sample.clone());

        let announcements = self.tracker.on_position(sample);
        if self.tracker.state() == NavigationState::Arrived {
            self.reset_trip();
        }
        announcements
    }

    /// Check a newly created alert against the active route.
    pub fn on_new_alert(&mut self, alert: &Alert) -> Option<RerouteSignal> {
        if !self.is_navigating() {
            return None;
        }
        let signal = self.reroute.evaluate(self.tracker.route()?, alert)?;

        self.alerts_near_route.retain(|s| s.alert.id != signal.alert.id);
        self.alerts_near_route.push(signal.clone());
        self.needs_reroute = true;
        Some(signal)
    }

    /// Acknowledge the reroute prompt without changing route.
    pub fn dismiss_reroute(&mut self) {
        self.needs_reroute = false;
    }

    pub fn is_navigating(&self) -> bool {
        self.tracker.state() == NavigationState::Navigating
    }

    pub fn needs_reroute(&self) -> bool {
        self.needs_reroute
    }

    pub fn alerts_near_route(&self) -> &[RerouteSignal] {
        &self.alerts_near_route
    }

    pub fn current_location(&self) -> Option<GeoPoint> {
        self.current_location.as_ref().map(PositionSample::point)
    }

    pub fn destination(&self) -> Option<GeoPoint> {
        self.destination
    }

    pub fn routes(&self) -> &[RouteCandidate] {
        &self.routes
    }

    pub fn selected_route(&self) -> Option<&RouteCandidate> {
        self.tracker.route().or_else(|| {
            self.selected_route_id
                .as_deref()
                .and_then(|id| self.routes.iter().find(|r| r.id == id))
        })
    }

    pub fn trip_id(&self) -> u64 {
        self.trip_id
    }

    pub fn current_step_index(&self) -> usize {
        self.tracker.current_step_index()
    }

    pub fn route_history(&self) -> &[GeoPoint] {
        self.tracker.route_history()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            is_navigating: self.is_navigating(),
            trip_id: self.trip_id,
            state: self.tracker.state(),
            current_location: self.current_location(),
            destination: self.destination,
            routes: self.routes.clone(),
            selected_route: self.selected_route().cloned(),
            current_step_index: self.tracker.current_step_index(),
            route_history: self.tracker.route_history().to_vec(),
            speed_kmh: self.tracker.speed_kmh(),
            heading_deg: self.tracker.heading_deg(),
            distance_to_step_m: self.tracker.distance_to_step_km().map(|d| d * 1000.0),
            alerts_near_route: self.alerts_near_route.clone(),
            needs_reroute: self.needs_reroute,
            last_fix_at: self.current_location.as_ref().map(|s| s.timestamp),
        }
    }

    fn clear_reroute(&mut self) {
        self.alerts_near_route.clear();
        self.needs_reroute = false;
    }

    fn reset_trip(&mut self) {
        self.tracker.stop();
        self.clear_reroute();
        self.destination = None;
        self.routes.clear();
        self.selected_route_id = None;
        self.pending_request = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertSeverity, AlertType, RawRoute, Step};

    fn fix(lat: f64, lng: f64) -> PositionSample {
        PositionSample::new(GeoPoint::new(lat, lng), Utc::now())
    }

    fn candidate(id: &str, end: GeoPoint, recommended: bool) -> RouteCandidate {
        let mut route = RouteCandidate::from_raw(
            id,
            RawRoute {
                points: vec![GeoPoint::new(0.0, 0.0), end],
                steps: vec![
                    Step {
                        point: GeoPoint::new(0.0, 0.0),
                        instruction: "Head east".to_string(),
                        distance_km: 1.1,
                        duration_sec: 80.0,
                    },
                    Step {
                        point: end,
                        instruction: "Arrive".to_string(),
                        distance_km: 0.0,
                        duration_sec: 0.0,
                    },
                ],
                distance_km: 1.1,
                duration_sec: 80.0,
            },
        );
        route.is_recommended = recommended;
        route
    }

    #[test]
    fn destination_requires_a_fix() {
        let mut session = NavigationSession::default();
        assert_eq!(
            session.set_destination(GeoPoint::new(0.0, 0.01), RoutePreference::Safest),
            Err(NavError::NoPositionFix)
        );
    }

    #[test]
    fn stale_route_results_are_discarded() {
        let mut session = NavigationSession::default();
        session.on_position(&fix(0.0, 0.0));
        let first = session
            .set_destination(GeoPoint::new(0.0, 0.01), RoutePreference::Safest)
            .unwrap();
        let second = session
            .set_destination(GeoPoint::new(0.0, 0.02), RoutePreference::Safest)
            .unwrap();

        let end = GeoPoint::new(0.0, 0.01);
        assert!(!session.accept_routes(&first, vec![candidate("old", end, true)]));
        assert!(session.routes().is_empty());

        let end = GeoPoint::new(0.0, 0.02);
        assert!(session.accept_routes(&second, vec![candidate("new", end, true)]));
        assert_eq!(session.selected_route().map(|r| r.id.as_str()), Some("new"));
    }

    #[test]
    fn start_requires_destination_and_route() {
        let mut session = NavigationSession::default();
        session.on_position(&fix(0.0, 0.0));
        assert_eq!(session.start_navigation().unwrap_err(), NavError::MissingDestination);

        let request = session
            .set_destination(GeoPoint::new(0.0, 0.01), RoutePreference::Safest)
            .unwrap();
        assert_eq!(session.start_navigation().unwrap_err(), NavError::NoRouteSelected);

        session.accept_routes(&request, vec![candidate("a", GeoPoint::new(0.0, 0.01), true)]);
        let first = session.start_navigation().unwrap();
        assert_eq!(first.text, "Head east");
        assert!(session.is_navigating());
    }

    #[test]
    fn unknown_route_cannot_be_selected() {
        let mut session = NavigationSession::default();
        assert_eq!(
            session.select_route("nope").unwrap_err(),
            NavError::RouteNotFound("nope".to_string())
        );
    }

    #[test]
    fn arrival_returns_to_idle() {
        let end = GeoPoint::new(0.0, 0.01);
        let mut session = NavigationSession::default();
        session.on_position(&fix(0.0, 0.0));
        let request = session.set_destination(end, RoutePreference::Safest).unwrap();
        session.accept_routes(&request, vec![candidate("a", end, true)]);
        session.start_navigation().unwrap();

        session.on_position(&fix(0.0, 0.0));
        assert_eq!(session.current_step_index(), 1);
        let out = session.on_position(&fix(end.lat, end.lng));
        assert_eq!(out.last().map(|a| a.kind), Some(crate::progress::AnnouncementKind::Arrived));
        assert!(!session.is_navigating());
        assert!(session.destination().is_none());
        assert_eq!(session.current_location(), Some(end));
    }

    #[test]
    fn new_critical_alert_near_route_requests_reroute() {
        let end = GeoPoint::new(0.0, 0.01);
        let mut session = NavigationSession::default();
        let alert = Alert {
            id: "x".to_string(),
            severity: AlertSeverity::Critica,
            alert_type: AlertType::Accident,
            position: end,
            title: "Crash".to_string(),
            description: String::new(),
            created_at: None,
        };
        session.on_position(&fix(0.0, 0.0));
        assert!(session.on_new_alert(&alert).is_none());

        let request = session.set_destination(end, RoutePreference::Safest).unwrap();
        session.accept_routes(&request, vec![candidate("a", end, true)]);
        session.start_navigation().unwrap();

        assert!(session.on_new_alert(&alert).is_some());
        assert!(session.on_new_alert(&alert).is_some());
        assert!(session.needs_reroute());
        assert_eq!(session.alerts_near_route().len(), 1);

        session.dismiss_reroute();
        assert!(!session.needs_reroute());
        session.stop_navigation();
        assert!(session.alerts_near_route().is_empty());
    }
    #[test]
    fn switching_routes_mid_trip_starts_a_new_trip() {
        let end = GeoPoint::new(0.0, 0.01);
        let mut session = NavigationSession::default();
        session.on_position(&fix(0.0, 0.0));
        let request = session.set_destination(end, RoutePreference::Safest).unwrap();
        session.accept_routes(
            &request,
            vec![candidate("r1", end, true), candidate("r2", end, false)],
        );
        session.start_navigation().unwrap();
        session.on_position(&fix(0.0, 0.0));
        session.on_position(&fix(0.0, 0.002));

        let before = session.snapshot();
        assert_eq!(before.trip_id, 1);
        assert_eq!(before.current_step_index, 1);
        assert_eq!(before.route_history.len(), 3);

        let first = session.select_route("r2").unwrap();
        assert_eq!(first.map(|a| a.step_index), Some(0));

        let after = session.snapshot();
        assert!(after.is_navigating);
        assert_eq!(after.selected_route.map(|r| r.id), Some("r2".to_string()));
        assert_eq!(after.trip_id, 2);
        assert_eq!(after.current_step_index, 0);
        assert_eq!(after.route_history, vec![GeoPoint::new(0.0, 0.002)]);

        // Within the new trip the index only moves forward again
        session.on_position(&fix(0.0, 0.0));
        assert_eq!(session.current_step_index(), 1);
        assert_eq!(session.trip_id(), 2);
        assert_eq!(session.route_history().len(), 2);
    }

    #[test]
    fn selecting_while_idle_keeps_the_trip_counter() {
        let end = GeoPoint::new(0.0, 0.01);
        let mut session = NavigationSession::default();
        session.on_position(&fix(0.0, 0.0));
        let request = session.set_destination(end, RoutePreference::Safest).unwrap();
        session.accept_routes(
            &request,
            vec![candidate("r1", end, true), candidate("r2", end, false)],
        );
        assert!(session.select_route("r2").unwrap().is_none());
        assert_eq!(session.trip_id(), 0);
    }
}
