//! Single-threaded engine wiring scoring, selection, geofencing, progress
//! and reroute detection behind one event bus.
//!
//! Callers feed it position fixes, alert snapshots and oracle results one at
//! a time; every resulting event is published on the bus before the call
//! returns.

use serde::{Deserialize, Serialize};

use crate::error::NavError;
use crate::events::{EventBus, NavEvent, StatusEvent};
use crate::geofence::{GeofenceMonitor, GeofenceZone, NearbyAlert, Transition, ZoneEvent};
use crate::models::{
    Alert, GeoPoint, PositionSample, RawRoute, RouteCandidate, RoutePreference,
};
use crate::progress::Announcement;
use crate::risk::RiskScorer;
use crate::rules::NavigationRules;
use crate::selector::RouteSelector;
use crate::session::{NavigationSession, RouteRequest, SessionSnapshot};

/// Everything the presentation layer renders, captured after one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub session: SessionSnapshot,
    pub geofencing_active: bool,
    pub entered_zones: Vec<GeofenceZone>,
    pub location_available: bool,
}

#[derive(Debug)]
pub struct NavigationEngine {
    rules: NavigationRules,
    scorer: RiskScorer,
    selector: RouteSelector,
    monitor: GeofenceMonitor,
    session: NavigationSession,
    bus: EventBus,
    location_available: bool,
}

impl NavigationEngine {
    pub fn new(rules: NavigationRules) -> Result<Self, NavError> {
        rules.ensure_valid()?;
        Ok(Self {
            scorer: RiskScorer::from_rules(&rules),
            selector: RouteSelector::from_rules(&rules),
            monitor: GeofenceMonitor::new(rules.zone_radii),
            session: NavigationSession::from_rules(&rules),
            bus: EventBus::new(),
            location_available: true,
            rules,
        })
    }

    pub fn rules(&self) -> &NavigationRules {
        &self.rules
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn session(&self) -> &NavigationSession {
        &self.session
    }

    /// Process one fix from the position source.
    pub fn on_position(&mut self, sample: &PositionSample) -> Result<(), NavError> {
        let point = sample.point();
        if !point.is_valid() {
            return Err(NavError::InvalidCoordinate {
                lat: sample.lat,
                lng: sample.lng,
            });
        }

        if !self.location_available {
            self.location_available = true;
            self.publish(NavEvent::Status(StatusEvent::LocationRestored));
        }

        let transitions = self.monitor.on_position(point);
        self.publish_transitions(transitions);

        let announcements = self.session.on_position(sample);
        self.publish_announcements(announcements);
        Ok(())
    }

    /// The position source failed (permission denied, signal lost).
    /// State is frozen until the next valid fix.
    pub fn on_position_error(&mut self, reason: &str) {
        tracing::warn!("Position source unavailable: {}", reason);
        if self.location_available {
            self.location_available = false;
            self.publish(NavEvent::Status(StatusEvent::LocationUnavailable));
        }
    }

    /// The alert set changed (added, removed or updated).
    pub fn on_alerts_changed(&mut self, alerts: &[Alert]) {
        let transitions = self.monitor.update_alerts(alerts.to_vec());
        self.publish_transitions(transitions);
    }

    /// A single alert was just created.
    pub fn on_new_alert(&mut self, alert: &Alert) {
        if let Some(signal) = self.session.on_new_alert(alert) {
            self.publish(NavEvent::RerouteNeeded(signal));
        }
    }

    /// Set the destination and get a ticket for the routing oracle.
    pub fn request_routes(
        &mut self,
        destination: GeoPoint,
        preference: RoutePreference,
    ) -> Result<RouteRequest, NavError> {
        if !destination.is_valid() {
            return Err(NavError::InvalidCoordinate {
                lat: destination.lat,
                lng: destination.lng,
            });
        }
        let was_navigating = self.session.is_navigating();
        let request = self.session.set_destination(destination, preference)?;
        if was_navigating {
            self.publish(NavEvent::Status(StatusEvent::NavigationStopped));
        }
        Ok(request)
    }

    /// Score, rank and install the oracle's answer to `request`.
    ///
    /// Returns false if the request went stale while it was in flight.
    pub fn resolve_routes(
        &mut self,
        request: &RouteRequest,
        raw_routes: Vec<RawRoute>,
        alerts: &[Alert],
    ) -> bool {
        let candidates = self.prepare_candidates(request, raw_routes, alerts);
        let empty = candidates.is_empty();
        let accepted = self.session.accept_routes(request, candidates);
        if accepted && empty {
            self.publish(NavEvent::Status(StatusEvent::NoRoutesFound));
        }
        accepted
    }

    /// Build, score and rank candidates from raw oracle routes.
    pub fn prepare_candidates(
        &self,
        request: &RouteRequest,
        raw_routes: Vec<RawRoute>,
        alerts: &[Alert],
    ) -> Vec<RouteCandidate> {
        let candidates = raw_routes
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| {
                let mut candidate =
                    RouteCandidate::from_raw(format!("route-{}-{}", request.id, idx), raw);
                self.scorer.score_candidate(&mut candidate, alerts);
                candidate
            })
            .collect();
        self.selector.select(candidates, request.preference, alerts)
    }

    /// Pick a candidate. While navigating the running trip is stopped and a
    /// new one starts on the chosen route.
    pub fn select_route(&mut self, route_id: &str) -> Result<(), NavError> {
        let was_navigating = self.session.is_navigating();
        if let Some(first) = self.session.select_route(route_id)? {
            self.publish_trip_start(was_navigating, first);
        }
        Ok(())
    }

    pub fn start_navigation(&mut self) -> Result<(), NavError> {
        let was_navigating = self.session.is_navigating();
        let first = self.session.start_navigation()?;
        self.publish_trip_start(was_navigating, first);
        Ok(())
    }

    pub fn stop_navigation(&mut self) {
        let was_navigating = self.session.is_navigating();
        self.session.stop_navigation();
        if was_navigating {
            self.publish(NavEvent::Status(StatusEvent::NavigationStopped));
        }
    }

    pub fn dismiss_reroute(&mut self) {
        self.session.dismiss_reroute();
    }

    /// Turn proximity alerting on with the current alert snapshot.
    pub fn start_geofencing(&mut self, alerts: &[Alert]) {
        self.monitor.start(alerts.to_vec());
        self.publish(NavEvent::Status(StatusEvent::GeofencingEnabled));

        // Seed membership from the last fix so the user is not left waiting
        // for the next GPS tick.
        if let Some(point) = self.session.current_location() {
            let transitions = self.monitor.on_position(point);
            self.publish_transitions(transitions);
        }
    }

    pub fn stop_geofencing(&mut self) {
        if self.monitor.is_active() {
            self.monitor.stop();
            self.publish(NavEvent::Status(StatusEvent::GeofencingDisabled));
        }
    }

    pub fn geofencing_active(&self) -> bool {
        self.monitor.is_active()
    }

    pub fn nearby_alerts(&self, radius_m: Option<f64>) -> Vec<NearbyAlert> {
        self.monitor
            .nearby_alerts(radius_m.unwrap_or(self.rules.nearby_radius_m))
    }

    pub fn entered_zones(&self) -> Vec<GeofenceZone> {
        self.monitor.entered_zones().into_iter().cloned().collect()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            session: self.session.snapshot(),
            geofencing_active: self.monitor.is_active(),
            entered_zones: self.entered_zones(),
            location_available: self.location_available,
        }
    }

    fn publish(&mut self, event: NavEvent) {
        self.bus.publish(&event);
    }

    fn publish_trip_start(&mut self, replaced: bool, first: Announcement) {
        if replaced {
            self.publish(NavEvent::Status(StatusEvent::NavigationStopped));
        }
        self.publish(NavEvent::Status(StatusEvent::NavigationStarted));
        self.publish(NavEvent::Instruction(first));
    }

    fn publish_transitions(&mut self, transitions: Vec<(Transition, ZoneEvent)>) {
        for (transition, event) in transitions {
            let event = match transition {
                Transition::Enter => NavEvent::Enter(event),
                Transition::Exit => NavEvent::Exit(event),
            };
            self.publish(event);
        }
    }

    fn publish_announcements(&mut self, announcements: Vec<Announcement>) {
        for announcement in announcements {
            self.publish(NavEvent::Instruction(announcement));
        }
    }
}
