//! Proximity monitor for hazard zones.
//!
//! Each alert defines a circular zone whose radius scales with severity.
//! The monitor remembers which zones the user is inside and only reports
//! transitions, so lingering on a boundary produces a single ENTER until the
//! user is actually outside again.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::geo::distance_m;
use crate::models::{Alert, AlertSeverity, GeoPoint};
use crate::rules::ZoneRadii;

/// Circular zone derived from an alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeofenceZone {
    pub alert_id: String,
    pub center: GeoPoint,
    pub radius_meters: f64,
    pub severity: AlertSeverity,
}

impl GeofenceZone {
    pub fn from_alert(alert: &Alert, radii: &ZoneRadii) -> Self {
        Self {
            alert_id: alert.id.clone(),
            center: alert.position,
            radius_meters: radii.radius_m(alert.severity),
            severity: alert.severity,
        }
    }

    pub fn contains(&self, p: GeoPoint) -> bool {
        distance_m(p, self.center) <= self.radius_meters
    }
}

/// How loudly a zone transition should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// Voice announcement, vibration, notification that cannot be dismissed
    Critical,
    /// Dismissible notification
    High,
    /// Toast
    Informational,
    /// Mild "zone cleared" notice on exit
    Cleared,
}

impl Urgency {
    pub fn for_entry(severity: AlertSeverity) -> Self {
        match severity {
            AlertSeverity::Critica => Urgency::Critical,
            AlertSeverity::Alta => Urgency::High,
            AlertSeverity::Media | AlertSeverity::Baja | AlertSeverity::Unknown => {
                Urgency::Informational
            }
        }
    }

    pub fn speaks(&self) -> bool {
        matches!(self, Urgency::Critical)
    }

    pub fn vibrates(&self) -> bool {
        matches!(self, Urgency::Critical)
    }

    pub fn dismissible(&self) -> bool {
        !matches!(self, Urgency::Critical)
    }
}

/// An ENTER or EXIT transition for one zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneEvent {
    pub alert: Alert,
    pub distance_m: f64,
    pub radius_m: f64,
    pub urgency: Urgency,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Enter,
    Exit,
}

/// Alert annotated with its distance from the last known position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyAlert {
    pub alert: Alert,
    pub distance_m: f64,
}

#[derive(Debug, Default)]
pub struct GeofenceMonitor {
    radii: ZoneRadii,
    active: bool,
    alerts: Vec<Alert>,
    zones: Vec<GeofenceZone>,
    entered_zone_ids: HashSet<String>,
    last_position: Option<GeoPoint>,
}

impl GeofenceMonitor {
    pub fn new(radii: ZoneRadii) -> Self {
        Self {
            radii,
            ..Self::default()
        }
    }

    /// Begin monitoring against a fresh alert snapshot.
    pub fn start(&mut self, alerts: Vec<Alert>) {
        self.active = true;
        self.entered_zone_ids.clear();
        self.last_position = None;
        self.set_alerts(alerts);
        tracing::info!("Geofencing started with {} zone(s)", self.zones.len());
    }

    /// Stop monitoring and forget all membership.
    pub fn stop(&mut self) {
        self.active = false;
        self.entered_zone_ids.clear();
        self.last_position = None;
        self.zones.clear();
        self.alerts.clear();
        tracing::info!("Geofencing stopped");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Replace the alert set and re-check the last known position.
    ///
    /// Entries for alerts that disappeared stay in the entered set; they can
    /// never match again because their zone is gone.
    pub fn update_alerts(&mut self, alerts: Vec<Alert>) -> Vec<(Transition, ZoneEvent)> {
        if !self.active {
            return Vec::new();
        }
        self.set_alerts(alerts);
        match self.last_position {
            Some(p) => self.evaluate(p),
            None => Vec::new(),
        }
    }

    /// Process one position fix. Ignored while stopped.
    pub fn on_position(&mut self, p: GeoPoint) -> Vec<(Transition, ZoneEvent)> {
        if !self.active {
            return Vec::new();
        }
        self.last_position = Some(p);
        self.evaluate(p)
    }

    /// Alerts within `radius_m` of the last position, nearest first.
    pub fn nearby_alerts(&self, radius_m: f64) -> Vec<NearbyAlert> {
        let Some(p) = self.last_position else {
            return Vec::new();
        };
        let mut nearby: Vec<NearbyAlert> = self
            .alerts
            .iter()
            .map(|alert| NearbyAlert {
                distance_m: distance_m(p, alert.position),
                alert: alert.clone(),
            })
            .filter(|n| n.distance_m <= radius_m)
            .collect();
        nearby.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        nearby
    }

    /// Zones the user is currently inside.
    pub fn entered_zones(&self) -> Vec<&GeofenceZone> {
        self.zones
            .iter()
            .filter(|zone| self.entered_zone_ids.contains(&zone.alert_id))
            .collect()
    }

    pub fn zones(&self) -> &[GeofenceZone] {
        &self.zones
    }

    pub fn last_position(&self) -> Option<GeoPoint> {
        self.last_position
    }

    /// One zone per alert id; a later duplicate replaces the earlier entry in
    /// place.
    fn set_alerts(&mut self, alerts: Vec<Alert>) {
        let mut slots: HashMap<String, usize> = HashMap::with_capacity(alerts.len());
        let mut unique: Vec<Alert> = Vec::with_capacity(alerts.len());
        for alert in alerts {
            match slots.get(&alert.id) {
                Some(&slot) => {
                    tracing::warn!("Duplicate alert id {}; keeping the latest", alert.id);
                    unique[slot] = alert;
                }
                None => {
                    slots.insert(alert.id.clone(), unique.len());
                    unique.push(alert);
                }
            }
        }
        let alerts = unique;

        self.zones = alerts
            .iter()
            .map(|alert| GeofenceZone::from_alert(alert, &self.radii))
            .collect();
        self.alerts = alerts;
    }

    fn evaluate(&mut self, p: GeoPoint) -> Vec<(Transition, ZoneEvent)> {
        let mut events = Vec::new();

        for (zone, alert) in self.zones.iter().zip(self.alerts.iter()) {
            let distance = distance_m(p, zone.center);
            let is_inside = distance <= zone.radius_meters;
            let was_inside = self.entered_zone_ids.contains(&zone.alert_id);

            if is_inside && !was_inside {
                self.entered_zone_ids.insert(zone.alert_id.clone());
                tracing::info!(
                    "Entered {} zone {} ({:.0} m from centre)",
                    zone.severity.as_str(),
                    zone.alert_id,
                    distance
                );
                events.push((
                    Transition::Enter,
                    ZoneEvent {
                        alert: alert.clone(),
                        distance_m: distance,
                        radius_m: zone.radius_meters,
                        urgency: Urgency::for_entry(zone.severity),
                        message: format!(
                            "Entering hazard zone: {} ({:.0} m)",
                            alert.title, distance
                        ),
                    },
                ));
            } else if !is_inside && was_inside {
                self.entered_zone_ids.remove(&zone.alert_id);
                tracing::info!("Left zone {}", zone.alert_id);
                events.push((
                    Transition::Exit,
                    ZoneEvent {
                        alert: alert.clone(),
                        distance_m: distance,
                        radius_m: zone.radius_meters,
                        urgency: Urgency::Cleared,
                        message: format!("Hazard zone cleared: {}", alert.title),
                    },
                ));
            }
        }

        events
    }
}
