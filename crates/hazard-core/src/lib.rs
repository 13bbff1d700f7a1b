pub mod engine;
pub mod error;
pub mod events;
pub mod geo;
pub mod geofence;
pub mod models;
pub mod progress;
pub mod reroute;
pub mod risk;
pub mod rules;
pub mod selector;
pub mod session;

pub use engine::{EngineSnapshot, NavigationEngine};
pub use error::NavError;
pub use events::{EventBus, EventKind, NavEvent, NotificationSink, StatusEvent, SubscriptionId};
pub use geo::{bearing_degrees, destination_point, distance_km, distance_m, min_distance_to_polyline};
pub use geofence::{GeofenceMonitor, GeofenceZone, NearbyAlert, Transition, Urgency, ZoneEvent};
pub use models::{
    Alert, AlertSeverity, AlertType, GeoPoint, PositionSample, RawRoute, RiskLevel,
    RouteCandidate, RoutePreference, Step,
};
pub use progress::{Announcement, AnnouncementKind, NavigationState, ProgressTracker};
pub use reroute::{RerouteEvaluator, RerouteSignal};
pub use risk::{risk_level, RiskAssessment, RiskScorer};
pub use rules::{NavigationRules, SeverityWeights, ZoneRadii};
pub use selector::RouteSelector;
pub use session::{NavigationSession, RouteRequest, SessionSnapshot};
