//! Shared server state: alert store, engine command queue and the channels
//! the engine task publishes on.

use std::sync::Arc;

use dashmap::DashMap;
use hazard_core::{
    Alert, EngineSnapshot, EventKind, NavError, NavEvent, NavigationEngine, NavigationRules,
};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::config::Config;
use crate::loops::engine_loop::{run_engine_loop, EngineCommand, EngineContext};
use crate::notify::LogSink;
use crate::oracle::RouteOracle;

const COMMAND_QUEUE_CAPACITY: usize = 256;
const STREAM_CAPACITY: usize = 512;

/// The engine task has stopped and can no longer take commands.
#[derive(Debug, Error)]
#[error("navigation engine is not running")]
pub struct EngineUnavailable;

/// One serialized engine event, ready for streaming.
#[derive(Debug, Clone)]
pub struct StreamMessage {
    pub kind: EventKind,
    pub payload: Arc<str>,
}

impl StreamMessage {
    pub fn from_event(event: &NavEvent) -> serde_json::Result<Self> {
        Ok(Self {
            kind: event.kind(),
            payload: serde_json::to_string(event)?.into(),
        })
    }
}

/// Result of replacing the whole alert set with a feed snapshot.
#[derive(Debug, Default)]
pub struct AlertDiff {
    pub added: Vec<Alert>,
    pub updated: usize,
    pub removed: usize,
}

impl AlertDiff {
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || self.updated > 0 || self.removed > 0
    }
}

/// Active hazard reports keyed by id.
#[derive(Debug, Default)]
pub struct AlertStore {
    alerts: DashMap<String, Alert>,
}

impl AlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an alert. Returns true if the id was new.
    pub fn upsert(&self, alert: Alert) -> bool {
        self.alerts.insert(alert.id.clone(), alert).is_none()
    }

    pub fn remove(&self, id: &str) -> Option<Alert> {
        self.alerts.remove(id).map(|(_, alert)| alert)
    }

    pub fn get(&self, id: &str) -> Option<Alert> {
        self.alerts.get(id).map(|entry| entry.value().clone())
    }

    /// All alerts, ordered by id.
    pub fn all(&self) -> Vec<Alert> {
        let mut alerts: Vec<Alert> = self.alerts.iter().map(|r| r.value().clone()).collect();
        alerts.sort_by(|a, b| a.id.cmp(&b.id));
        alerts
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Make the store hold exactly `incoming`.
    pub fn replace_all(&self, incoming: Vec<Alert>) -> AlertDiff {
        let mut diff = AlertDiff::default();
        let incoming_ids: std::collections::HashSet<String> =
            incoming.iter().map(|alert| alert.id.clone()).collect();

        let before = self.alerts.len();
        self.alerts.retain(|id, _| incoming_ids.contains(id));
        diff.removed = before - self.alerts.len();

        for alert in incoming {
            let changed = match self.alerts.get(&alert.id) {
                Some(existing) => !same_alert(existing.value(), &alert),
                None => {
                    diff.added.push(alert.clone());
                    false
                }
            };
            if changed {
                diff.updated += 1;
            }
            self.alerts.insert(alert.id.clone(), alert);
        }
        diff
    }
}

fn same_alert(a: &Alert, b: &Alert) -> bool {
    a.severity == b.severity
        && a.alert_type == b.alert_type
        && a.position == b.position
        && a.title == b.title
        && a.description == b.description
}

/// Application state shared by handlers and background loops.
pub struct AppState {
    config: Config,
    alerts: Arc<AlertStore>,
    commands: mpsc::Sender<EngineCommand>,
    snapshot: watch::Receiver<EngineSnapshot>,
    pub tx: broadcast::Sender<StreamMessage>,
}

impl AppState {
    /// Build the engine and spawn the task that owns it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: Config,
        rules: NavigationRules,
        oracle: Arc<dyn RouteOracle>,
    ) -> Result<Arc<Self>, NavError> {
        let mut engine = NavigationEngine::new(rules)?;
        let (tx, _) = broadcast::channel(STREAM_CAPACITY);

        let stream = tx.clone();
        engine.bus_mut().attach(move |event| match StreamMessage::from_event(event) {
            Ok(message) => {
                // No receivers is fine; nobody is watching the stream
                let _ = stream.send(message);
            }
            Err(err) => tracing::warn!("Failed to serialize {:?} event: {}", event.kind(), err),
        });
        engine.bus_mut().attach_sink(LogSink::new());

        let alerts = Arc::new(AlertStore::new());
        let (commands, queue) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (snapshot_tx, snapshot) = watch::channel(engine.snapshot());

        let context = EngineContext {
            alerts: alerts.clone(),
            commands: commands.downgrade(),
            snapshot: snapshot_tx,
            oracle,
        };
        tokio::spawn(run_engine_loop(engine, queue, context));

        Ok(Arc::new(Self {
            config,
            alerts,
            commands,
            snapshot,
            tx,
        }))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn alerts(&self) -> &AlertStore {
        &self.alerts
    }

    /// Latest state published by the engine task.
    pub fn snapshot(&self) -> EngineSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<EngineSnapshot> {
        self.snapshot.clone()
    }

    /// Queue a command and wait for the engine to answer it.
    pub async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> EngineCommand,
    ) -> Result<T, EngineUnavailable> {
        let (reply, answer) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| EngineUnavailable)?;
        answer.await.map_err(|_| EngineUnavailable)
    }

    /// Store a reported alert and let the engine react to it.
    ///
    /// Returns true if the alert id was new.
    pub async fn report_alert(&self, alert: Alert) -> Result<bool, EngineUnavailable> {
        let is_new = self.alerts.upsert(alert.clone());
        self.call(|reply| EngineCommand::AlertsChanged { reply }).await?;
        if is_new {
            tracing::info!(
                "New {} alert {} at ({:.5}, {:.5})",
                alert.severity.as_str(),
                alert.id,
                alert.position.lat,
                alert.position.lng
            );
            self.call(|reply| EngineCommand::NewAlert { alert, reply })
                .await?;
        }
        Ok(is_new)
    }

    pub async fn remove_alert(&self, id: &str) -> Result<Option<Alert>, EngineUnavailable> {
        let removed = self.alerts.remove(id);
        if removed.is_some() {
            tracing::info!("Removed alert {}", id);
            self.call(|reply| EngineCommand::AlertsChanged { reply }).await?;
        }
        Ok(removed)
    }

    /// Replace the alert set with a feed snapshot.
    pub async fn sync_alerts(&self, incoming: Vec<Alert>) -> Result<AlertDiff, EngineUnavailable> {
        let diff = self.alerts.replace_all(incoming);
        if !diff.changed() {
            return Ok(diff);
        }
        self.call(|reply| EngineCommand::AlertsChanged { reply }).await?;
        for alert in diff.added.iter().cloned() {
            self.call(|reply| EngineCommand::NewAlert { alert, reply })
                .await?;
        }
        Ok(diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hazard_core::{AlertSeverity, AlertType, GeoPoint};

    fn alert(id: &str, severity: AlertSeverity) -> Alert {
        Alert {
            id: id.to_string(),
            severity,
            alert_type: AlertType::Flood,
            position: GeoPoint::new(4.6, -74.08),
            title: "Flooded underpass".to_string(),
            description: String::new(),
            created_at: None,
        }
    }

    #[test]
    fn all_is_ordered_by_id() {
        let store = AlertStore::new();
        store.upsert(alert("b", AlertSeverity::Alta));
        store.upsert(alert("a", AlertSeverity::Baja));
        let ids: Vec<String> = store.all().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn replace_all_reports_the_difference() {
        let store = AlertStore::new();
        store.upsert(alert("keep", AlertSeverity::Media));
        store.upsert(alert("gone", AlertSeverity::Media));
        store.upsert(alert("bump", AlertSeverity::Baja));

        let diff = store.replace_all(vec![
            alert("keep", AlertSeverity::Media),
            alert("bump", AlertSeverity::Critica),
            alert("fresh", AlertSeverity::Alta),
        ]);
        assert_eq!(diff.removed, 1);
        assert_eq!(diff.updated, 1);
        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.added[0].id, "fresh");
        assert_eq!(store.len(), 3);
        assert!(store.get("gone").is_none());

        let again = store.replace_all(store.all());
        assert!(!again.changed());
    }
}
