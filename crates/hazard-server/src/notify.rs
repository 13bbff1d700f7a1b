//! Log-backed notification sink.
//!
//! Stands in for the device's speech and haptic channels: every event is
//! written to the log with the delivery it would trigger.

use hazard_core::{NavEvent, NotificationSink, StatusEvent};

#[derive(Debug, Default)]
pub struct LogSink {
    delivered: u64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

impl NotificationSink for LogSink {
    fn notify(&mut self, event: &NavEvent) {
        self.delivered += 1;
        match event {
            NavEvent::Enter(zone) => {
                tracing::info!(
                    alert_id = %zone.alert.id,
                    severity = zone.alert.severity.as_str(),
                    speak = zone.urgency.speaks(),
                    vibrate = zone.urgency.vibrates(),
                    "{}",
                    zone.message
                );
            }
            NavEvent::Exit(zone) => {
                tracing::info!(alert_id = %zone.alert.id, "{}", zone.message);
            }
            NavEvent::Instruction(announcement) => {
                tracing::info!(
                    step = announcement.step_index,
                    speak = true,
                    "{}",
                    announcement.text
                );
            }
            NavEvent::RerouteNeeded(signal) => {
                tracing::warn!(
                    route_id = %signal.route_id,
                    alert_id = %signal.alert.id,
                    "Critical alert {:.0} m from the active route",
                    signal.distance_km * 1000.0
                );
            }
            NavEvent::Status(StatusEvent::LocationUnavailable) => {
                tracing::warn!("Location unavailable");
            }
            NavEvent::Status(status) => {
                tracing::debug!(?status, "Status changed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_deliveries() {
        let mut sink = LogSink::new();
        sink.notify(&NavEvent::Status(StatusEvent::GeofencingEnabled));
        sink.notify(&NavEvent::Status(StatusEvent::LocationUnavailable));
        assert_eq!(sink.delivered(), 2);
    }
}
