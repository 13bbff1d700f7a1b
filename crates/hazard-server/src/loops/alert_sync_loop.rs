//! Pull the active alert set from an external feed.
//!
//! The feed answers `GET` with a JSON array of alerts. Each successful fetch
//! replaces the store contents; alerts with invalid coordinates are dropped.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use hazard_core::Alert;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response, StatusCode};
use tokio::time::interval;

use crate::backoff::Backoff;
use crate::config::Config;
use crate::state::AppState;

const BACKOFF_BASE_SECS: u64 = 2;
const BACKOFF_MAX_SECS: u64 = 300;

#[derive(Debug, thiserror::Error)]
enum FeedError {
    #[error("alert feed answered {status}")]
    Rejected {
        status: StatusCode,
        retry_after: Option<Duration>,
    },
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl FeedError {
    fn retry_after(&self) -> Option<Duration> {
        match self {
            FeedError::Rejected { retry_after, .. } => *retry_after,
            FeedError::Failed(_) => None,
        }
    }
}

/// HTTP client for the feed, with its own timeout.
fn feed_client(config: &Config) -> reqwest::Result<Client> {
    Client::builder().timeout(config.alert_feed_timeout()).build()
}

/// Start the alert feed sync loop.
pub async fn run_alert_sync_loop(state: Arc<AppState>, feed_url: String) {
    let client = match feed_client(state.config()) {
        Ok(client) => client,
        Err(err) => {
            tracing::error!("Alert sync disabled, failed to build HTTP client: {}", err);
            return;
        }
    };

    let mut ticker = interval(Duration::from_secs(state.config().alert_sync_secs));
    let mut backoff = Backoff::new(
        Duration::from_secs(BACKOFF_BASE_SECS),
        Duration::from_secs(BACKOFF_MAX_SECS),
    );
    tracing::info!("Syncing alerts from {}", feed_url);

    loop {
        ticker.tick().await;
        if !backoff.ready(Instant::now()) {
            continue;
        }

        let alerts = match fetch_alerts(&client, &feed_url).await {
            Ok(alerts) => {
                backoff.succeeded();
                alerts
            }
            Err(err) => {
                let delay = backoff.failed(Instant::now(), err.retry_after());
                tracing::warn!(
                    "Alert feed fetch failed ({} in a row): {:#} (backing off {:?})",
                    backoff.failures(),
                    err,
                    delay
                );
                continue;
            }
        };

        match state.sync_alerts(alerts).await {
            Ok(diff) if diff.changed() => tracing::info!(
                "Alert feed sync: {} added, {} updated, {} removed",
                diff.added.len(),
                diff.updated,
                diff.removed
            ),
            Ok(_) => {}
            Err(err) => {
                tracing::error!("Alert sync stopping: {}", err);
                break;
            }
        }
    }
}

async fn fetch_alerts(client: &Client, url: &str) -> Result<Vec<Alert>, FeedError> {
    let response = client
        .get(url)
        .send()
        .await
        .context("Failed to reach alert feed")?;

    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::Rejected {
            status,
            retry_after: retry_after(&response),
        });
    }

    let alerts: Vec<Alert> = response
        .json()
        .await
        .context("Failed to parse alert feed response")?;

    Ok(keep_valid(alerts))
}

/// `Retry-After` in delta-seconds form; HTTP dates are ignored.
fn retry_after(response: &Response) -> Option<Duration> {
    parse_retry_after(response.headers().get(RETRY_AFTER)?.to_str().ok()?)
}

fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse().ok().map(Duration::from_secs)
}

fn keep_valid(alerts: Vec<Alert>) -> Vec<Alert> {
    alerts
        .into_iter()
        .filter(|alert| {
            let valid = alert.position.is_valid() && !alert.id.trim().is_empty();
            if !valid {
                tracing::warn!("Dropping feed alert '{}' with invalid id or position", alert.id);
            }
            valid
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hazard_core::{AlertSeverity, AlertType, GeoPoint};

    #[test]
    fn invalid_feed_alerts_are_dropped() {
        let make = |id: &str, lat: f64| Alert {
            id: id.to_string(),
            severity: AlertSeverity::Alta,
            alert_type: AlertType::Landslide,
            position: GeoPoint::new(lat, -75.5),
            title: "Landslide".to_string(),
            description: String::new(),
            created_at: None,
        };
        let kept = keep_valid(vec![make("ok", 6.2), make("bad", 91.0), make(" ", 6.2)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "ok");
    }

    #[test]
    fn retry_after_seconds_are_parsed() {
        assert_eq!(parse_retry_after(" 120 "), Some(Duration::from_secs(120)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2026 07:28:00 GMT"), None);
        assert_eq!(parse_retry_after("-5"), None);

        let throttled = FeedError::Rejected {
            status: StatusCode::TOO_MANY_REQUESTS,
            retry_after: Some(Duration::from_secs(120)),
        };
        assert_eq!(throttled.retry_after(), Some(Duration::from_secs(120)));
        assert_eq!(FeedError::from(anyhow::anyhow!("boom")).retry_after(), None);
    }

    #[test]
    fn feed_timeout_is_independent_of_routing() {
        let config = Config {
            routing_timeout_secs: 1,
            alert_feed_timeout_secs: 45,
            ..Config::default()
        };
        assert_eq!(config.alert_feed_timeout(), Duration::from_secs(45));
        assert_eq!(config.routing_timeout(), Duration::from_secs(1));
        assert!(feed_client(&config).is_ok());
    }

    #[tokio::test]
    async fn unreachable_feed_is_an_error() {
        let client = Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        assert!(fetch_alerts(&client, "http://127.0.0.1:9/alerts").await.is_err());
    }
}
