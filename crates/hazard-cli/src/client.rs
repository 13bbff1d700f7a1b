//! Minimal HTTP client for the hazard server.

use anyhow::{bail, Context, Result};
use hazard_core::{Alert, AlertSeverity, AlertType, PositionSample};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct NewAlert {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub severity: AlertSeverity,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub lat: f64,
    pub lng: f64,
    pub title: String,
    pub description: String,
}

pub struct ServerClient {
    client: Client,
    base_url: String,
}

impl ServerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Post one fix; returns the engine snapshot the server answered with.
    pub async fn send_position(&self, sample: &PositionSample) -> Result<Value> {
        let url = format!("{}/v1/positions", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(sample)
            .send()
            .await
            .context("Failed to send position")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Position rejected ({}): {}", status, body);
        }
        response.json().await.context("Failed to parse position response")
    }

    pub async fn report_alert(&self, alert: &NewAlert) -> Result<Alert> {
        let url = format!("{}/v1/alerts", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(alert)
            .send()
            .await
            .context("Failed to send alert")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Alert rejected ({}): {}", status, body);
        }
        response.json().await.context("Failed to parse alert response")
    }
}
