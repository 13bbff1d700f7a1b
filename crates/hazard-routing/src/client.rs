//! Routing oracle HTTP client.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use hazard_core::models::{GeoPoint, RawRoute};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::osrm::{parse_routes, OsrmResponse};

/// Travel mode passed to the oracle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingProfile {
    #[default]
    Driving,
    Walking,
    Cycling,
}

impl RoutingProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingProfile::Driving => "driving",
            RoutingProfile::Walking => "walking",
            RoutingProfile::Cycling => "cycling",
        }
    }
}

impl fmt::Display for RoutingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoutingProfile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "driving" | "car" => Ok(RoutingProfile::Driving),
            "walking" | "foot" => Ok(RoutingProfile::Walking),
            "cycling" | "bike" => Ok(RoutingProfile::Cycling),
            other => Err(anyhow!("Unknown routing profile '{}'", other)),
        }
    }
}

/// HTTP client for an OSRM-compatible routing service.
#[derive(Debug, Clone)]
pub struct RoutingClient {
    client: Client,
    base_url: String,
}

impl RoutingClient {
    /// Create a new routing client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the oracle (e.g., "http://localhost:5000")
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the request URL for a pair of coordinates.
    pub fn route_url(&self, origin: GeoPoint, destination: GeoPoint, profile: RoutingProfile) -> String {
        format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}",
            self.base_url, profile, origin.lng, origin.lat, destination.lng, destination.lat
        )
    }

    /// Ask the oracle for candidate paths between two points.
    pub async fn get_routes(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        profile: RoutingProfile,
    ) -> Result<Vec<RawRoute>> {
        let url = self.route_url(origin, destination, profile);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("alternatives", "true"),
                ("steps", "true"),
                ("geometries", "geojson"),
                ("overview", "full"),
            ])
            .send()
            .await
            .context("Failed to reach routing oracle")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read routing oracle response")?;

        // OSRM answers NoRoute etc. with 400 and a JSON body; keep its message
        let payload: OsrmResponse = serde_json::from_str(&body).with_context(|| {
            format!("Failed to parse routing oracle response ({status}): {body}")
        })?;

        let routes = parse_routes(payload)?;
        tracing::debug!(
            "Routing oracle returned {} route(s) for {} -> {}",
            routes.len(),
            format_point(origin),
            format_point(destination)
        );
        Ok(routes)
    }
}

fn format_point(p: GeoPoint) -> String {
    format!("({:.5}, {:.5})", p.lat, p.lng)
}
