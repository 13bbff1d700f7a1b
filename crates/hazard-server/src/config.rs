//! Server configuration from environment.

use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use hazard_core::{NavigationRules, SeverityWeights};
use hazard_routing::RoutingProfile;

/// Which severity weight table to score with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WeightsPreset {
    #[default]
    Standard,
    Planning,
}

impl WeightsPreset {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" => Some(WeightsPreset::Standard),
            "planning" => Some(WeightsPreset::Planning),
            _ => None,
        }
    }

    pub fn weights(&self) -> SeverityWeights {
        match self {
            WeightsPreset::Standard => SeverityWeights::STANDARD,
            WeightsPreset::Planning => SeverityWeights::PLANNING,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub routing_url: String,
    pub routing_profile: RoutingProfile,
    pub routing_timeout_secs: u64,
    pub alert_feed_url: Option<String>,
    pub alert_feed_timeout_secs: u64,
    pub alert_sync_secs: u64,
    pub rules_path: Option<String>,
    pub weights: WeightsPreset,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            routing_url: "http://localhost:5000".to_string(),
            routing_profile: RoutingProfile::Driving,
            routing_timeout_secs: 10,
            alert_feed_url: None,
            alert_feed_timeout_secs: 10,
            alert_sync_secs: 30,
            rules_path: None,
            weights: WeightsPreset::Standard,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env::var("HAZARD_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.server_port),
            routing_url: env::var("HAZARD_ROUTING_URL").unwrap_or(defaults.routing_url),
            routing_profile: env::var("HAZARD_ROUTING_PROFILE")
                .ok()
                .and_then(|s| match s.parse() {
                    Ok(profile) => Some(profile),
                    Err(err) => {
                        tracing::warn!("Ignoring HAZARD_ROUTING_PROFILE: {}", err);
                        None
                    }
                })
                .unwrap_or(defaults.routing_profile),
            routing_timeout_secs: env::var("HAZARD_ROUTING_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.routing_timeout_secs),
            alert_feed_url: env::var("HAZARD_ALERT_FEED_URL")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            alert_feed_timeout_secs: env::var("HAZARD_ALERT_FEED_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.alert_feed_timeout_secs),
            alert_sync_secs: env::var("HAZARD_ALERT_SYNC_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.alert_sync_secs),
            rules_path: env::var("HAZARD_RULES_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            weights: env::var("HAZARD_WEIGHTS")
                .ok()
                .and_then(|s| WeightsPreset::parse(&s))
                .unwrap_or(defaults.weights),
        }
    }

    pub fn routing_timeout(&self) -> Duration {
        Duration::from_secs(self.routing_timeout_secs)
    }

    pub fn alert_feed_timeout(&self) -> Duration {
        Duration::from_secs(self.alert_feed_timeout_secs)
    }

    /// Load the engine rules: the JSON file if configured, defaults otherwise,
    /// with the weight preset applied on top. Invalid rules are an error.
    pub fn load_rules(&self) -> Result<NavigationRules> {
        let mut rules = match self.rules_path.as_deref() {
            Some(path) => read_rules(Path::new(path))?,
            None => NavigationRules::default(),
        };
        if self.rules_path.is_none() || self.weights == WeightsPreset::Planning {
            rules.severity_weights = self.weights.weights();
        }
        rules.ensure_valid()?;
        Ok(rules)
    }
}

fn read_rules(path: &Path) -> Result<NavigationRules> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rules file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse rules file {}", path.display()))
}
