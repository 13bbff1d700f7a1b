//! Routing oracle seam used by the engine loop.

use std::time::Duration;

use anyhow::Result;
use futures::future::BoxFuture;
use hazard_core::{GeoPoint, RawRoute};
use hazard_routing::{RoutingClient, RoutingProfile};

use crate::config::Config;

/// Source of candidate paths between two points.
pub trait RouteOracle: Send + Sync {
    fn get_routes(&self, origin: GeoPoint, destination: GeoPoint)
        -> BoxFuture<'_, Result<Vec<RawRoute>>>;
}

/// OSRM-compatible HTTP oracle.
pub struct OsrmOracle {
    client: RoutingClient,
    profile: RoutingProfile,
}

impl OsrmOracle {
    pub fn new(base_url: &str, profile: RoutingProfile, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: RoutingClient::new(base_url, timeout)?,
            profile,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.routing_url,
            config.routing_profile,
            config.routing_timeout(),
        )
    }
}

impl RouteOracle for OsrmOracle {
    fn get_routes(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> BoxFuture<'_, Result<Vec<RawRoute>>> {
        Box::pin(self.client.get_routes(origin, destination, self.profile))
    }
}
