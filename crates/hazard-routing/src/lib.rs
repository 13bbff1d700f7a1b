//! Hazard Routing - routing oracle client
//!
//! Talks to an OSRM-compatible routing service and turns its answers into
//! raw route geometries with turn-by-turn steps for the engine to score.

pub mod client;
pub mod instructions;
pub mod osrm;

pub use client::{RoutingClient, RoutingProfile};
pub use osrm::{parse_routes, OsrmResponse};
