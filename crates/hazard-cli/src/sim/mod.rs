//! Position stream simulation.

pub mod paths;

pub use paths::{add_gps_noise, parse_waypoints, PolylinePath};
