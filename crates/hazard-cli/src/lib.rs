//! Hazard CLI - command line tools for the hazard navigation server.
//!
//! Binaries:
//! - drive_route: replays a path as a noisy GPS position stream
//! - report_alert: pushes a hazard report

pub mod client;
pub mod sim;

pub use client::ServerClient;
