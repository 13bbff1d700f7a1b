//! Shared library surface for the hazard navigation server and its tests.

pub mod api;
pub mod backoff;
pub mod config;
pub mod loops;
pub mod notify;
pub mod oracle;
pub mod state;
