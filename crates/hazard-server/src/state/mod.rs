//! Server state management.

pub mod store;

pub use store::{AlertDiff, AlertStore, AppState, EngineUnavailable, StreamMessage};
