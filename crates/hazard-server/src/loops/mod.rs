//! Background tasks.

pub mod alert_sync_loop;
pub mod engine_loop;
