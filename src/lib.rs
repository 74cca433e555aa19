/// FleetWatch - fleet registry with maintenance-due notifications
///
/// This library provides the vehicle registry service, the maintenance scan
/// and the notification pipeline that reports on both.
pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod fleet;
pub mod notification;
pub mod report;
pub mod scanner;
pub mod scheduler;
pub mod store;
pub mod task_manager;

// Re-export core types for convenience
pub use crate::core::*;
