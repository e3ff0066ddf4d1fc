/*
[INPUT]:  Public API exports for the valar-monitor crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod api;
pub mod app;
pub mod command;
pub mod config;
pub mod console;
pub mod pages;
pub mod render;

// Re-export main types for convenience
pub use api::{ApiError, DashboardClient};
pub use app::{App, CommandOutcome};
pub use command::Command;
pub use config::MonitorConfig;
