/*
[INPUT]:  Public API exports for the valar-refresh crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod animation;
pub mod coordinator;
pub mod error;
pub mod registry;
pub mod route;
pub mod settings;
pub mod tracker;
pub mod value_change;

pub use animation::{HighlightPolicy, HighlightTimings, RowHighlight};
pub use coordinator::{BUSY_WINDOW, RefreshCoordinator, RefreshSnapshot};
pub use error::StorageError;
pub use registry::{PageRefreshRegistry, RefreshCallback, Registration, RegistrationGuard};
pub use route::{RefreshRoute, Route};
pub use settings::{JsonFileStore, MemoryStore, RefreshConfig, SettingsStore};
pub use tracker::ChangeTracker;
pub use value_change::{ChangeRecord, ChangeType, ValueChangeDetector};
