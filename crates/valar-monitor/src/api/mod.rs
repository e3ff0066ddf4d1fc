pub mod client;
pub mod error;
pub mod types;

pub use client::{ClientConfig, DashboardClient};
pub use error::{ApiError, Result};
pub use types::{DashboardSummary, Order, OrdersResponse, Position, PositionsResponse};
