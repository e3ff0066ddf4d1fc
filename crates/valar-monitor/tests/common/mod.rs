/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for valar-monitor tests

#![allow(dead_code)]

use std::time::Duration;

use serde_json::{Value, json};
use valar_monitor::api::{ClientConfig, DashboardClient};
use wiremock::MockServer;

pub const TEST_TOKEN: &str = "test-token";

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at the mock server's `/api/` prefix
pub fn client_for(server: &MockServer) -> DashboardClient {
    DashboardClient::new(ClientConfig {
        base_url: format!("{}/api", server.uri()),
        token: Some(TEST_TOKEN.to_string()),
        timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(5),
    })
    .expect("client should build")
}

pub fn summary_body(total_balance: f64, net_profit: f64) -> Value {
    json!({
        "total_balance": total_balance,
        "net_profit": net_profit,
        "total_margin": 12000.0,
        "available_funds": 88000.0,
        "profit_rate": 1.25,
        "update_time": "2025-01-06 10:00:00",
        "accounts_count": 2
    })
}

pub fn position_body(account: &str, code: &str, float_pnl: f64, price: f64) -> Value {
    json!({
        "accountid": account,
        "code": code,
        "symbol": code,
        "name": "螺纹钢",
        "exchange": "SHFE",
        "industry": "黑色",
        "direction": "多",
        "float_pnl": float_pnl,
        "margin": 5000.0,
        "current_price": price,
        "open_price": 3300.0,
        "volume": 2,
        "yd_volume": 0,
        "prev_settlement": 3290.0,
        "pnl": float_pnl,
        "frozen": 0,
        "updatetime": "10:00:00"
    })
}

pub fn positions_body(positions: Vec<Value>) -> Value {
    json!({
        "positions": positions,
        "update_time": "2025-01-06 10:00:00"
    })
}

pub fn order_body(account: &str, order_id: &str, traded: u32, status: &str) -> Value {
    json!({
        "accountid": account,
        "code": "IF2506",
        "exchange": "CFFEX",
        "direction": "多",
        "offset": "开",
        "price": 3850.2,
        "volume": 4,
        "order_id": order_id,
        "type": "限价",
        "traded": traded,
        "status": status,
        "createtime": "09:31:00",
        "updatetime": "09:31:05"
    })
}
