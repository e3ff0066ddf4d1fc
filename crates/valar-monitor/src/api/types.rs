/*
[INPUT]:  JSON bodies of the dashboard REST API
[OUTPUT]: Typed summary, position and order records
[POS]:    Data layer - response models
[UPDATE]: When the API adds or renames response fields
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregated figures across the selected accounts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_balance: Decimal,
    pub net_profit: Decimal,
    pub total_margin: Decimal,
    pub available_funds: Decimal,
    #[serde(default)]
    pub profit_rate: Decimal,
    #[serde(default)]
    pub update_time: String,
    #[serde(default)]
    pub accounts_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub accountid: Option<String>,
    pub code: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub exchange: String,
    pub direction: String,
    pub float_pnl: Decimal,
    #[serde(default)]
    pub margin: Decimal,
    pub current_price: Decimal,
    #[serde(default)]
    pub open_price: Decimal,
    #[serde(default)]
    pub volume: Decimal,
    #[serde(default)]
    pub yd_volume: Decimal,
    #[serde(default)]
    pub prev_settlement: Decimal,
    #[serde(default)]
    pub pnl: Decimal,
    #[serde(default)]
    pub frozen: Decimal,
    #[serde(default)]
    pub updatetime: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionsResponse {
    #[serde(default)]
    pub positions: Vec<Position>,
    #[serde(default)]
    pub update_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub accountid: String,
    pub code: String,
    #[serde(default)]
    pub exchange: String,
    pub direction: String,
    #[serde(default)]
    pub offset: String,
    pub price: Decimal,
    pub volume: Decimal,
    pub order_id: String,
    #[serde(rename = "type", default)]
    pub order_type: String,
    #[serde(default)]
    pub traded: Decimal,
    pub status: String,
    #[serde(default)]
    pub createtime: String,
    #[serde(default)]
    pub updatetime: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrdersResponse {
    #[serde(default)]
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TradeDate {
    pub current_date: String,
}
