/*
[INPUT]:  Order lists for the selected accounts and trade date
[OUTPUT]: Order rows with fill-progress highlights and status classes
[POS]:    Page layer - orders table
[UPDATE]: When changing row identity, status mapping or trade date handling
*/

use std::collections::HashSet;
use std::fmt;

use tracing::warn;
use valar_refresh::{ChangeTracker, ChangeType, HighlightPolicy, RefreshRoute};

use super::{FetchSource, HighlightContext, PageModel};
use crate::api::{self, Order};
use crate::render;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderKey {
    pub account: String,
    pub order_id: String,
}

impl OrderKey {
    pub fn of(order: &Order) -> Self {
        Self {
            account: order.accountid.clone(),
            order_id: order.order_id.clone(),
        }
    }
}

/// Static row class derived from the broker's status text.
pub fn status_class(status: &str) -> Option<&'static str> {
    match status {
        "全部成交" => Some("order-filled"),
        "部分成交" => Some("order-partial"),
        "已撤销" => Some("order-cancelled"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    pub key: OrderKey,
    pub order: Order,
    pub status_class: Option<&'static str>,
    pub fill_change: ChangeType,
    pub highlight: Option<&'static str>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrdersView {
    pub rows: Vec<OrderRow>,
}

impl OrdersView {
    pub fn row(&self, key: &OrderKey) -> Option<&OrderRow> {
        self.rows.iter().find(|row| &row.key == key)
    }
}

#[derive(Debug, Default)]
pub struct OrdersPage {
    orders: Vec<Order>,
}

impl PageModel for OrdersPage {
    type Data = Vec<Order>;
    type Key = OrderKey;
    type View = OrdersView;

    const ROUTE: RefreshRoute = RefreshRoute::Orders;
    const REQUIRES_ACCOUNTS: bool = true;

    async fn fetch(source: &FetchSource, accounts: &[String]) -> api::Result<Vec<Order>> {
        if accounts.is_empty() {
            return Ok(Vec::new());
        }
        let trade_date = match &source.trade_date {
            Some(date) => Some(date.clone()),
            None => match source.client.current_trade_date().await {
                Ok(date) => Some(date),
                Err(err) => {
                    warn!(error = %err, "failed to resolve trade date; fetching without it");
                    None
                }
            },
        };
        source.client.orders(accounts, trade_date.as_deref()).await
    }

    fn apply(
        &mut self,
        data: Vec<Order>,
        tracker: &mut ChangeTracker<OrderKey>,
        highlight: &HighlightContext,
    ) {
        let duration = highlight.duration(HighlightPolicy::TableRow);
        let mut present = HashSet::with_capacity(data.len());
        for order in &data {
            let key = OrderKey::of(order);
            tracker.observe(key.clone(), order.traded, duration);
            present.insert(key);
        }
        tracker.retain(|key| present.contains(key));
        self.orders = data;
    }

    fn clear(&mut self, tracker: &mut ChangeTracker<OrderKey>) {
        self.orders.clear();
        tracker.clear();
    }

    fn view(&self, tracker: &ChangeTracker<OrderKey>) -> OrdersView {
        let rows = self
            .orders
            .iter()
            .map(|order| {
                let key = OrderKey::of(order);
                let record = tracker.record(&key);
                OrderRow {
                    key,
                    order: order.clone(),
                    status_class: status_class(&order.status),
                    fill_change: record.change_type,
                    highlight: HighlightPolicy::TableRow.class(record),
                }
            })
            .collect();
        OrdersView { rows }
    }
}

impl fmt::Display for OrdersView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return writeln!(f, "  (no orders)");
        }
        writeln!(
            f,
            "  {:<12} {:<14} {:<10} {:<4} {:>12} {:>8} {:>10}  status",
            "account", "order", "code", "dir", "price", "volume", "traded"
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "  {:<12} {:<14} {:<10} {:<4} {:>12} {:>8} {:>10}  {}",
                row.key.account,
                row.key.order_id,
                row.order.code,
                row.order.direction,
                row.order.price,
                row.order.volume,
                render::highlighted(row.order.traded, row.fill_change, row.highlight),
                row.order.status,
            )?;
        }
        Ok(())
    }
}
