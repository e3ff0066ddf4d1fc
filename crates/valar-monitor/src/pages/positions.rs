/*
[INPUT]:  PositionsResponse snapshots for the selected accounts
[OUTPUT]: Position rows with row highlights on floating PnL and field highlights on price
[POS]:    Page layer - positions table
[UPDATE]: When changing row identity or highlighted columns
*/

use std::collections::HashSet;
use std::fmt;

use rust_decimal::Decimal;
use valar_refresh::{ChangeTracker, ChangeType, HighlightPolicy, RefreshRoute};

use super::{FetchSource, HighlightContext, PageModel};
use crate::api::{self, Position, PositionsResponse};
use crate::render;

/// Stable row identity across refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionKey {
    pub account: String,
    pub code: String,
    pub direction: String,
}

impl PositionKey {
    pub fn of(position: &Position) -> Self {
        Self {
            // Single-account responses omit the account id.
            account: position
                .accountid
                .clone()
                .unwrap_or_else(|| "single".to_string()),
            code: position.code.clone(),
            direction: position.direction.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionColumn {
    FloatPnl,
    CurrentPrice,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionRow {
    pub key: PositionKey,
    pub position: Position,
    pub row_change: ChangeType,
    pub row_class: Option<&'static str>,
    pub price_change: ChangeType,
    pub price_highlight: Option<&'static str>,
    /// Full class list of the price cell, base class included
    pub price_class: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionsView {
    pub rows: Vec<PositionRow>,
    pub update_time: String,
}

impl PositionsView {
    pub fn row(&self, key: &PositionKey) -> Option<&PositionRow> {
        self.rows.iter().find(|row| &row.key == key)
    }

    pub fn total_float_pnl(&self) -> Decimal {
        self.rows.iter().map(|row| row.position.float_pnl).sum()
    }
}

#[derive(Debug, Default)]
pub struct PositionsPage {
    positions: Vec<Position>,
    update_time: String,
}

impl PageModel for PositionsPage {
    type Data = PositionsResponse;
    type Key = (PositionKey, PositionColumn);
    type View = PositionsView;

    const ROUTE: RefreshRoute = RefreshRoute::Positions;
    const REQUIRES_ACCOUNTS: bool = true;

    async fn fetch(source: &FetchSource, accounts: &[String]) -> api::Result<PositionsResponse> {
        source.client.positions(accounts).await
    }

    fn apply(
        &mut self,
        data: PositionsResponse,
        tracker: &mut ChangeTracker<Self::Key>,
        highlight: &HighlightContext,
    ) {
        let row_duration = highlight.duration(HighlightPolicy::TableRow);
        let field_duration = highlight.duration(HighlightPolicy::Field);

        let mut present = HashSet::with_capacity(data.positions.len());
        for position in &data.positions {
            let key = PositionKey::of(position);
            tracker.observe(
                (key.clone(), PositionColumn::FloatPnl),
                position.float_pnl,
                row_duration,
            );
            tracker.observe(
                (key.clone(), PositionColumn::CurrentPrice),
                position.current_price,
                field_duration,
            );
            present.insert(key);
        }
        // Rows that left the table take their timers with them.
        tracker.retain(|(key, _)| present.contains(key));

        self.positions = data.positions;
        self.update_time = data.update_time;
    }

    fn clear(&mut self, tracker: &mut ChangeTracker<Self::Key>) {
        self.positions.clear();
        self.update_time.clear();
        tracker.clear();
    }

    fn view(&self, tracker: &ChangeTracker<Self::Key>) -> PositionsView {
        let rows = self
            .positions
            .iter()
            .map(|position| {
                let key = PositionKey::of(position);
                let row = tracker.record(&(key.clone(), PositionColumn::FloatPnl));
                let price = tracker.record(&(key.clone(), PositionColumn::CurrentPrice));
                PositionRow {
                    key,
                    position: position.clone(),
                    row_change: row.change_type,
                    row_class: HighlightPolicy::TableRow.class(row),
                    price_change: price.change_type,
                    price_highlight: HighlightPolicy::Field.class(price),
                    price_class: HighlightPolicy::Field.class_list(price),
                }
            })
            .collect();

        PositionsView {
            rows,
            update_time: self.update_time.clone(),
        }
    }
}

impl fmt::Display for PositionsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return writeln!(f, "  (no positions)");
        }
        writeln!(
            f,
            "  {:<12} {:<10} {:<4} {:>8} {:>14} {:>16}",
            "account", "code", "dir", "volume", "price", "float pnl"
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "  {:<12} {:<10} {:<4} {:>8} {:>14} {:>16}",
                row.key.account,
                row.key.code,
                row.key.direction,
                row.position.volume,
                render::highlighted(row.position.current_price, row.price_change, row.price_highlight),
                render::highlighted(row.position.float_pnl, row.row_change, row.row_class),
            )?;
        }
        writeln!(
            f,
            "  total float pnl: {}  updated: {}",
            self.total_float_pnl(),
            self.update_time
        )
    }
}
