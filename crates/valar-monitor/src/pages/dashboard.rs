/*
[INPUT]:  DashboardSummary snapshots
[OUTPUT]: Summary figures with stat-card highlights
[POS]:    Page layer - dashboard
[UPDATE]: When adding summary figures
*/

use std::fmt;

use rust_decimal::Decimal;
use valar_refresh::{ChangeTracker, ChangeType, HighlightPolicy, RefreshRoute};

use super::{FetchSource, HighlightContext, PageModel};
use crate::api::{self, DashboardSummary};
use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummaryField {
    TotalBalance,
    NetProfit,
    TotalMargin,
    AvailableFunds,
}

impl SummaryField {
    pub const ALL: [SummaryField; 4] = [
        SummaryField::TotalBalance,
        SummaryField::NetProfit,
        SummaryField::TotalMargin,
        SummaryField::AvailableFunds,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SummaryField::TotalBalance => "Total balance",
            SummaryField::NetProfit => "Net profit",
            SummaryField::TotalMargin => "Total margin",
            SummaryField::AvailableFunds => "Available funds",
        }
    }

    fn value(self, summary: &DashboardSummary) -> Decimal {
        match self {
            SummaryField::TotalBalance => summary.total_balance,
            SummaryField::NetProfit => summary.net_profit,
            SummaryField::TotalMargin => summary.total_margin,
            SummaryField::AvailableFunds => summary.available_funds,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub field: SummaryField,
    pub value: Decimal,
    pub change: ChangeType,
    pub class: Option<&'static str>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardView {
    pub figures: Vec<Figure>,
    pub profit_rate: Option<Decimal>,
    pub accounts_count: u32,
    pub update_time: String,
}

impl DashboardView {
    pub fn figure(&self, field: SummaryField) -> Option<&Figure> {
        self.figures.iter().find(|figure| figure.field == field)
    }
}

#[derive(Debug, Default)]
pub struct DashboardPage {
    summary: Option<DashboardSummary>,
}

impl PageModel for DashboardPage {
    type Data = DashboardSummary;
    type Key = SummaryField;
    type View = DashboardView;

    const ROUTE: RefreshRoute = RefreshRoute::Dashboard;
    const REQUIRES_ACCOUNTS: bool = false;

    async fn fetch(source: &FetchSource, accounts: &[String]) -> api::Result<DashboardSummary> {
        source.client.summary(accounts).await
    }

    fn apply(
        &mut self,
        data: DashboardSummary,
        tracker: &mut ChangeTracker<SummaryField>,
        highlight: &HighlightContext,
    ) {
        let duration = highlight.duration(HighlightPolicy::SummaryFigure);
        for field in SummaryField::ALL {
            tracker.observe(field, field.value(&data), duration);
        }
        self.summary = Some(data);
    }

    fn clear(&mut self, tracker: &mut ChangeTracker<SummaryField>) {
        self.summary = None;
        tracker.clear();
    }

    fn view(&self, tracker: &ChangeTracker<SummaryField>) -> DashboardView {
        let Some(summary) = &self.summary else {
            return DashboardView::default();
        };

        let figures = SummaryField::ALL
            .into_iter()
            .map(|field| {
                let record = tracker.record(&field);
                Figure {
                    field,
                    value: field.value(summary),
                    change: record.change_type,
                    class: HighlightPolicy::SummaryFigure.class(record),
                }
            })
            .collect();

        DashboardView {
            figures,
            profit_rate: Some(summary.profit_rate),
            accounts_count: summary.accounts_count,
            update_time: summary.update_time.clone(),
        }
    }
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.figures.is_empty() {
            return writeln!(f, "  (no summary loaded)");
        }
        for figure in &self.figures {
            writeln!(
                f,
                "  {:<16} {}",
                figure.field.label(),
                render::highlighted(figure.value, figure.change, figure.class)
            )?;
        }
        if let Some(rate) = self.profit_rate {
            writeln!(f, "  {:<16} {}%", "Profit rate", rate.round_dp(2))?;
        }
        writeln!(
            f,
            "  accounts: {}  updated: {}",
            self.accounts_count, self.update_time
        )
    }
}
