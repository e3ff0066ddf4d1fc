/*
[INPUT]:  ChangeRecord per field, refresh interval
[OUTPUT]: Transient highlight class names and per-policy animation durations
[POS]:    Presentation mapping - pure derivation, no timers
[UPDATE]: When adding highlight styles or changing default durations
*/

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::value_change::{ChangeRecord, ChangeType};

pub const FIELD_HIGHLIGHT_DURATION: Duration = Duration::from_millis(2_000);
pub const ROW_HIGHLIGHT_DURATION: Duration = Duration::from_millis(3_001);
pub const SUMMARY_HIGHLIGHT_DURATION: Duration = Duration::from_millis(2_000);

/// Always present on generic fields so the transition itself can be styled.
pub const FIELD_BASE_CLASS: &str = "value-change-animation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightPolicy {
    Field,
    TableRow,
    SummaryFigure,
}

impl HighlightPolicy {
    pub fn default_duration(self) -> Duration {
        match self {
            HighlightPolicy::Field => FIELD_HIGHLIGHT_DURATION,
            HighlightPolicy::TableRow => ROW_HIGHLIGHT_DURATION,
            HighlightPolicy::SummaryFigure => SUMMARY_HIGHLIGHT_DURATION,
        }
    }

    /// The highlight class while animating, otherwise nothing.
    pub fn class(self, record: ChangeRecord) -> Option<&'static str> {
        if !record.is_animating {
            return None;
        }
        match (self, record.change_type) {
            (HighlightPolicy::Field, ChangeType::Increase) => Some("value-increase"),
            (HighlightPolicy::Field, ChangeType::Decrease) => Some("value-decrease"),
            (HighlightPolicy::TableRow, ChangeType::Increase) => Some("table-row-increase"),
            (HighlightPolicy::TableRow, ChangeType::Decrease) => Some("table-row-decrease"),
            (HighlightPolicy::SummaryFigure, ChangeType::Increase) => Some("stat-card-increase"),
            (HighlightPolicy::SummaryFigure, ChangeType::Decrease) => Some("stat-card-decrease"),
            (_, ChangeType::None) => None,
        }
    }

    /// Full class attribute: the field policy keeps its base class at rest.
    pub fn class_list(self, record: ChangeRecord) -> String {
        let highlight = self.class(record);
        match self {
            HighlightPolicy::Field => match highlight {
                Some(class) => format!("{FIELD_BASE_CLASS} {class}"),
                None => FIELD_BASE_CLASS.to_string(),
            },
            _ => highlight.unwrap_or_default().to_string(),
        }
    }
}

/// How long table row highlights last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RowHighlight {
    Fixed { duration_ms: u64 },
    /// Refresh interval plus a margin, so a highlight outlives one refresh cycle.
    FollowInterval { margin_ms: u64 },
}

impl Default for RowHighlight {
    fn default() -> Self {
        RowHighlight::Fixed {
            duration_ms: ROW_HIGHLIGHT_DURATION.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightTimings {
    #[serde(default = "default_field_ms")]
    pub field_ms: u64,
    #[serde(default = "default_summary_ms")]
    pub summary_ms: u64,
    #[serde(default)]
    pub row: RowHighlight,
}

impl Default for HighlightTimings {
    fn default() -> Self {
        Self {
            field_ms: default_field_ms(),
            summary_ms: default_summary_ms(),
            row: RowHighlight::default(),
        }
    }
}

fn default_field_ms() -> u64 {
    FIELD_HIGHLIGHT_DURATION.as_millis() as u64
}

fn default_summary_ms() -> u64 {
    SUMMARY_HIGHLIGHT_DURATION.as_millis() as u64
}

impl HighlightTimings {
    pub fn duration(&self, policy: HighlightPolicy, refresh_interval_ms: u64) -> Duration {
        match policy {
            HighlightPolicy::Field => Duration::from_millis(self.field_ms),
            HighlightPolicy::SummaryFigure => Duration::from_millis(self.summary_ms),
            HighlightPolicy::TableRow => match self.row {
                RowHighlight::Fixed { duration_ms } => Duration::from_millis(duration_ms),
                // With auto refresh off there is no cycle to follow.
                RowHighlight::FollowInterval { .. } if refresh_interval_ms == 0 => {
                    ROW_HIGHLIGHT_DURATION
                }
                RowHighlight::FollowInterval { margin_ms } => {
                    Duration::from_millis(refresh_interval_ms.saturating_add(margin_ms))
                }
            },
        }
    }
}
