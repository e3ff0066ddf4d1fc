/*
[INPUT]:  Successive samples of one numeric field
[OUTPUT]: Increase/decrease/none classification and revert timer instructions
[POS]:    Change detection - per-field state machine (timers live in ChangeTracker)
[UPDATE]: When changing rounding rules or highlight state transitions
*/

use std::time::Duration;

use rust_decimal::{Decimal, RoundingStrategy};

pub const DEFAULT_PRECISION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeType {
    Increase,
    Decrease,
    #[default]
    None,
}

/// Highlight state of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeRecord {
    pub change_type: ChangeType,
    pub is_animating: bool,
}

/// What the owner must do with the field's revert timer after an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertAction {
    /// Baseline sample; no timer can be pending yet.
    Keep,
    /// Cancel any pending revert and arm a new one for this long.
    Restart(Duration),
    /// Cancel any pending revert.
    Cancel,
}

#[derive(Debug, Clone)]
pub struct ValueChangeDetector {
    previous: Option<Decimal>,
    precision: u32,
    record: ChangeRecord,
}

impl ValueChangeDetector {
    pub fn new(precision: u32) -> Self {
        Self {
            previous: None,
            precision,
            record: ChangeRecord::default(),
        }
    }

    pub fn record(&self) -> ChangeRecord {
        self.record
    }

    pub fn previous(&self) -> Option<Decimal> {
        self.previous
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Applies from the next observation on; the baseline is kept.
    pub fn set_precision(&mut self, precision: u32) {
        self.precision = precision;
    }

    pub fn observe(&mut self, value: Decimal, animation: Duration) -> RevertAction {
        let Some(previous) = self.previous.replace(value) else {
            return RevertAction::Keep;
        };

        let current = round(value, self.precision);
        let previous = round(previous, self.precision);
        let change_type = if current > previous {
            ChangeType::Increase
        } else if current < previous {
            ChangeType::Decrease
        } else {
            ChangeType::None
        };

        match change_type {
            ChangeType::None => {
                self.record = ChangeRecord {
                    change_type,
                    is_animating: false,
                };
                RevertAction::Cancel
            }
            _ => {
                self.record = ChangeRecord {
                    change_type,
                    is_animating: true,
                };
                RevertAction::Restart(animation)
            }
        }
    }

    /// The revert timer fired.
    pub fn revert(&mut self) {
        self.record = ChangeRecord::default();
    }
}

impl Default for ValueChangeDetector {
    fn default() -> Self {
        Self::new(DEFAULT_PRECISION)
    }
}

fn round(value: Decimal, precision: u32) -> Decimal {
    value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero)
}
