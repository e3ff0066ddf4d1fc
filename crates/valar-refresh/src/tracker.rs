/*
[INPUT]:  Field samples keyed by stable identity (row key + column)
[OUTPUT]: Per-field ChangeRecords and revert notifications
[POS]:    Change detection - detector arena sharing one timer queue
[UPDATE]: When changing field identity, teardown rules or revert scheduling
*/

use std::collections::HashMap;
use std::future;
use std::hash::Hash;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio_util::time::{DelayQueue, delay_queue};

use crate::value_change::{ChangeRecord, RevertAction, ValueChangeDetector};

#[derive(Debug)]
struct TrackedField {
    detector: ValueChangeDetector,
    revert_key: Option<delay_queue::Key>,
}

/// Detectors for many fields, with every pending revert in a single `DelayQueue`.
///
/// Each field holds at most one queue entry. The owner drives reverts by awaiting
/// [`ChangeTracker::next_revert`], typically in the same `select!` loop that
/// applies fetch results, so all mutation happens on one task.
#[derive(Debug)]
pub struct ChangeTracker<K> {
    fields: HashMap<K, TrackedField>,
    reverts: DelayQueue<K>,
    precision: u32,
}

impl<K> ChangeTracker<K>
where
    K: Clone + Eq + Hash,
{
    pub fn new(precision: u32) -> Self {
        Self {
            fields: HashMap::new(),
            reverts: DelayQueue::new(),
            precision,
        }
    }

    pub fn observe(&mut self, key: K, value: Decimal, animation: Duration) -> ChangeRecord {
        let precision = self.precision;
        let field = self
            .fields
            .entry(key.clone())
            .or_insert_with(|| TrackedField {
                detector: ValueChangeDetector::new(precision),
                revert_key: None,
            });

        match field.detector.observe(value, animation) {
            RevertAction::Keep => {}
            RevertAction::Cancel => {
                if let Some(pending) = field.revert_key.take() {
                    self.reverts.try_remove(&pending);
                }
            }
            RevertAction::Restart(duration) => {
                if let Some(pending) = field.revert_key.take() {
                    self.reverts.try_remove(&pending);
                }
                field.revert_key = Some(self.reverts.insert(key, duration));
            }
        }

        field.detector.record()
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Change the comparison precision for tracked and future fields.
    ///
    /// Baselines and pending reverts are kept; the next observation of each field
    /// compares at the new precision.
    pub fn set_precision(&mut self, precision: u32) {
        self.precision = precision;
        for field in self.fields.values_mut() {
            field.detector.set_precision(precision);
        }
    }

    /// Current state of a field; untracked fields are at rest.
    pub fn record(&self, key: &K) -> ChangeRecord {
        self.fields
            .get(key)
            .map(|field| field.detector.record())
            .unwrap_or_default()
    }

    pub fn is_tracked(&self, key: &K) -> bool {
        self.fields.contains_key(key)
    }

    /// Tear down one field and its pending revert.
    pub fn release(&mut self, key: &K) -> bool {
        let Some(field) = self.fields.remove(key) else {
            return false;
        };
        if let Some(pending) = field.revert_key {
            self.reverts.try_remove(&pending);
        }
        true
    }

    /// Tear down every field for which `keep` is false.
    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) {
        let gone: Vec<K> = self
            .fields
            .keys()
            .filter(|key| !keep(key))
            .cloned()
            .collect();
        for key in gone {
            self.release(&key);
        }
    }

    pub fn clear(&mut self) {
        self.fields.clear();
        self.reverts.clear();
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn pending_reverts(&self) -> usize {
        self.reverts.len()
    }

    /// Wait for the next revert timer, apply it and return the field's key.
    ///
    /// Never resolves while nothing is pending. Cancel-safe: dropping the future
    /// before it resolves loses no revert.
    pub async fn next_revert(&mut self) -> K {
        let expired = future::poll_fn(|cx| self.reverts.poll_expired(cx)).await;
        let Some(expired) = expired else {
            return future::pending().await;
        };

        let key = expired.into_inner();
        if let Some(field) = self.fields.get_mut(&key) {
            field.revert_key = None;
            field.detector.revert();
        }
        key
    }
}
