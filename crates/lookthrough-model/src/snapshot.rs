//! Sustainability metric snapshots.
//!
//! A snapshot is the open map of named metrics persisted on every entity
//! document as `sustainability_metrics`. Project snapshots are authored;
//! company and fund snapshots are derived by the propagation engine and carry
//! the pass marker of the run that produced them.

use crate::ids::PassId;
use crate::metrics::{MetricKey, MetricValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entity's sustainability metric snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Open map of named metrics. `BTreeMap` keeps iteration (and therefore
    /// aggregation and serialization) order deterministic.
    #[serde(default)]
    pub metrics: BTreeMap<MetricKey, MetricValue>,

    /// Propagation pass that derived this snapshot. `None` for authored
    /// (project-level) snapshots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<PassId>,

    /// "Last propagated at" marker stamped by the deriving run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_at: Option<DateTime<Utc>>,
}

impl MetricSnapshot {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a metric value (builder style, used heavily by fixtures).
    #[must_use]
    pub fn with(mut self, key: impl Into<MetricKey>, value: impl Into<MetricValue>) -> Self {
        self.metrics.insert(key.into(), value.into());
        self
    }

    /// Insert or overwrite a metric value.
    #[inline]
    pub fn set(&mut self, key: MetricKey, value: MetricValue) {
        self.metrics.insert(key, value);
    }

    /// Look up a metric by key.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &MetricKey) -> Option<MetricValue> {
        self.metrics.get(key).copied()
    }

    /// Numeric value for a key, `None` when absent or undetermined.
    #[inline]
    #[must_use]
    pub fn value(&self, key: &MetricKey) -> Option<f64> {
        self.get(key).and_then(|v| v.as_f64())
    }

    /// Stamp the snapshot with the run that derived it.
    #[must_use]
    pub fn stamped(mut self, pass: PassId, computed_at: DateTime<Utc>) -> Self {
        self.pass = Some(pass);
        self.computed_at = Some(computed_at);
        self
    }

    /// Whether every metric in this snapshot is the undetermined sentinel.
    ///
    /// An empty snapshot counts as all-undetermined: it carries no data.
    #[must_use]
    pub fn all_undetermined(&self) -> bool {
        self.metrics.values().all(MetricValue::is_undetermined)
    }

    /// Whether at least one metric carries a numeric value.
    #[inline]
    #[must_use]
    pub fn has_data(&self) -> bool {
        !self.all_undetermined() && !self.metrics.is_empty()
    }

    /// The metric maps of two snapshots are identical, ignoring pass markers.
    ///
    /// This is the equality that idempotence guarantees: re-running
    /// propagation on unchanged leaf data yields a new pass id but
    /// bit-identical metric values.
    #[must_use]
    pub fn same_metrics(&self, other: &Self) -> bool {
        self.metrics == other.metrics
    }
}
