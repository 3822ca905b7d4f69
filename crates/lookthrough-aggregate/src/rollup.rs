//! Whole-snapshot aggregation.

use crate::combine::{recompute_intensity, weighted_average, weighted_sum};
use lookthrough_model::{MetricKey, MetricKind, MetricSnapshot, MetricValue};
use std::collections::BTreeSet;

/// One child's contribution to a parent aggregation: the edge weight and the
/// child's (already current for this pass) snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ChildMetrics<'a> {
    pub weight: f64,
    pub snapshot: &'a MetricSnapshot,
}

impl<'a> ChildMetrics<'a> {
    #[inline]
    #[must_use]
    pub fn new(weight: f64, snapshot: &'a MetricSnapshot) -> Self {
        Self { weight, snapshot }
    }
}

/// Derive a parent snapshot from its weighted children.
///
/// Operates over the union of the children's metric keys, dispatching each
/// key by its [`MetricKind`]. Intensity keys are never combined directly:
/// they are recomputed last from the already-aggregated emissions total and
/// the parent's own `scale` denominator.
///
/// A key no child can determine comes out as an explicit
/// [`MetricValue::Undetermined`] entry, not an omission, so downstream
/// consumers can tell "no data" from "no impact". With no children at all the
/// result is an empty snapshot.
#[must_use]
pub fn aggregate_children(children: &[ChildMetrics<'_>], scale: Option<f64>) -> MetricSnapshot {
    let mut keys: BTreeSet<MetricKey> = BTreeSet::new();
    for child in children {
        keys.extend(child.snapshot.metrics.keys().cloned());
    }

    let mut result = MetricSnapshot::new();
    let mut saw_intensity = false;

    for key in &keys {
        match key.kind() {
            MetricKind::WeightedAverage => {
                let points = points_for(children, key);
                result.set(key.clone(), weighted_average(&points));
            }
            MetricKind::WeightedSum => {
                let points = points_for(children, key);
                result.set(key.clone(), weighted_sum(&points));
            }
            MetricKind::Intensity => saw_intensity = true,
        }
    }

    // Intensity is derived from the parent's aggregated emissions, so it is
    // recomputed whenever children report either emissions or an intensity.
    let emissions_key = MetricKey::from(MetricKey::CARBON_IMPACT_TCO2E);
    if saw_intensity || result.metrics.contains_key(&emissions_key) {
        let total = result
            .get(&emissions_key)
            .unwrap_or(MetricValue::Undetermined);
        result.set(
            MetricKey::from(MetricKey::CARBON_INTENSITY),
            recompute_intensity(total, scale),
        );
    }

    result
}

fn points_for(children: &[ChildMetrics<'_>], key: &MetricKey) -> Vec<(f64, Option<f64>)> {
    children
        .iter()
        .map(|c| (c.weight, c.snapshot.value(key)))
        .collect()
}
