//! Per-metric combination rules.
//!
//! Each function takes `(weight, value)` points - one per child - where the
//! value is `None` when the child does not carry the metric (absent key or
//! the undetermined sentinel).

use lookthrough_model::MetricValue;

/// Weighted average for score/percentage metrics.
///
/// `sum(value * weight) / sum(weight)` over children that carry the metric
/// and have a positive weight. Children missing the metric are excluded from
/// both numerator and denominator - a parent is not penalized because one
/// child has incomplete data. Zero/absent-weight children are likewise
/// excluded (they declare no contribution).
///
/// Returns [`MetricValue::Undetermined`] when no child qualifies.
#[must_use]
pub fn weighted_average(points: &[(f64, Option<f64>)]) -> MetricValue {
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for &(weight, value) in points {
        if weight <= 0.0 {
            continue;
        }
        if let Some(v) = value {
            numerator += v * weight;
            denominator += weight;
        }
    }
    if denominator > 0.0 {
        MetricValue::Value(numerator / denominator)
    } else {
        MetricValue::Undetermined
    }
}

/// Weighted sum for absolute additive quantities (emissions, water usage,
/// beneficiary counts).
///
/// `sum(value * weight)`; a child without the metric contributes zero (it
/// provides no known additional burden or benefit - the consistency
/// validator flags the gap, the sum does not guess).
///
/// Returns [`MetricValue::Undetermined`] when no child carries the metric at
/// all, so "no data" stays distinguishable from "measured zero".
#[must_use]
pub fn weighted_sum(points: &[(f64, Option<f64>)]) -> MetricValue {
    let mut total = 0.0;
    let mut any_present = false;
    for &(weight, value) in points {
        if let Some(v) = value {
            any_present = true;
            total += v * weight;
        }
    }
    if any_present {
        MetricValue::Value(total)
    } else {
        MetricValue::Undetermined
    }
}

/// Carbon intensity recompute: parent-aggregated emissions divided by the
/// parent's own scale denominator (AUM for funds, revenue for companies).
///
/// Averaging child intensities directly mixes ratios with different
/// denominators; recomputing from the aggregated numerator avoids that
/// distortion. Undetermined emissions or a missing/non-positive denominator
/// yield [`MetricValue::Undetermined`].
#[must_use]
pub fn recompute_intensity(total_emissions: MetricValue, scale: Option<f64>) -> MetricValue {
    match (total_emissions, scale) {
        (MetricValue::Value(emissions), Some(denominator)) if denominator > 0.0 => {
            MetricValue::Value(emissions / denominator)
        }
        _ => MetricValue::Undetermined,
    }
}
