//! Metric vocabulary, combination-kind dispatch, and the undetermined sentinel.
//!
//! The snapshot map is open: unknown keys are carried through and combined
//! under the default rule. Known keys resolve to a [`MetricKind`] so that
//! combination logic dispatches on a type tag rather than matching field-name
//! strings inline.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::RangeInclusive;

/// Permitted deviation of a parent's declared child weight sum from 1.0.
///
/// Within the band the parent is considered consistent; beyond it the parent
/// is flagged by the consistency validator but still aggregated best-effort.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// Name of one metric in a snapshot map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricKey(pub String);

impl MetricKey {
    pub const ENVIRONMENTAL_SCORE: &'static str = "environmental_score";
    pub const SOCIAL_SCORE: &'static str = "social_score";
    pub const GOVERNANCE_SCORE: &'static str = "governance_score";
    pub const ESG_COMPOSITE: &'static str = "esg_composite";
    pub const RENEWABLE_ENERGY_PCT: &'static str = "renewable_energy_pct";
    pub const COMPLIANCE_READINESS_PCT: &'static str = "compliance_readiness_pct";
    pub const CARBON_SCOPE_1: &'static str = "carbon_scope_1";
    pub const CARBON_SCOPE_2: &'static str = "carbon_scope_2";
    pub const CARBON_SCOPE_3: &'static str = "carbon_scope_3";
    pub const CARBON_IMPACT_TCO2E: &'static str = "carbon_impact_tco2e";
    pub const WATER_USAGE_M3: &'static str = "water_usage_m3";
    pub const BENEFICIARIES: &'static str = "beneficiaries";
    pub const CARBON_INTENSITY: &'static str = "carbon_intensity";

    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Combination kind for this key.
    ///
    /// Unknown keys default to [`MetricKind::WeightedAverage`], the rule for
    /// score/ratio-shaped metrics.
    #[must_use]
    pub fn kind(&self) -> MetricKind {
        match self.0.as_str() {
            Self::CARBON_SCOPE_1
            | Self::CARBON_SCOPE_2
            | Self::CARBON_SCOPE_3
            | Self::CARBON_IMPACT_TCO2E
            | Self::WATER_USAGE_M3
            | Self::BENEFICIARIES => MetricKind::WeightedSum,
            Self::CARBON_INTENSITY => MetricKind::Intensity,
            _ => MetricKind::WeightedAverage,
        }
    }

    /// Declared valid range, if this key has one.
    ///
    /// Scores and percentages live in `[0, 100]`; additive quantities must
    /// not be negative. Unknown keys have no declared range.
    #[must_use]
    pub fn valid_range(&self) -> Option<RangeInclusive<f64>> {
        match self.0.as_str() {
            Self::ENVIRONMENTAL_SCORE
            | Self::SOCIAL_SCORE
            | Self::GOVERNANCE_SCORE
            | Self::ESG_COMPOSITE
            | Self::RENEWABLE_ENERGY_PCT
            | Self::COMPLIANCE_READINESS_PCT => Some(0.0..=100.0),
            Self::CARBON_SCOPE_1
            | Self::CARBON_SCOPE_2
            | Self::CARBON_SCOPE_3
            | Self::CARBON_IMPACT_TCO2E
            | Self::WATER_USAGE_M3
            | Self::BENEFICIARIES => Some(0.0..=f64::MAX),
            _ => None,
        }
    }

}

impl From<&str> for MetricKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for MetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Combination rule applied when deriving a parent metric from children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    /// Score/percentage metrics: weighted mean over children that carry the
    /// metric (missing children excluded from numerator and denominator).
    WeightedAverage,
    /// Absolute additive quantities: weighted sum, missing children
    /// contribute zero.
    WeightedSum,
    /// Ratio metrics recomputed at the parent from aggregated emissions and
    /// the parent's own scale denominator, never averaged directly.
    Intensity,
}

/// A metric observation: either a numeric value or the explicit sentinel
/// distinguishing "no data available" from "measured zero impact".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Value(f64),
    Undetermined,
}

impl MetricValue {
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Undetermined => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_undetermined(&self) -> bool {
        matches!(self, Self::Undetermined)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        Self::Value(v)
    }
}

// Wire form: numbers stay numbers, the sentinel is the string "undetermined".
impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => serializer.serialize_f64(*v),
            Self::Undetermined => serializer.serialize_str("undetermined"),
        }
    }
}

impl<'de> Deserialize<'de> for MetricValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MetricValueVisitor;

        impl Visitor<'_> for MetricValueVisitor {
            type Value = MetricValue;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a number, null, or the string \"undetermined\"")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(MetricValue::Value(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                #[allow(clippy::cast_precision_loss)]
                Ok(MetricValue::Value(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                #[allow(clippy::cast_precision_loss)]
                Ok(MetricValue::Value(v as f64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                if v == "undetermined" {
                    Ok(MetricValue::Undetermined)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(MetricValue::Undetermined)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(MetricValue::Undetermined)
            }
        }

        deserializer.deserialize_any(MetricValueVisitor)
    }
}
