use crate::query::FieldQuery;
use crate::request::SortOrder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bucket count returned by a terms aggregation when no size is given
pub const DEFAULT_TERMS_SIZE: usize = 10;

/// One node of an aggregation tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    #[serde(flatten)]
    pub kind: AggregationKind,

    /// Child aggregations, unique by name
    #[serde(
        default,
        alias = "aggregations",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub aggs: BTreeMap<String, Aggregation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    // Bucket aggregations
    Terms(TermsAgg),
    Histogram(HistogramAgg),

    // Metric aggregations
    Avg(FieldAgg),
    Sum(FieldAgg),
    Min(FieldAgg),
    Max(FieldAgg),
    ValueCount(FieldAgg),
}

impl AggregationKind {
    pub fn is_bucket(&self) -> bool {
        matches!(self, Self::Terms(_) | Self::Histogram(_))
    }

    pub fn field(&self) -> &str {
        match self {
            Self::Terms(t) => &t.field,
            Self::Histogram(h) => &h.field,
            Self::Avg(f) | Self::Sum(f) | Self::Min(f) | Self::Max(f) | Self::ValueCount(f) => {
                &f.field
            }
        }
    }

    /// Wire name of the aggregation kind
    pub fn name(&self) -> &'static str {
        match self {
            Self::Terms(_) => "terms",
            Self::Histogram(_) => "histogram",
            Self::Avg(_) => "avg",
            Self::Sum(_) => "sum",
            Self::Min(_) => "min",
            Self::Max(_) => "max",
            Self::ValueCount(_) => "value_count",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAgg {
    pub field: String,
}

/// Ordering of terms buckets: `{"_count" | "_key" | <metric name>: direction}`
pub type TermsOrder = FieldQuery<SortOrder>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermsAgg {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<TermsOrder>,
}

impl TermsAgg {
    pub fn effective_size(&self) -> usize {
        self.size.unwrap_or(DEFAULT_TERMS_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramAgg {
    pub field: String,
    pub interval: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_doc_count: Option<u64>,
}

/// Bucketing aggregation kinds accepted by [`Aggregation::bucket`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BucketKind {
    Terms,
    Histogram { interval: f64 },
}

/// Metric aggregation kinds accepted by [`Aggregation::metric`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Avg,
    Sum,
    Min,
    Max,
    ValueCount,
}
