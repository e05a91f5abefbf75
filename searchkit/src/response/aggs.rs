use crate::error::Error;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Result of one named aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AggregationResult {
    Buckets(BucketsResult),
    Value(MetricValue),
}

impl AggregationResult {
    pub fn buckets(&self) -> Option<&[Bucket]> {
        match self {
            AggregationResult::Buckets(b) => Some(&b.buckets),
            AggregationResult::Value(_) => None,
        }
    }

    /// Scalar value of a metric aggregation; `None` for buckets or empty input
    pub fn value(&self) -> Option<f64> {
        match self {
            AggregationResult::Value(v) => v.value,
            AggregationResult::Buckets(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketsResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_count_error_upper_bound: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum_other_doc_count: Option<u64>,
    pub buckets: Vec<Bucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_as_string: Option<String>,
}

/// One group of a bucketing aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub key: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_as_string: Option<String>,
    pub doc_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<f64>,
    /// Child aggregations keyed by name
    #[serde(flatten)]
    pub sub_aggs: BTreeMap<String, AggregationResult>,
}

impl Bucket {
    pub fn key(&self) -> &Value {
        &self.key
    }

    /// String form of the key: the key itself for strings, else `key_as_string`
    pub fn key_as_str(&self) -> Option<&str> {
        self.key.as_str().or(self.key_as_string.as_deref())
    }

    pub fn key_as_f64(&self) -> Option<f64> {
        self.key.as_f64()
    }

    pub fn doc_count(&self) -> u64 {
        self.doc_count
    }

    /// Value of a child metric, e.g. `average_balance`
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.sub_aggs.get(name).and_then(AggregationResult::value)
    }

    /// Every child metric by name
    pub fn metrics(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.sub_aggs.iter().filter_map(|(name, result)| match result {
            AggregationResult::Value(v) => Some((name.as_str(), v.value)),
            AggregationResult::Buckets(_) => None,
        })
    }

    /// Buckets of a nested bucketing aggregation
    pub fn buckets_of(&self, name: &str) -> Result<&[Bucket]> {
        self.sub_aggs
            .get(name)
            .and_then(AggregationResult::buckets)
            .ok_or_else(|| Error::NotFound(format!("sub-aggregation '{}'", name)))
    }
}
