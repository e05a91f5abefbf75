//! Search responses and their accessors

mod aggs;
mod hit;

pub use aggs::{AggregationResult, Bucket, BucketsResult, MetricValue};
pub use hit::Hit;
pub(crate) use hit::lookup;

use crate::error::{Error, ExecutorError};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Search response snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub took: u64,
    #[serde(default)]
    pub timed_out: bool,
    #[serde(rename = "_shards", default)]
    pub shards: ShardStats,
    pub hits: HitsResponse,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aggregations: BTreeMap<String, AggregationResult>,

    /// Aggregation names the originating request asked for
    #[serde(skip)]
    requested: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardStats {
    pub total: u32,
    pub successful: u32,
    pub skipped: u32,
    pub failed: u32,
}

impl Default for ShardStats {
    fn default() -> Self {
        Self {
            total: 1,
            successful: 1,
            skipped: 0,
            failed: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HitsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<TotalHits>,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub hits: Vec<Hit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalHits {
    pub value: u64,
    pub relation: TotalRelation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TotalRelation {
    #[serde(rename = "eq")]
    Exact,
    #[serde(rename = "gte")]
    LowerBound,
}

impl SearchResponse {
    /// Assemble a response snapshot; mainly used by executors
    pub fn new(
        took: u64,
        hits: HitsResponse,
        aggregations: BTreeMap<String, AggregationResult>,
    ) -> Self {
        Self {
            took,
            timed_out: false,
            shards: ShardStats::default(),
            hits,
            aggregations,
            requested: BTreeSet::new(),
        }
    }

    /// Decode a raw engine payload, remembering which aggregations were requested
    pub fn from_json<I, S>(raw: Value, requested: I) -> std::result::Result<Self, ExecutorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut response: SearchResponse = serde_json::from_value(raw)?;
        response.requested = requested.into_iter().map(Into::into).collect();
        Ok(response)
    }

    /// Hits in the order the engine returned them
    pub fn hits(&self) -> std::slice::Iter<'_, Hit> {
        self.hits.hits.iter()
    }

    pub fn into_hits(self) -> Vec<Hit> {
        self.hits.hits
    }

    /// Number of hits in this page
    pub fn len(&self) -> usize {
        self.hits.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.hits.is_empty()
    }

    /// Total matching documents as reported by the engine
    pub fn total(&self) -> Option<u64> {
        self.hits.total.map(|t| t.value)
    }

    pub fn took(&self) -> u64 {
        self.took
    }

    /// Raw result of a requested aggregation
    pub fn aggregation(&self, name: &str) -> Result<&AggregationResult> {
        if !self.requested.contains(name) {
            return Err(Error::NotFound(format!(
                "aggregation '{}' was not requested",
                name
            )));
        }
        self.aggregations.get(name).ok_or_else(|| {
            Error::NotFound(format!("aggregation '{}' missing from response", name))
        })
    }

    /// Buckets of a requested bucketing aggregation
    pub fn buckets_of(&self, name: &str) -> Result<&[Bucket]> {
        self.aggregation(name)?
            .buckets()
            .ok_or_else(|| Error::NotFound(format!("aggregation '{}' has no buckets", name)))
    }

    /// Value of a requested top-level metric aggregation
    pub fn metric_value(&self, name: &str) -> Result<Option<f64>> {
        match self.aggregation(name)? {
            AggregationResult::Value(v) => Ok(v.value),
            AggregationResult::Buckets(_) => Err(Error::NotFound(format!(
                "aggregation '{}' is not a metric",
                name
            ))),
        }
    }
}

impl<'a> IntoIterator for &'a SearchResponse {
    type Item = &'a Hit;
    type IntoIter = std::slice::Iter<'a, Hit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits()
    }
}

impl IntoIterator for SearchResponse {
    type Item = Hit;
    type IntoIter = std::vec::IntoIter<Hit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.hits.into_iter()
    }
}
