//! Search request assembly
//!
//! A [`SearchRequest`] is an immutable value. Every `with_*` method returns a
//! derived copy, so one request can serve as the base for many variants:
//!
//! ```
//! use searchkit::query::{match_query, range, RangeBounds};
//! use searchkit::request::{SearchRequest, SortOrder};
//!
//! let base = SearchRequest::new("bank");
//! let first_page = base
//!     .with_query(match_query("address", "mill lane").unwrap())
//!     .with_sort([("account_number", SortOrder::Asc)])
//!     .with_pagination(0, 10)
//!     .unwrap();
//! let rich = base.with_query(range("balance", RangeBounds::new().gte(40000)).unwrap());
//!
//! assert_eq!(first_page.to_body().size, Some(10));
//! assert!(rich.to_body().sort.is_empty());
//! ```

mod body;
mod execute;
mod sort;

pub use body::{SearchBody, SourceFilter};
pub use sort::{SortField, SortOrder};

use crate::aggs::{self, Aggregation, BucketKind, MetricKind};
use crate::error::Error;
use crate::query::Query;
use crate::Result;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    index: String,
    query: Option<Query>,
    sort: Vec<SortField>,
    from: usize,
    size: Option<usize>,
    /// `None` returns every field; `Some(vec![])` returns none
    source: Option<Vec<String>>,
    aggs: BTreeMap<String, Aggregation>,
    track_total_hits: Option<bool>,
}

impl SearchRequest {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            query: None,
            sort: Vec::new(),
            from: 0,
            size: None,
            source: None,
            aggs: BTreeMap::new(),
            track_total_hits: None,
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// The query, if one was set; an unset query selects every document
    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    pub fn sort(&self) -> &[SortField] {
        &self.sort
    }

    pub fn offset(&self) -> usize {
        self.from
    }

    pub fn limit(&self) -> Option<usize> {
        self.size
    }

    pub fn source_fields(&self) -> Option<&[String]> {
        self.source.as_deref()
    }

    pub fn aggregation(&self, name: &str) -> Option<&Aggregation> {
        self.aggs.get(name)
    }

    pub fn aggregation_names(&self) -> impl Iterator<Item = &str> {
        self.aggs.keys().map(String::as_str)
    }

    /// Replace the query
    pub fn with_query(&self, query: Query) -> Self {
        Self {
            query: Some(query),
            ..self.clone()
        }
    }

    /// Set the hit window to `[offset, offset + limit)`
    pub fn with_pagination(&self, offset: i64, limit: i64) -> Result<Self> {
        if offset < 0 {
            return Err(Error::invalid(format!(
                "offset must be >= 0, got {}",
                offset
            )));
        }
        if limit < 0 {
            return Err(Error::invalid(format!("limit must be >= 0, got {}", limit)));
        }

        Ok(Self {
            from: offset as usize,
            size: Some(limit as usize),
            ..self.clone()
        })
    }

    /// Append sort criteria; earlier criteria take precedence
    pub fn with_sort<I, S>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SortField>,
    {
        let mut sort = self.sort.clone();
        sort.extend(fields.into_iter().map(Into::into));
        Self {
            sort,
            ..self.clone()
        }
    }

    /// Restrict `_source` to the given fields.
    ///
    /// An empty list returns **no** source fields at all. Use
    /// [`without_source_filter`](Self::without_source_filter) to get every field back.
    pub fn with_source_fields<I, S>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source: Some(fields.into_iter().map(Into::into).collect()),
            ..self.clone()
        }
    }

    /// Return every source field again
    pub fn without_source_filter(&self) -> Self {
        Self {
            source: None,
            ..self.clone()
        }
    }

    pub fn with_track_total_hits(&self, track: bool) -> Self {
        Self {
            track_total_hits: Some(track),
            ..self.clone()
        }
    }

    /// Add a named top-level aggregation
    pub fn with_aggregation(&self, name: impl Into<String>, agg: Aggregation) -> Result<Self> {
        let mut derived = self.clone();
        aggs::attach(&mut derived.aggs, name.into(), agg)?;
        Ok(derived)
    }

    /// Add a top-level bucketing aggregation
    pub fn bucket(
        &self,
        name: impl Into<String>,
        kind: BucketKind,
        field: impl Into<String>,
    ) -> Result<Self> {
        self.with_aggregation(name, Aggregation::from_bucket_kind(kind, field))
    }

    /// Add a top-level metric aggregation
    pub fn metric(
        &self,
        name: impl Into<String>,
        kind: MetricKind,
        field: impl Into<String>,
    ) -> Result<Self> {
        self.with_aggregation(name, Aggregation::from_metric_kind(kind, field))
    }

    /// Wire body for this request
    pub fn to_body(&self) -> SearchBody {
        SearchBody {
            query: self.query.clone(),
            aggs: self.aggs.clone(),
            sort: self.sort.clone(),
            from: (self.from > 0).then_some(self.from),
            size: self.size,
            source: self.source.as_deref().map(SourceFilter::from_fields),
            track_total_hits: self.track_total_hits,
        }
    }

    pub fn to_json(&self) -> Result<Value> {
        serde_json::to_value(self.to_body())
            .map_err(|e| Error::invalid(format!("request does not serialize: {}", e)))
    }

    /// Body of the count-only variant: no hits, no aggregations, exact total
    pub(crate) fn count_body(&self) -> SearchBody {
        SearchBody {
            query: self.query.clone(),
            size: Some(0),
            source: Some(SourceFilter::Bool(false)),
            track_total_hits: Some(true),
            ..SearchBody::default()
        }
    }

    /// Copy of this request narrowed to one page, without aggregations
    pub(crate) fn page(&self, from: usize, size: usize) -> Self {
        Self {
            from,
            size: Some(size),
            aggs: BTreeMap::new(),
            ..self.clone()
        }
    }
}
