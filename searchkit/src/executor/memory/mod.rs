//! In-process executor over JSON documents
//!
//! Evaluates the same request bodies the HTTP executor sends, with
//! Elasticsearch-like semantics: missing sort values last, a default page
//! size of 10, total hit counting capped at 10 000 unless `track_total_hits`
//! is set, and `index_not_found_exception` for unknown indices.

mod aggregate;
mod matcher;

use super::{ExecuteOptions, SearchExecutor};
use crate::error::ExecutorError;
use crate::request::{SearchBody, SortField, SortOrder, SourceFilter};
use crate::response::{Hit, HitsResponse, SearchResponse, TotalHits, TotalRelation};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info};

use matcher::{compare_scalar, field_values};

/// Hits returned when the body has no `size`
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Totals above this are reported as a lower bound unless tracked exactly
pub const TOTAL_HITS_CAP: u64 = 10_000;

/// Largest `from + size` a search may ask for
pub const MAX_RESULT_WINDOW: usize = 10_000;

/// A document stored under an id
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub source: Map<String, Value>,
}

impl StoredDocument {
    pub fn new(id: impl Into<String>, source: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            source,
        }
    }

    /// Build from any JSON value; only objects are documents
    pub fn from_value(id: impl Into<String>, source: Value) -> Result<Self, ExecutorError> {
        let id = id.into();
        match source {
            Value::Object(map) => Ok(Self::new(id, map)),
            other => Err(bad_request(
                "mapper_parsing_exception",
                format!("document [{}] is not an object: {}", id, other),
            )),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct IndexData {
    docs: Vec<StoredDocument>,
    positions: HashMap<String, usize>,
}

impl IndexData {
    /// Insert or replace by id; replaced documents keep their position
    fn upsert(&mut self, doc: StoredDocument) {
        match self.positions.get(&doc.id) {
            Some(&pos) => self.docs[pos] = doc,
            None => {
                self.positions.insert(doc.id.clone(), self.docs.len());
                self.docs.push(doc);
            }
        }
    }
}

/// Executor holding named indices in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryExecutor {
    indices: HashMap<String, IndexData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum BulkAction {
    Index(BulkMeta),
    Create(BulkMeta),
}

#[derive(Deserialize, Default)]
struct BulkMeta {
    #[serde(rename = "_index", default)]
    index: Option<String>,
    #[serde(rename = "_id", default)]
    id: Option<String>,
}

impl InMemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or extend) an index with documents, in insertion order
    pub fn with_index(
        mut self,
        name: impl Into<String>,
        docs: impl IntoIterator<Item = StoredDocument>,
    ) -> Self {
        let data = self.indices.entry(name.into()).or_default();
        for doc in docs {
            data.upsert(doc);
        }
        self
    }

    /// Create an empty index; existing indices are left alone
    pub fn create_index(&mut self, name: impl Into<String>) {
        self.indices.entry(name.into()).or_default();
    }

    /// Store one document, replacing any document with the same id
    pub fn insert(&mut self, index: &str, doc: StoredDocument) {
        self.indices.entry(index.to_string()).or_default().upsert(doc);
    }

    /// Build an executor from Elasticsearch bulk NDJSON
    pub fn from_bulk_ndjson(index: &str, ndjson: &str) -> Result<Self, ExecutorError> {
        let mut executor = Self::new();
        executor.load_bulk(index, ndjson)?;
        Ok(executor)
    }

    /// Apply `index`/`create` actions from bulk NDJSON.
    ///
    /// Actions without `_index` go to `default_index`; actions without `_id`
    /// get the next sequential id. Returns the number of documents written.
    pub fn load_bulk(&mut self, default_index: &str, ndjson: &str) -> Result<usize, ExecutorError> {
        let mut lines = ndjson
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());
        let mut written = 0;

        while let Some((line_no, action_line)) = lines.next() {
            let action: BulkAction = serde_json::from_str(action_line).map_err(|e| {
                bad_request(
                    "action_request_validation_exception",
                    format!("line {}: {}", line_no + 1, e),
                )
            })?;
            let (meta, create) = match action {
                BulkAction::Index(meta) => (meta, false),
                BulkAction::Create(meta) => (meta, true),
            };

            let (_, source_line) = lines.next().ok_or_else(|| {
                bad_request(
                    "parse_exception",
                    format!("line {}: bulk action without a source line", line_no + 1),
                )
            })?;
            let source: Value = serde_json::from_str(source_line)?;

            let index = meta.index.unwrap_or_else(|| default_index.to_string());
            let data = self.indices.entry(index.clone()).or_default();
            let id = meta.id.unwrap_or_else(|| data.docs.len().to_string());

            if create && data.positions.contains_key(&id) {
                return Err(ExecutorError::Engine {
                    status: 409,
                    error_type: "version_conflict_engine_exception".to_string(),
                    reason: format!("[{}]: document already exists in [{}]", id, index),
                });
            }

            data.upsert(StoredDocument::from_value(id, source)?);
            written += 1;
        }

        info!(index = default_index, documents = written, "Loaded bulk data");
        Ok(written)
    }

    /// Number of documents in an index, `None` if it does not exist
    pub fn document_count(&self, index: &str) -> Option<usize> {
        self.indices.get(index).map(|data| data.docs.len())
    }

    pub fn index_names(&self) -> impl Iterator<Item = &str> {
        self.indices.keys().map(String::as_str)
    }

    fn documents(&self, index: &str) -> Result<&[StoredDocument], ExecutorError> {
        self.indices
            .get(index)
            .map(|data| data.docs.as_slice())
            .ok_or_else(|| ExecutorError::index_not_found(index))
    }

    fn matching<'a>(
        &'a self,
        index: &str,
        body: &SearchBody,
    ) -> Result<Vec<&'a StoredDocument>, ExecutorError> {
        let query = body.query.clone().unwrap_or_default();
        Ok(self
            .documents(index)?
            .iter()
            .filter(|doc| matcher::matches(&query, &doc.source))
            .collect())
    }

    fn run(&self, index: &str, body: &SearchBody) -> Result<SearchResponse, ExecutorError> {
        let started = Instant::now();

        let from = body.from.unwrap_or(0);
        let size = body.size.unwrap_or(DEFAULT_PAGE_SIZE);
        let window = from.saturating_add(size);
        if window > MAX_RESULT_WINDOW {
            return Err(bad_request(
                "illegal_argument_exception",
                format!(
                    "Result window is too large, from + size must be less than or equal to: [{}] but was [{}]",
                    MAX_RESULT_WINDOW, window
                ),
            ));
        }
        for agg in body.aggs.values() {
            agg.validate()
                .map_err(|e| bad_request("illegal_argument_exception", e.to_string()))?;
        }

        let mut matched = self.matching(index, body)?;
        let sorted = !body.sort.is_empty();
        if sorted {
            // stable, so ties keep insertion order
            matched.sort_by(|a, b| compare_docs(a, b, &body.sort));
        }

        let aggregations = aggregate::compute_all(&body.aggs, &matched)?;

        let hits: Vec<Hit> = matched
            .iter()
            .skip(from)
            .take(size)
            .map(|doc| to_hit(index, doc, body))
            .collect();

        let total = total_hits(matched.len() as u64, body.track_total_hits);
        let max_score = (!sorted && !hits.is_empty()).then_some(1.0);

        let took = started.elapsed().as_millis() as u64;
        Ok(SearchResponse::new(
            took,
            HitsResponse {
                total,
                max_score,
                hits,
            },
            aggregations,
        ))
    }
}

fn bad_request(error_type: &str, reason: impl Into<String>) -> ExecutorError {
    ExecutorError::Engine {
        status: 400,
        error_type: error_type.to_string(),
        reason: reason.into(),
    }
}

fn parse_body(body: &Value) -> Result<SearchBody, ExecutorError> {
    SearchBody::deserialize(body).map_err(|e| bad_request("parsing_exception", e.to_string()))
}

fn total_hits(matched: u64, track: Option<bool>) -> Option<TotalHits> {
    match track {
        Some(false) => None,
        Some(true) => Some(TotalHits {
            value: matched,
            relation: TotalRelation::Exact,
        }),
        None if matched > TOTAL_HITS_CAP => Some(TotalHits {
            value: TOTAL_HITS_CAP,
            relation: TotalRelation::LowerBound,
        }),
        None => Some(TotalHits {
            value: matched,
            relation: TotalRelation::Exact,
        }),
    }
}

fn to_hit(index: &str, doc: &StoredDocument, body: &SearchBody) -> Hit {
    let source = match &body.source {
        None => doc.source.clone(),
        Some(filter) => project(&doc.source, filter),
    };

    let (score, sort) = if body.sort.is_empty() {
        (Some(1.0), None)
    } else {
        let values = body
            .sort
            .iter()
            .map(|s| match s.field.as_str() {
                "_id" => Value::String(doc.id.clone()),
                field => sort_value(doc, field, s.order)
                    .cloned()
                    .unwrap_or(Value::Null),
            })
            .collect();
        (None, Some(values))
    };

    Hit {
        index: index.to_string(),
        id: doc.id.clone(),
        score,
        source,
        sort,
    }
}

fn project(source: &Map<String, Value>, filter: &SourceFilter) -> Map<String, Value> {
    match filter {
        SourceFilter::Bool(true) => source.clone(),
        SourceFilter::Bool(false) => Map::new(),
        _ => project_object(source, "", filter),
    }
}

/// Keep the leaves whose dotted path survives `filter`, with their parent objects
fn project_object(source: &Map<String, Value>, prefix: &str, filter: &SourceFilter) -> Map<String, Value> {
    source
        .iter()
        .filter_map(|(key, value)| {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            project_value(value, &path, filter).map(|kept| (key.clone(), kept))
        })
        .collect()
}

fn project_value(value: &Value, path: &str, filter: &SourceFilter) -> Option<Value> {
    match value {
        Value::Object(map) if !map.is_empty() => {
            let kept = project_object(map, path, filter);
            (!kept.is_empty()).then_some(Value::Object(kept))
        }
        Value::Array(items) if items.iter().any(Value::is_object) => {
            let kept: Vec<Value> = items
                .iter()
                .filter_map(|item| project_value(item, path, filter))
                .collect();
            (!kept.is_empty()).then_some(Value::Array(kept))
        }
        leaf => filter.includes(path).then(|| leaf.clone()),
    }
}

/// Representative value of a multi-valued field: min for ascending, max for descending
fn sort_value<'a>(doc: &'a StoredDocument, field: &str, order: SortOrder) -> Option<&'a Value> {
    field_values(&doc.source, field).into_iter().reduce(|best, v| {
        match (compare_scalar(v, best), order) {
            (Some(Ordering::Less), SortOrder::Asc) | (Some(Ordering::Greater), SortOrder::Desc) => v,
            _ => best,
        }
    })
}

fn compare_docs(a: &StoredDocument, b: &StoredDocument, sort: &[SortField]) -> Ordering {
    for criterion in sort {
        let directed = |o: Ordering| match criterion.order {
            SortOrder::Asc => o,
            SortOrder::Desc => o.reverse(),
        };

        let ord = match criterion.field.as_str() {
            "_score" | "_doc" => Ordering::Equal,
            "_id" => directed(a.id.cmp(&b.id)),
            field => {
                let va = sort_value(a, field, criterion.order);
                let vb = sort_value(b, field, criterion.order);
                match (va, vb) {
                    (Some(x), Some(y)) => {
                        directed(compare_scalar(x, y).unwrap_or_else(|| type_rank(x).cmp(&type_rank(y))))
                    }
                    // missing values sort last in either direction
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            }
        };

        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Bool(_) => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        _ => 3,
    }
}

#[async_trait]
impl SearchExecutor for InMemoryExecutor {
    async fn search(
        &self,
        index: &str,
        body: &Value,
        options: &ExecuteOptions,
    ) -> Result<Value, ExecutorError> {
        let parsed = parse_body(body)?;
        debug!(index, ignore_cache = options.ignore_cache, "In-memory search");

        let response = self.run(index, &parsed)?;
        Ok(serde_json::to_value(&response)?)
    }

    async fn count(&self, index: &str, body: &Value) -> Result<u64, ExecutorError> {
        let parsed = parse_body(body)?;
        Ok(self.matching(index, &parsed)?.len() as u64)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
