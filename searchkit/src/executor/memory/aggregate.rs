//! Aggregation evaluation over matched documents

use super::matcher::field_values;
use super::{bad_request, StoredDocument};
use crate::aggs::{Aggregation, AggregationKind, FieldAgg, HistogramAgg, TermsAgg};
use crate::error::ExecutorError;
use crate::request::SortOrder;
use crate::response::{AggregationResult, Bucket, BucketsResult, MetricValue};
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Most buckets a single histogram may produce
pub const MAX_BUCKETS: usize = 65_536;

pub(super) fn compute_all(
    aggs: &BTreeMap<String, Aggregation>,
    docs: &[&StoredDocument],
) -> Result<BTreeMap<String, AggregationResult>, ExecutorError> {
    aggs.iter()
        .map(|(name, agg)| Ok((name.clone(), compute(agg, docs)?)))
        .collect()
}

fn compute(agg: &Aggregation, docs: &[&StoredDocument]) -> Result<AggregationResult, ExecutorError> {
    let result = match &agg.kind {
        AggregationKind::Terms(t) => terms(t, &agg.aggs, docs)?,
        AggregationKind::Histogram(h) => histogram(h, &agg.aggs, docs)?,
        AggregationKind::Avg(f) => metric(f, docs, |vals| {
            (!vals.is_empty()).then(|| vals.iter().sum::<f64>() / vals.len() as f64)
        }),
        AggregationKind::Sum(f) => metric(f, docs, |vals| Some(vals.iter().sum())),
        AggregationKind::Min(f) => metric(f, docs, |vals| vals.iter().copied().reduce(f64::min)),
        AggregationKind::Max(f) => metric(f, docs, |vals| vals.iter().copied().reduce(f64::max)),
        AggregationKind::ValueCount(f) => {
            let count = docs
                .iter()
                .map(|d| field_values(&d.source, &f.field).len())
                .sum::<usize>();
            AggregationResult::Value(MetricValue {
                value: Some(count as f64),
                value_as_string: None,
            })
        }
    };
    Ok(result)
}

fn metric<F>(agg: &FieldAgg, docs: &[&StoredDocument], reduce: F) -> AggregationResult
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let values: Vec<f64> = docs
        .iter()
        .flat_map(|d| field_values(&d.source, &agg.field))
        .filter_map(Value::as_f64)
        .collect();

    AggregationResult::Value(MetricValue {
        value: reduce(&values),
        value_as_string: None,
    })
}

/// Grouping key of a terms bucket
#[derive(Debug, Clone)]
enum GroupKey {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl GroupKey {
    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n.as_f64().map(Self::Number),
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
        }
    }

    /// Wire key plus `key_as_string` for keys that are not strings on the wire
    fn to_wire(&self) -> (Value, Option<String>) {
        match self {
            Self::Bool(b) => (json!(u8::from(*b)), Some(b.to_string())),
            Self::Number(n) => (number_key(*n), None),
            Self::Text(s) => (Value::String(s.clone()), None),
        }
    }
}

fn number_key(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        json!(n as i64)
    } else {
        json!(n)
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

struct Group<'a> {
    key: GroupKey,
    docs: Vec<&'a StoredDocument>,
    sub_aggs: BTreeMap<String, AggregationResult>,
}

fn terms(
    agg: &TermsAgg,
    children: &BTreeMap<String, Aggregation>,
    docs: &[&StoredDocument],
) -> Result<AggregationResult, ExecutorError> {
    let mut grouped: BTreeMap<GroupKey, Vec<&StoredDocument>> = BTreeMap::new();
    for &doc in docs {
        // a document counts once per distinct value
        let keys: BTreeSet<GroupKey> = field_values(&doc.source, &agg.field)
            .into_iter()
            .filter_map(GroupKey::from_value)
            .collect();
        for key in keys {
            grouped.entry(key).or_default().push(doc);
        }
    }

    let mut groups: Vec<Group> = grouped
        .into_iter()
        .map(|(key, docs)| {
            let sub_aggs = compute_all(children, &docs)?;
            Ok(Group {
                key,
                docs,
                sub_aggs,
            })
        })
        .collect::<Result<_, ExecutorError>>()?;

    groups.sort_by(|a, b| compare_groups(agg, a, b));

    let size = agg.effective_size();
    let other: u64 = groups
        .iter()
        .skip(size)
        .map(|g| g.docs.len() as u64)
        .sum();
    groups.truncate(size);

    Ok(AggregationResult::Buckets(BucketsResult {
        doc_count_error_upper_bound: Some(0),
        sum_other_doc_count: Some(other),
        buckets: groups.into_iter().map(into_bucket).collect(),
    }))
}

/// Default order is doc count descending, ties broken by key ascending
fn compare_groups(agg: &TermsAgg, a: &Group, b: &Group) -> Ordering {
    let by_count = b.docs.len().cmp(&a.docs.len()).then_with(|| a.key.cmp(&b.key));

    let Some(order) = &agg.order else {
        return by_count;
    };
    let directed = |o: Ordering| match order.value {
        SortOrder::Asc => o,
        SortOrder::Desc => o.reverse(),
    };

    match order.field.as_str() {
        "_count" => directed(a.docs.len().cmp(&b.docs.len())).then_with(|| a.key.cmp(&b.key)),
        "_key" => directed(a.key.cmp(&b.key)),
        name => {
            let va = a.sub_aggs.get(name).and_then(AggregationResult::value);
            let vb = b.sub_aggs.get(name).and_then(AggregationResult::value);
            match (va, vb) {
                (Some(x), Some(y)) => directed(x.total_cmp(&y)).then(by_count),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => by_count,
            }
        }
    }
}

fn into_bucket(group: Group) -> Bucket {
    let (key, key_as_string) = group.key.to_wire();
    Bucket {
        key,
        key_as_string,
        doc_count: group.docs.len() as u64,
        from: None,
        to: None,
        sub_aggs: group.sub_aggs,
    }
}

fn histogram(
    agg: &HistogramAgg,
    children: &BTreeMap<String, Aggregation>,
    docs: &[&StoredDocument],
) -> Result<AggregationResult, ExecutorError> {
    let interval = agg.interval;
    let mut slots: BTreeMap<i64, Vec<&StoredDocument>> = BTreeMap::new();

    if interval > 0.0 {
        for &doc in docs {
            let indices = field_values(&doc.source, &agg.field)
                .into_iter()
                .filter_map(numeric)
                .map(|n| bucket_index(n, interval))
                .collect::<Result<BTreeSet<i64>, _>>()?;
            for idx in indices {
                slots.entry(idx).or_default().push(doc);
            }
        }
    }

    // with min_doc_count 0 every interval between the extremes gets a bucket
    let min_doc_count = agg.min_doc_count.unwrap_or(0);
    let indices: Vec<i64> = match (min_doc_count, slots.keys().next(), slots.keys().next_back()) {
        (0, Some(&lo), Some(&hi)) => {
            let span = i128::from(hi) - i128::from(lo) + 1;
            if span > MAX_BUCKETS as i128 {
                return Err(too_many_buckets(span));
            }
            (lo..=hi).collect()
        }
        _ => slots.keys().copied().collect(),
    };
    if indices.len() > MAX_BUCKETS {
        return Err(too_many_buckets(indices.len() as i128));
    }

    let mut buckets = Vec::new();

    for idx in indices {
        let members = slots.get(&idx).map(Vec::as_slice).unwrap_or(&[]);
        if (members.len() as u64) < min_doc_count {
            continue;
        }
        buckets.push(Bucket {
            key: json!(idx as f64 * interval),
            key_as_string: None,
            doc_count: members.len() as u64,
            from: None,
            to: None,
            sub_aggs: compute_all(children, members)?,
        });
    }

    Ok(AggregationResult::Buckets(BucketsResult {
        doc_count_error_upper_bound: None,
        sum_other_doc_count: None,
        buckets,
    }))
}

/// Interval index of `n`; values too far from zero to index are rejected
fn bucket_index(n: f64, interval: f64) -> Result<i64, ExecutorError> {
    let idx = (n / interval).floor();
    if idx.is_finite() && idx.abs() < 9_007_199_254_740_992.0 {
        Ok(idx as i64)
    } else {
        Err(bad_request(
            "illegal_argument_exception",
            format!("histogram value [{}] is out of range for interval [{}]", n, interval),
        ))
    }
}

fn too_many_buckets(count: i128) -> ExecutorError {
    bad_request(
        "too_many_buckets_exception",
        format!(
            "Trying to create too many buckets. Must be less than or equal to: [{}] but was [{}]",
            MAX_BUCKETS, count
        ),
    )
}

fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
