//! Query evaluation against a single stored document

use crate::query::{BoolQuery, Query, RangeBounds};
use crate::response::lookup;
use serde_json::{Map, Value};
use std::cmp::Ordering;

pub(super) fn matches(query: &Query, source: &Map<String, Value>) -> bool {
    match query {
        Query::MatchAll(_) => true,

        Query::Match(fq) => {
            let keyword = is_keyword(&fq.field);
            let q = query_text(&fq.value);
            field_values(source, &fq.field)
                .iter()
                .any(|v| match_value(v, q, keyword))
        }

        Query::MatchPhrase(fq) => {
            let q = query_text(&fq.value);
            field_values(source, &fq.field)
                .iter()
                .any(|v| match_phrase(v, q))
        }

        Query::Term(fq) => {
            let keyword = is_keyword(&fq.field);
            field_values(source, &fq.field)
                .iter()
                .any(|v| term_value(v, &fq.value, keyword))
        }

        Query::Range(fq) => field_values(source, &fq.field)
            .iter()
            .any(|v| in_range(v, &fq.value)),

        Query::Bool(b) => matches_bool(b, source),
    }
}

fn matches_bool(b: &BoolQuery, source: &Map<String, Value>) -> bool {
    if !b.must.iter().all(|q| matches(q, source)) {
        return false;
    }
    if !b.filter.iter().all(|q| matches(q, source)) {
        return false;
    }
    if b.must_not.iter().any(|q| matches(q, source)) {
        return false;
    }
    // should clauses are only required when nothing else constrains the query
    if !b.should.is_empty() && b.must.is_empty() && b.filter.is_empty() {
        return b.should.iter().any(|q| matches(q, source));
    }
    true
}

/// Resolve a field; `name.keyword` falls back to the raw value of `name`
pub(super) fn resolve<'a>(source: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    lookup(source, field).or_else(|| {
        field
            .strip_suffix(".keyword")
            .and_then(|base| lookup(source, base))
    })
}

/// All scalar values of a field, flattening arrays
pub(super) fn field_values<'a>(source: &'a Map<String, Value>, field: &str) -> Vec<&'a Value> {
    match resolve(source, field) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter(|v| !v.is_null()).collect(),
        Some(v) => vec![v],
    }
}

fn is_keyword(field: &str) -> bool {
    field.ends_with(".keyword")
}

/// `{"query": ...}` object form of match clauses
fn query_text(value: &Value) -> &Value {
    match value {
        Value::Object(obj) => obj.get("query").unwrap_or(value),
        _ => value,
    }
}

/// Lowercased alphanumeric words
pub(super) fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn match_value(doc: &Value, q: &Value, keyword: bool) -> bool {
    if keyword {
        return values_equal(doc, q);
    }
    match (doc, q) {
        (Value::String(d), Value::String(s)) => {
            let doc_tokens = tokens(d);
            tokens(s).iter().any(|t| doc_tokens.contains(t))
        }
        _ => values_equal(doc, q),
    }
}

fn match_phrase(doc: &Value, q: &Value) -> bool {
    match (doc, q) {
        (Value::String(d), Value::String(s)) => {
            let phrase = tokens(s);
            if phrase.is_empty() {
                return false;
            }
            tokens(d).windows(phrase.len()).any(|w| w == phrase.as_slice())
        }
        _ => values_equal(doc, q),
    }
}

fn term_value(doc: &Value, q: &Value, keyword: bool) -> bool {
    match (doc, q) {
        (Value::String(d), Value::String(s)) if !keyword => {
            d == s || tokens(d).iter().any(|t| t == s)
        }
        _ => values_equal(doc, q),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    compare_scalar(a, b) == Some(Ordering::Equal)
}

fn in_range(v: &Value, bounds: &RangeBounds) -> bool {
    let check = |bound: &Option<Value>, accept: fn(Ordering) -> bool| match bound {
        None => true,
        Some(b) => compare_scalar(v, b).is_some_and(accept),
    };

    check(&bounds.gte, |o| o != Ordering::Less)
        && check(&bounds.gt, |o| o == Ordering::Greater)
        && check(&bounds.lte, |o| o != Ordering::Greater)
        && check(&bounds.lt, |o| o == Ordering::Less)
}

/// Compare two scalars of compatible type; numeric strings compare as numbers
pub(super) fn compare_scalar(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Some(x.as_f64()?.total_cmp(&y.as_f64()?)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::String(s)) => {
            Some(x.as_f64()?.total_cmp(&s.trim().parse::<f64>().ok()?))
        }
        (Value::String(s), Value::Number(y)) => {
            Some(s.trim().parse::<f64>().ok()?.total_cmp(&y.as_f64()?))
        }
        (Value::Bool(x), Value::String(s)) | (Value::String(s), Value::Bool(x)) => {
            (s.parse::<bool>().ok()? == *x).then_some(Ordering::Equal)
        }
        _ => None,
    }
}
