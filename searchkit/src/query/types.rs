//! Query DSL types
//!
//! Each type serializes to the Elasticsearch wire form and deserializes back
//! from it, so the same tree is used to build requests and to interpret them.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A node in a query tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    /// Match all documents
    MatchAll(MatchAllQuery),

    /// Match query (analyzed full-text)
    Match(FieldQuery<Value>),

    /// Match phrase query
    MatchPhrase(FieldQuery<Value>),

    /// Term query (exact match, not analyzed)
    Term(FieldQuery<Value>),

    /// Range query
    Range(FieldQuery<RangeBounds>),

    /// Bool query (must, filter, should, must_not)
    Bool(BoolQuery),
}

impl Default for Query {
    fn default() -> Self {
        Query::MatchAll(MatchAllQuery::default())
    }
}

impl Query {
    /// True for `match_all` and for a `bool` with no clauses at all
    pub fn is_match_all(&self) -> bool {
        match self {
            Query::MatchAll(_) => true,
            Query::Bool(b) => b.is_empty(),
            _ => false,
        }
    }
}

impl From<BoolQuery> for Query {
    fn from(b: BoolQuery) -> Self {
        Query::Bool(b)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchAllQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f32>,
}

/// A clause addressed to one field: `{field: value}`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldQuery<T> {
    pub field: String,
    pub value: T,
}

impl<T> FieldQuery<T> {
    pub fn new(field: impl Into<String>, value: T) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }
}

impl<T: Serialize> Serialize for FieldQuery<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &self.value)?;
        map.end()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for FieldQuery<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<String, T>::deserialize(deserializer)?;
        let count = map.len();
        let mut entries = map.into_iter();
        match (entries.next(), entries.next()) {
            (Some((field, value)), None) => Ok(FieldQuery { field, value }),
            _ => Err(de::Error::custom(format!(
                "expected a single field, found {}",
                count
            ))),
        }
    }
}

/// Range bounds (gte, gt, lte, lt). Absent bounds are omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<Value>,
}

impl RangeBounds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the greater-than-or-equal bound
    pub fn gte(mut self, value: impl Into<Value>) -> Self {
        self.gte = Some(value.into());
        self
    }

    /// Set the greater-than bound
    pub fn gt(mut self, value: impl Into<Value>) -> Self {
        self.gt = Some(value.into());
        self
    }

    /// Set the less-than-or-equal bound
    pub fn lte(mut self, value: impl Into<Value>) -> Self {
        self.lte = Some(value.into());
        self
    }

    /// Set the less-than bound
    pub fn lt(mut self, value: impl Into<Value>) -> Self {
        self.lt = Some(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.gte.is_none() && self.gt.is_none() && self.lte.is_none() && self.lt.is_none()
    }
}

/// Bool query. Empty lists are omitted on the wire and behave as pass-through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolQuery {
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "one_or_many"
    )]
    pub must: Vec<Query>,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "one_or_many"
    )]
    pub filter: Vec<Query>,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "one_or_many"
    )]
    pub should: Vec<Query>,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "one_or_many"
    )]
    pub must_not: Vec<Query>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must(mut self, query: Query) -> Self {
        self.must.push(query);
        self
    }

    pub fn filter(mut self, query: Query) -> Self {
        self.filter.push(query);
        self
    }

    pub fn should(mut self, query: Query) -> Self {
        self.should.push(query);
        self
    }

    pub fn must_not(mut self, query: Query) -> Self {
        self.must_not.push(query);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.filter.is_empty()
            && self.should.is_empty()
            && self.must_not.is_empty()
    }
}

/// Clause lists accept a single query or an array of queries
fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Query>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum QueryList {
        Single(Box<Query>),
        Multiple(Vec<Query>),
    }

    Ok(match QueryList::deserialize(deserializer)? {
        QueryList::Single(q) => vec![*q],
        QueryList::Multiple(v) => v,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_match_all() {
        let q = Query::default();
        assert_eq!(serde_json::to_value(&q).unwrap(), json!({"match_all": {}}));
    }

    #[test]
    fn test_serialize_match() {
        let q = Query::Match(FieldQuery::new("address", json!("mill lane")));
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"match": {"address": "mill lane"}})
        );
    }

    #[test]
    fn test_serialize_range_omits_absent_bounds() {
        let q = Query::Range(FieldQuery::new(
            "balance",
            RangeBounds::new().gte(20000).lte(30000),
        ));
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"range": {"balance": {"gte": 20000, "lte": 30000}}})
        );
    }

    #[test]
    fn test_serialize_bool_omits_empty_lists() {
        let q: Query = BoolQuery::new()
            .must(Query::Match(FieldQuery::new("age", json!(40))))
            .must_not(Query::Match(FieldQuery::new("state", json!("ID"))))
            .into();
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"bool": {
                "must": [{"match": {"age": 40}}],
                "must_not": [{"match": {"state": "ID"}}]
            }})
        );
    }

    #[test]
    fn test_deserialize_bool_single_clause() {
        let q: Query = serde_json::from_value(json!({
            "bool": {"filter": {"term": {"state.keyword": "TX"}}}
        }))
        .unwrap();
        match q {
            Query::Bool(b) => {
                assert_eq!(b.filter.len(), 1);
                assert!(b.must.is_empty());
            }
            _ => panic!("Expected Bool"),
        }
    }

    #[test]
    fn test_deserialize_range() {
        let q: Query =
            serde_json::from_value(json!({"range": {"age": {"gt": 18, "lt": 65}}})).unwrap();
        match q {
            Query::Range(r) => {
                assert_eq!(r.field, "age");
                assert_eq!(r.value.gt, Some(json!(18)));
                assert_eq!(r.value.lt, Some(json!(65)));
                assert!(r.value.gte.is_none());
            }
            _ => panic!("Expected Range"),
        }
    }

    #[test]
    fn test_deserialize_field_query_rejects_multiple_fields() {
        let err = serde_json::from_value::<Query>(json!({"match": {"a": 1, "b": 2}}));
        assert!(err.is_err());
    }

    #[test]
    fn test_deserialize_round_trip_nested() {
        let original = json!({"bool": {
            "must": [{"match_all": {}}],
            "filter": [{"range": {"balance": {"gte": 20000}}}],
            "should": [{"match_phrase": {"address": "mill lane"}}]
        }});
        let q: Query = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(serde_json::to_value(&q).unwrap(), original);
    }

    #[test]
    fn test_empty_bool_is_match_all() {
        assert!(Query::Bool(BoolQuery::new()).is_match_all());
        assert!(Query::default().is_match_all());
        assert!(!Query::Term(FieldQuery::new("x", json!(1))).is_match_all());
    }
}
