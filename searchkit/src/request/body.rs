//! Wire form of a search request

use crate::aggs::Aggregation;
use crate::query::Query;
use crate::request::sort::SortField;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root search request body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchBody {
    /// The query to execute; absent means match-all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Query>,

    /// Aggregations
    #[serde(
        default,
        alias = "aggregations",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub aggs: BTreeMap<String, Aggregation>,

    /// Sort order, primary criterion first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortField>,

    /// Starting offset (engine default 0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<usize>,

    /// Maximum number of hits (engine default 10)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,

    /// Fields to return in _source
    #[serde(default, rename = "_source", skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceFilter>,

    /// Count total hits exactly instead of stopping at the engine's cap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_total_hits: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceFilter {
    Bool(bool),
    Fields(Vec<String>),
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        includes: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        excludes: Option<Vec<String>>,
    },
}

impl SourceFilter {
    /// Build the filter for a projection list; an empty list disables `_source`
    pub fn from_fields(fields: &[String]) -> Self {
        if fields.is_empty() {
            SourceFilter::Bool(false)
        } else {
            SourceFilter::Fields(fields.to_vec())
        }
    }

    /// Whether the value at dotted `path` survives this filter.
    ///
    /// Naming an object keeps everything below it, so `owner` covers `owner.city`.
    pub fn includes(&self, path: &str) -> bool {
        match self {
            SourceFilter::Bool(enabled) => *enabled,
            SourceFilter::Fields(fields) => fields.iter().any(|f| covers(f, path)),
            SourceFilter::Object { includes, excludes } => {
                let included = includes
                    .as_ref()
                    .map_or(true, |inc| inc.iter().any(|f| covers(f, path)));
                let excluded = excludes
                    .as_ref()
                    .is_some_and(|exc| exc.iter().any(|f| covers(f, path)));
                included && !excluded
            }
        }
    }
}

/// `pattern` names `path` itself or one of its ancestors
fn covers(pattern: &str, path: &str) -> bool {
    path.strip_prefix(pattern)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_minimal() {
        let body: SearchBody = serde_json::from_value(json!({})).unwrap();
        assert!(body.query.is_none());
        assert!(body.from.is_none());
        assert!(body.aggs.is_empty());
        assert!(body.source.is_none());
    }

    #[test]
    fn test_deserialize_full() {
        let body: SearchBody = serde_json::from_value(json!({
            "query": {"match_all": {}},
            "from": 10,
            "size": 20,
            "_source": ["account_number", "balance"],
            "sort": [{"account_number": "asc"}],
            "aggregations": {
                "group_by_state": {"terms": {"field": "state.keyword"}}
            }
        }))
        .unwrap();
        assert_eq!(body.from, Some(10));
        assert_eq!(body.size, Some(20));
        assert_eq!(body.sort.len(), 1);
        assert!(body.aggs.contains_key("group_by_state"));
        assert!(matches!(body.source, Some(SourceFilter::Fields(ref f)) if f.len() == 2));
    }

    #[test]
    fn test_source_filter_empty_list_disables_source() {
        let filter = SourceFilter::from_fields(&[]);
        assert_eq!(serde_json::to_value(&filter).unwrap(), json!(false));
        assert!(!filter.includes("balance"));
    }

    #[test]
    fn test_source_filter_object() {
        let filter: SourceFilter =
            serde_json::from_value(json!({"excludes": ["email"]})).unwrap();
        assert!(filter.includes("balance"));
        assert!(!filter.includes("email"));
    }

    #[test]
    fn test_source_filter_dotted_paths() {
        let filter = SourceFilter::from_fields(&["owner.city".to_string(), "tags".to_string()]);
        assert!(filter.includes("owner.city"));
        assert!(!filter.includes("owner.name"));
        assert!(!filter.includes("owner"));
        assert!(filter.includes("tags.primary"));
        assert!(!filter.includes("tagsfoo"));
    }
}
