//! Parsers for command-line query fragments

use anyhow::{anyhow, bail, Result};
use searchkit::query::{bool_query, match_phrase, match_query, range, Query, RangeBounds};
use searchkit::request::{SortField, SortOrder};
use serde_json::Value;

/// `field=value`; numbers and booleans are sent as JSON, everything else as a string
pub fn field_value(raw: &str) -> Result<(String, Value)> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected FIELD=VALUE, got '{}'", raw))?;
    Ok((field.trim().to_string(), scalar(value.trim())))
}

fn scalar(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(v @ (Value::Number(_) | Value::Bool(_))) => v,
        _ => Value::String(raw.to_string()),
    }
}

/// `field:lo..hi` with inclusive bounds; either side may be empty
pub fn range_clause(raw: &str) -> Result<Query> {
    let (field, bounds) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("expected FIELD:LO..HI, got '{}'", raw))?;
    let (lo, hi) = bounds
        .split_once("..")
        .ok_or_else(|| anyhow!("expected LO..HI in '{}'", raw))?;

    let mut parsed = RangeBounds::new();
    if !lo.trim().is_empty() {
        parsed = parsed.gte(scalar(lo.trim()));
    }
    if !hi.trim().is_empty() {
        parsed = parsed.lte(scalar(hi.trim()));
    }
    Ok(range(field.trim(), parsed)?)
}

/// `field` or `field:asc|desc`
pub fn sort_field(raw: &str) -> Result<SortField> {
    match raw.rsplit_once(':') {
        Some((field, dir)) => {
            let order: SortOrder = dir.parse().map_err(|_| {
                anyhow!("sort direction must be asc or desc, got '{}'", dir)
            })?;
            Ok(SortField::new(field, order))
        }
        None => Ok(SortField::asc(raw)),
    }
}

/// Combine `--match`, `--phrase` and `--range` flags into one query.
///
/// Returns `None` when no flag was given so the request stays match-all.
pub fn build_query(matches: &[String], phrases: &[String], ranges: &[String]) -> Result<Option<Query>> {
    let mut must = Vec::new();
    for raw in matches {
        let (field, value) = field_value(raw)?;
        must.push(match_query(field, value)?);
    }
    for raw in phrases {
        let (field, value) = field_value(raw)?;
        must.push(match_phrase(field, value)?);
    }

    let filter = ranges
        .iter()
        .map(|raw| range_clause(raw))
        .collect::<Result<Vec<_>>>()?;

    Ok(match (must.len(), filter.len()) {
        (0, 0) => None,
        (1, 0) => must.pop(),
        _ => Some(bool_query(must, filter)),
    })
}

/// Comma-separated field list
pub fn field_list(raw: &str) -> Result<Vec<String>> {
    let fields: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(String::from)
        .collect();
    if fields.is_empty() && !raw.trim().is_empty() {
        bail!("no field names in '{}'", raw);
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_value() {
        assert_eq!(
            field_value("account_number=20").unwrap(),
            ("account_number".to_string(), json!(20))
        );
        assert_eq!(
            field_value("address = mill lane").unwrap(),
            ("address".to_string(), json!("mill lane"))
        );
        assert!(field_value("address").is_err());
    }

    #[test]
    fn test_range_clause() {
        let q = range_clause("balance:20000..30000").unwrap();
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"range": {"balance": {"gte": 20000, "lte": 30000}}})
        );

        let open = range_clause("age:30..").unwrap();
        assert_eq!(
            serde_json::to_value(&open).unwrap(),
            json!({"range": {"age": {"gte": 30}}})
        );

        assert!(range_clause("age:..").is_err());
        assert!(range_clause("age").is_err());
    }

    #[test]
    fn test_sort_field() {
        assert_eq!(sort_field("balance:desc").unwrap(), SortField::desc("balance"));
        assert_eq!(sort_field("account_number").unwrap(), SortField::asc("account_number"));
        assert!(sort_field("balance:sideways").is_err());
    }

    #[test]
    fn test_build_query() {
        assert!(build_query(&[], &[], &[]).unwrap().is_none());

        let single = build_query(&["age=40".to_string()], &[], &[]).unwrap().unwrap();
        assert_eq!(
            serde_json::to_value(&single).unwrap(),
            json!({"match": {"age": 40}})
        );

        let combined = build_query(
            &["age=40".to_string()],
            &[],
            &["balance:20000..".to_string()],
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            serde_json::to_value(&combined).unwrap(),
            json!({"bool": {
                "must": [{"match": {"age": 40}}],
                "filter": [{"range": {"balance": {"gte": 20000}}}]
            }})
        );
    }

    #[test]
    fn test_field_list() {
        assert_eq!(
            field_list("account_number, balance").unwrap(),
            vec!["account_number", "balance"]
        );
        assert!(field_list("").unwrap().is_empty());
        assert!(field_list(" , ").is_err());
    }
}
