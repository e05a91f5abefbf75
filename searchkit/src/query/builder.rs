//! Validating constructors for query clauses

use crate::error::Error;
use crate::query::types::{BoolQuery, FieldQuery, MatchAllQuery, Query, RangeBounds};
use crate::Result;
use serde_json::Value;

/// The unconditional clause
pub fn match_all() -> Query {
    Query::MatchAll(MatchAllQuery::default())
}

/// Full-text match on one field
pub fn match_query(field: impl Into<String>, value: impl Into<Value>) -> Result<Query> {
    let field = non_empty_field(field.into(), "match")?;
    Ok(Query::Match(FieldQuery::new(field, value.into())))
}

/// Phrase match on one field
pub fn match_phrase(field: impl Into<String>, value: impl Into<Value>) -> Result<Query> {
    let field = non_empty_field(field.into(), "match_phrase")?;
    Ok(Query::MatchPhrase(FieldQuery::new(field, value.into())))
}

/// Exact (non-analyzed) match on one field
pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Result<Query> {
    let field = non_empty_field(field.into(), "term")?;
    Ok(Query::Term(FieldQuery::new(field, value.into())))
}

/// Range filter on one field.
///
/// At least one bound is required, and each side may carry only one of its
/// inclusive/exclusive forms.
pub fn range(field: impl Into<String>, bounds: RangeBounds) -> Result<Query> {
    let field = non_empty_field(field.into(), "range")?;

    if bounds.is_empty() {
        return Err(Error::invalid(format!(
            "range on '{}' needs at least one bound",
            field
        )));
    }
    if bounds.gte.is_some() && bounds.gt.is_some() {
        return Err(Error::invalid(format!(
            "range on '{}' sets both gte and gt",
            field
        )));
    }
    if bounds.lte.is_some() && bounds.lt.is_some() {
        return Err(Error::invalid(format!(
            "range on '{}' sets both lte and lt",
            field
        )));
    }

    Ok(Query::Range(FieldQuery::new(field, bounds)))
}

/// Bool combinator over `must` and `filter` clauses.
///
/// Empty lists are legal; `bool_query(vec![], vec![])` selects every document.
pub fn bool_query(must: Vec<Query>, filter: Vec<Query>) -> Query {
    Query::Bool(BoolQuery {
        must,
        filter,
        ..BoolQuery::default()
    })
}

fn non_empty_field(field: String, clause: &str) -> Result<String> {
    if field.trim().is_empty() {
        return Err(Error::invalid(format!("{} requires a field name", clause)));
    }
    Ok(field)
}
