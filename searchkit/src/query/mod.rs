//! Query construction

mod builder;
pub mod types;

pub use builder::{bool_query, match_all, match_phrase, match_query, range, term};
pub use types::{BoolQuery, FieldQuery, MatchAllQuery, Query, RangeBounds};
