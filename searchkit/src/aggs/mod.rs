//! Aggregation trees

mod builder;
pub mod types;

pub(crate) use builder::attach;
pub use types::{
    Aggregation, AggregationKind, BucketKind, FieldAgg, HistogramAgg, MetricKind, TermsAgg,
    TermsOrder, DEFAULT_TERMS_SIZE,
};
