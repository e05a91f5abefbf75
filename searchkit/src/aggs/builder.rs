use crate::aggs::types::{
    Aggregation, AggregationKind, BucketKind, FieldAgg, HistogramAgg, MetricKind, TermsAgg,
};
use crate::error::Error;
use crate::query::FieldQuery;
use crate::request::SortOrder;
use crate::Result;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

impl Aggregation {
    pub fn new(kind: AggregationKind) -> Self {
        Self {
            kind,
            aggs: BTreeMap::new(),
        }
    }

    pub fn terms(field: impl Into<String>) -> Self {
        Self::new(AggregationKind::Terms(TermsAgg {
            field: field.into(),
            size: None,
            order: None,
        }))
    }

    pub fn terms_with_size(field: impl Into<String>, size: usize) -> Self {
        Self::terms(field).with_size(size)
    }

    pub fn histogram(field: impl Into<String>, interval: f64) -> Self {
        Self::new(AggregationKind::Histogram(HistogramAgg {
            field: field.into(),
            interval,
            min_doc_count: None,
        }))
    }

    pub fn avg(field: impl Into<String>) -> Self {
        Self::new(AggregationKind::Avg(FieldAgg {
            field: field.into(),
        }))
    }

    pub fn sum(field: impl Into<String>) -> Self {
        Self::new(AggregationKind::Sum(FieldAgg {
            field: field.into(),
        }))
    }

    pub fn min(field: impl Into<String>) -> Self {
        Self::new(AggregationKind::Min(FieldAgg {
            field: field.into(),
        }))
    }

    pub fn max(field: impl Into<String>) -> Self {
        Self::new(AggregationKind::Max(FieldAgg {
            field: field.into(),
        }))
    }

    pub fn value_count(field: impl Into<String>) -> Self {
        Self::new(AggregationKind::ValueCount(FieldAgg {
            field: field.into(),
        }))
    }

    pub fn from_bucket_kind(kind: BucketKind, field: impl Into<String>) -> Self {
        match kind {
            BucketKind::Terms => Self::terms(field),
            BucketKind::Histogram { interval } => Self::histogram(field, interval),
        }
    }

    pub fn from_metric_kind(kind: MetricKind, field: impl Into<String>) -> Self {
        match kind {
            MetricKind::Avg => Self::avg(field),
            MetricKind::Sum => Self::sum(field),
            MetricKind::Min => Self::min(field),
            MetricKind::Max => Self::max(field),
            MetricKind::ValueCount => Self::value_count(field),
        }
    }

    /// Set the bucket count of a terms aggregation; no-op for other kinds
    pub fn with_size(mut self, size: usize) -> Self {
        if let AggregationKind::Terms(t) = &mut self.kind {
            t.size = Some(size);
        }
        self
    }

    /// Set the bucket ordering of a terms aggregation; no-op for other kinds.
    ///
    /// `key` is `_count`, `_key` or the name of a child metric.
    pub fn with_order(mut self, key: impl Into<String>, order: SortOrder) -> Self {
        if let AggregationKind::Terms(t) = &mut self.kind {
            t.order = Some(FieldQuery::new(key, order));
        }
        self
    }

    pub fn is_bucket(&self) -> bool {
        self.kind.is_bucket()
    }

    pub fn is_metric(&self) -> bool {
        !self.kind.is_bucket()
    }

    pub fn field(&self) -> &str {
        self.kind.field()
    }

    pub fn child(&self, name: &str) -> Option<&Aggregation> {
        self.aggs.get(name)
    }

    /// Attach a bucketing child and return it for further nesting
    pub fn bucket(
        &mut self,
        name: impl Into<String>,
        kind: BucketKind,
        field: impl Into<String>,
    ) -> Result<&mut Aggregation> {
        self.ensure_bucket()?;
        attach(
            &mut self.aggs,
            name.into(),
            Aggregation::from_bucket_kind(kind, field),
        )
    }

    /// Attach a metric leaf and return the parent for chaining
    pub fn metric(
        &mut self,
        name: impl Into<String>,
        kind: MetricKind,
        field: impl Into<String>,
    ) -> Result<&mut Aggregation> {
        self.ensure_bucket()?;
        attach(
            &mut self.aggs,
            name.into(),
            Aggregation::from_metric_kind(kind, field),
        )?;
        Ok(self)
    }

    /// Consuming variant of child attachment, for building trees in one expression
    pub fn with_child(mut self, name: impl Into<String>, child: Aggregation) -> Result<Self> {
        self.ensure_bucket()?;
        attach(&mut self.aggs, name.into(), child)?;
        Ok(self)
    }

    /// Check field names, intervals and the leaf rule across the whole tree
    pub fn validate(&self) -> Result<()> {
        if self.field().trim().is_empty() {
            return Err(Error::invalid(format!(
                "{} aggregation requires a field",
                self.kind.name()
            )));
        }
        if let AggregationKind::Histogram(h) = &self.kind {
            if !(h.interval.is_finite() && h.interval > 0.0) {
                return Err(Error::invalid(format!(
                    "histogram interval must be positive, got {}",
                    h.interval
                )));
            }
        }
        if self.is_metric() && !self.aggs.is_empty() {
            return Err(Error::invalid(format!(
                "{} aggregation on '{}' cannot have children",
                self.kind.name(),
                self.field()
            )));
        }
        self.validate_order()?;
        self.aggs.values().try_for_each(Aggregation::validate)
    }

    /// A terms order key is `_count`, `_key` or a metric child of this aggregation
    fn validate_order(&self) -> Result<()> {
        let AggregationKind::Terms(TermsAgg {
            order: Some(order), ..
        }) = &self.kind
        else {
            return Ok(());
        };

        match order.field.as_str() {
            "_count" | "_key" => Ok(()),
            name if self.aggs.get(name).is_some_and(Aggregation::is_metric) => Ok(()),
            name => Err(Error::invalid(format!(
                "Invalid aggregator order path [{}] on terms aggregation of '{}'",
                name,
                self.field()
            ))),
        }
    }

    fn ensure_bucket(&self) -> Result<()> {
        if self.is_metric() {
            return Err(Error::invalid(format!(
                "{} aggregation on '{}' cannot have children",
                self.kind.name(),
                self.field()
            )));
        }
        Ok(())
    }
}

/// Insert `agg` under `name`, rejecting names already taken by a sibling
pub(crate) fn attach(
    siblings: &mut BTreeMap<String, Aggregation>,
    name: String,
    agg: Aggregation,
) -> Result<&mut Aggregation> {
    if name.trim().is_empty() {
        return Err(Error::invalid("aggregation name must not be empty"));
    }
    agg.validate()?;

    match siblings.entry(name) {
        Entry::Occupied(e) => Err(Error::DuplicateName(e.key().clone())),
        Entry::Vacant(e) => Ok(e.insert(agg)),
    }
}
