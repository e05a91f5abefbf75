use super::emit;
use anyhow::{bail, Result};
use searchkit::aggs::{Aggregation, MetricKind};
use searchkit::request::SortOrder;
use searchkit::{SearchExecutor, SearchRequest};
use serde_json::{json, Map, Value};
use std::io::Write;

const AGG_NAME: &str = "group_by";

/// Flags of the `group-by` subcommand
#[derive(Debug, Clone)]
pub struct GroupByOptions {
    pub field: String,
    /// Numeric field averaged inside each bucket
    pub avg: Option<String>,
    pub size: usize,
    /// Order buckets by the average instead of doc count
    pub order_by_metric: bool,
}

fn metric_name(field: &str) -> String {
    format!("average_{}", field.trim_end_matches(".keyword"))
}

fn build_aggregation(opts: &GroupByOptions) -> Result<Aggregation> {
    let mut agg = Aggregation::terms_with_size(&opts.field, opts.size);

    match (&opts.avg, opts.order_by_metric) {
        (None, true) => bail!("--order-by-metric needs --avg"),
        (None, false) => {}
        (Some(metric_field), order_by_metric) => {
            let name = metric_name(metric_field);
            if order_by_metric {
                agg = agg.with_order(name.clone(), SortOrder::Desc);
            }
            agg.metric(name, MetricKind::Avg, metric_field)?;
        }
    }

    agg.validate()?;
    Ok(agg)
}

/// Print one JSON line per bucket: key, doc count and any metrics
pub async fn run_group_by<E, W>(executor: &E, index: &str, opts: &GroupByOptions, out: &mut W) -> Result<()>
where
    E: SearchExecutor + ?Sized,
    W: Write,
{
    let request = SearchRequest::new(index)
        .with_pagination(0, 0)?
        .with_aggregation(AGG_NAME, build_aggregation(opts)?)?;

    let response = request.execute(executor).await?;
    let buckets = response.buckets_of(AGG_NAME)?;

    for bucket in buckets {
        let mut line = Map::new();
        line.insert("key".to_string(), bucket.key().clone());
        line.insert("doc_count".to_string(), json!(bucket.doc_count()));
        for (name, value) in bucket.metrics() {
            line.insert(name.to_string(), value.map_or(Value::Null, |v| json!(v)));
        }
        emit(out, &line)?;
    }

    tracing::info!("{} buckets for '{}'", buckets.len(), opts.field);
    Ok(())
}
