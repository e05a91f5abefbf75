use super::{emit, parse};
use anyhow::Result;
use searchkit::{SearchExecutor, SearchRequest};
use serde_json::json;
use std::io::Write;

/// Count documents matching every `--match FIELD=VALUE` clause
pub async fn run_count<E, W>(executor: &E, index: &str, matches: &[String], out: &mut W) -> Result<()>
where
    E: SearchExecutor + ?Sized,
    W: Write,
{
    let mut request = SearchRequest::new(index);
    if let Some(query) = parse::build_query(matches, &[], &[])? {
        request = request.with_query(query);
    }

    let count = request.count(executor).await?;
    tracing::info!("{} documents in '{}'", count, index);
    emit(out, &json!({ "index": index, "count": count }))
}
