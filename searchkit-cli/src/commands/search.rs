use super::{emit, parse};
use anyhow::Result;
use futures::StreamExt;
use searchkit::{ExecuteOptions, SearchExecutor, SearchRequest};
use std::io::Write;

/// Flags of the `search` subcommand
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub matches: Vec<String>,
    pub phrases: Vec<String>,
    pub ranges: Vec<String>,
    pub sort: Vec<String>,
    pub from: i64,
    pub size: i64,
    pub source: Option<String>,
    pub ignore_cache: bool,
    /// Page through every hit instead of returning one window
    pub scan: bool,
}

fn build_request(index: &str, opts: &SearchOptions) -> Result<SearchRequest> {
    let mut request = SearchRequest::new(index);

    if let Some(query) = parse::build_query(&opts.matches, &opts.phrases, &opts.ranges)? {
        request = request.with_query(query);
    }

    let sort = opts
        .sort
        .iter()
        .map(|raw| parse::sort_field(raw))
        .collect::<Result<Vec<_>>>()?;
    request = request.with_sort(sort);

    if let Some(fields) = &opts.source {
        request = request.with_source_fields(parse::field_list(fields)?);
    }

    Ok(request.with_pagination(opts.from, opts.size)?)
}

/// Print matching hits as JSON lines, in engine order
pub async fn run_search<E, W>(executor: &E, index: &str, opts: &SearchOptions, out: &mut W) -> Result<()>
where
    E: SearchExecutor + ?Sized,
    W: Write,
{
    let request = build_request(index, opts)?;
    let options = ExecuteOptions {
        ignore_cache: opts.ignore_cache,
    };

    if opts.scan {
        let page_size = usize::try_from(opts.size.max(1))?;
        let mut hits = Box::pin(request.scan_with(executor, page_size, options));
        let mut seen = 0usize;
        while let Some(hit) = hits.next().await {
            emit(out, &hit?)?;
            seen += 1;
        }
        tracing::info!("Scanned {} hits from '{}'", seen, index);
        return Ok(());
    }

    let response = request.execute_with(executor, &options).await?;

    for hit in &response {
        emit(out, hit)?;
    }
    tracing::info!(
        "{} hits of {} total in {}ms",
        response.len(),
        response.total().map_or_else(|| "?".to_string(), |t| t.to_string()),
        response.took()
    );
    Ok(())
}
