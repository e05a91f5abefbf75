//! Running requests through an executor

use crate::error::Error;
use crate::executor::{ExecuteOptions, SearchExecutor};
use crate::request::SearchRequest;
use crate::response::{Hit, SearchResponse};
use crate::Result;
use futures::Stream;
use tracing::{debug, warn};

impl SearchRequest {
    /// Submit the full request
    pub async fn execute<E>(&self, executor: &E) -> Result<SearchResponse>
    where
        E: SearchExecutor + ?Sized,
    {
        self.execute_with(executor, &ExecuteOptions::default()).await
    }

    /// Submit the full request with per-call options
    pub async fn execute_with<E>(
        &self,
        executor: &E,
        options: &ExecuteOptions,
    ) -> Result<SearchResponse>
    where
        E: SearchExecutor + ?Sized,
    {
        let body = self.to_json()?;

        debug!(
            executor = executor.name(),
            index = %self.index,
            from = self.from,
            size = ?self.size,
            aggs = self.aggs.len(),
            ignore_cache = options.ignore_cache,
            "Executing search"
        );

        let raw = executor
            .search(&self.index, &body, options)
            .await
            .map_err(|e| {
                warn!(executor = executor.name(), index = %self.index, "Search failed: {}", e);
                Error::from(e)
            })?;

        let response = SearchResponse::from_json(raw, self.aggregation_names())?;
        debug!(
            index = %self.index,
            hits = response.len(),
            total = ?response.total(),
            took_ms = response.took(),
            "Search completed"
        );
        Ok(response)
    }

    /// Count matching documents without materializing hits or aggregations
    pub async fn count<E>(&self, executor: &E) -> Result<u64>
    where
        E: SearchExecutor + ?Sized,
    {
        let body = serde_json::to_value(self.count_body())
            .map_err(|e| Error::invalid(format!("request does not serialize: {}", e)))?;

        debug!(executor = executor.name(), index = %self.index, "Counting documents");

        executor.count(&self.index, &body).await.map_err(|e| {
            warn!(executor = executor.name(), index = %self.index, "Count failed: {}", e);
            Error::from(e)
        })
    }

    /// Stream every hit from the request's offset onwards, one page per round trip.
    ///
    /// Each page is a separate request; the stream ends after the first short
    /// page or the first error. Aggregations are not sent.
    pub fn scan<'a, E>(
        &'a self,
        executor: &'a E,
        page_size: usize,
    ) -> impl Stream<Item = Result<Hit>> + 'a
    where
        E: SearchExecutor + ?Sized,
    {
        self.scan_with(executor, page_size, ExecuteOptions::default())
    }

    /// Like [`scan`](Self::scan), sending `options` with every page
    pub fn scan_with<'a, E>(
        &'a self,
        executor: &'a E,
        page_size: usize,
        options: ExecuteOptions,
    ) -> impl Stream<Item = Result<Hit>> + 'a
    where
        E: SearchExecutor + ?Sized,
    {
        let page_size = page_size.max(1);
        async_stream::try_stream! {
            let mut from = self.from;
            loop {
                let page = self
                    .page(from, page_size)
                    .execute_with(executor, &options)
                    .await?;
                let fetched = page.len();
                for hit in page {
                    yield hit;
                }
                if fetched < page_size {
                    break;
                }
                from += fetched;
            }
        }
    }
}
