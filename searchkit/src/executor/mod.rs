//! Search executors
//!
//! The executor is the only component that talks to a search engine. It takes
//! an index name plus a serialized request body and hands back the raw JSON
//! response; everything else in this crate is pure value construction.

mod http;
mod memory;

pub use http::HttpExecutor;
pub use memory::{InMemoryExecutor, StoredDocument};

use crate::error::ExecutorError;
use async_trait::async_trait;
use serde_json::Value;

/// Per-call options forwarded to the executor untouched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Ask the engine not to answer from its request cache
    pub ignore_cache: bool,
}

impl ExecuteOptions {
    pub fn ignore_cache() -> Self {
        Self { ignore_cache: true }
    }
}

/// Executes serialized search requests against an engine
#[async_trait]
pub trait SearchExecutor: Send + Sync {
    /// Run a search body against `index` and return the raw response
    async fn search(
        &self,
        index: &str,
        body: &Value,
        options: &ExecuteOptions,
    ) -> Result<Value, ExecutorError>;

    /// Count documents matching the query in `body`
    async fn count(&self, index: &str, body: &Value) -> Result<u64, ExecutorError>;

    /// Human-readable executor name
    fn name(&self) -> &str;
}
