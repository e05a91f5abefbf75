//! Query builder and result accessor for Elasticsearch-compatible engines
//!
//! Requests are plain values: build a [`Query`], attach sorting, pagination,
//! projection and named [`Aggregation`] trees to a [`SearchRequest`], then run
//! it through any [`SearchExecutor`]. Responses expose hits in engine order and
//! aggregation buckets by the names the request gave them.
//!
//! # Executors
//!
//! - [`HttpExecutor`] - POSTs to `{url}/{index}/_search` with reqwest
//! - [`InMemoryExecutor`] - evaluates requests over in-process documents;
//!   [`sample::executor`] preloads the bank-accounts dataset
//!
//! # Example
//!
//! ```
//! use searchkit::aggs::BucketKind;
//! use searchkit::{sample, SearchRequest};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> searchkit::Result<()> {
//! let executor = sample::executor(1000);
//! let request = SearchRequest::new("bank")
//!     .with_pagination(0, 0)?
//!     .bucket("group_by_state", BucketKind::Terms, "state.keyword")?;
//!
//! let response = request.execute(&executor).await?;
//! let states = response.buckets_of("group_by_state")?;
//! assert_eq!(states.len(), 10);
//! # Ok(())
//! # }
//! ```

pub mod aggs;
pub mod config;
pub mod error;
pub mod executor;
pub mod query;
pub mod request;
pub mod response;
pub mod sample;

pub use aggs::Aggregation;
pub use config::Config;
pub use error::{Error, ExecutorError};
pub use executor::{ExecuteOptions, HttpExecutor, InMemoryExecutor, SearchExecutor};
pub use query::Query;
pub use request::SearchRequest;
pub use response::{Bucket, Hit, SearchResponse};

/// Result type for searchkit operations
pub type Result<T> = std::result::Result<T, Error>;
