//! HTTP executor for Elasticsearch-compatible engines

use super::{ExecuteOptions, SearchExecutor};
use crate::config::{AuthMethod, EngineConfig};
use crate::error::ExecutorError;
use crate::response::TotalHits;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Executor that POSTs request bodies to `{url}/{index}/_search`
pub struct HttpExecutor {
    client: Client,
    base_url: Url,
    auth: AuthMethod,
}

#[derive(Deserialize)]
struct CountResponse {
    hits: CountHits,
}

#[derive(Deserialize)]
struct CountHits {
    total: TotalHits,
}

impl HttpExecutor {
    pub fn new(config: &EngineConfig) -> Result<Self, ExecutorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: normalize_base(&config.url)?,
            auth: config.auth.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn search_url(&self, index: &str) -> Result<Url, ExecutorError> {
        Ok(self.base_url.join(&format!("{}/_search", index))?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            AuthMethod::None => request,
            AuthMethod::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
            AuthMethod::ApiKey { key } => {
                request.header(reqwest::header::AUTHORIZATION, format!("ApiKey {}", key))
            }
        }
    }

    async fn post(&self, url: Url, body: &Value) -> Result<Value, ExecutorError> {
        debug!("POST {}", url);

        let response = self
            .authorize(self.client.post(url).json(body))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ExecutorError::from_engine_body(status.as_u16(), &text));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Make sure joins append to the configured path instead of replacing its last segment
fn normalize_base(raw: &str) -> Result<Url, ExecutorError> {
    let mut url = Url::parse(raw.trim())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[async_trait]
impl SearchExecutor for HttpExecutor {
    async fn search(
        &self,
        index: &str,
        body: &Value,
        options: &ExecuteOptions,
    ) -> Result<Value, ExecutorError> {
        let mut url = self.search_url(index)?;
        if options.ignore_cache {
            url.query_pairs_mut().append_pair("request_cache", "false");
        }
        self.post(url, body).await
    }

    async fn count(&self, index: &str, body: &Value) -> Result<u64, ExecutorError> {
        let raw = self.post(self.search_url(index)?, body).await?;
        let parsed: CountResponse = serde_json::from_value(raw)?;
        Ok(parsed.hits.total.value)
    }

    fn name(&self) -> &str {
        "http"
    }
}
