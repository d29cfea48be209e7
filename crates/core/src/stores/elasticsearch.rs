use crate::config::EngineConfig;
use crate::models::{EngineHit, EngineInfo};
use crate::traits::SearchEngine;
use crate::SearchError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use url::Url;

const BACKEND: &str = "elasticsearch";

const RETRY_STATUSES: [StatusCode; 3] = [
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

pub struct ElasticsearchStore {
    client: Arc<Client>,
    endpoint: Url,
    config: EngineConfig,
}

impl ElasticsearchStore {
    pub fn new(config: EngineConfig) -> Result<Self, SearchError> {
        let endpoint = config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        debug!(
            endpoint = %endpoint,
            timeout_ms = config.request_timeout.as_millis() as u64,
            max_retries = config.max_retries,
            "initialized elasticsearch client"
        );

        Ok(Self {
            client: Arc::new(client),
            endpoint,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn info(&self) -> Result<EngineInfo, SearchError> {
        let url = self.endpoint.clone();
        let response = self.send(|client| client.get(url.clone())).await?;
        if !response.status().is_success() {
            return Err(unexpected(response).await);
        }

        let body: Value = response.json().await?;
        Ok(EngineInfo {
            cluster_name: body
                .pointer("/cluster_name")
                .and_then(Value::as_str)
                .map(str::to_string),
            version: body
                .pointer("/version/number")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    /// Endpoint URL with `segments` appended as percent-encoded path segments, so an id
    /// holding `#`, `?` or `/` stays one segment.
    fn url(&self, segments: &[&str]) -> Result<Url, SearchError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| {
                SearchError::InvalidArgument(format!(
                    "endpoint {} cannot carry a path",
                    self.endpoint
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn doc_url(&self, index: &str, id: &str) -> Result<Url, SearchError> {
        self.url(&[index, "_doc", id])
    }

    /// Sends the request built by `build`, resending on connection failures, timeouts
    /// (when enabled) and gateway statuses until the retry budget is spent.
    async fn send<F>(&self, build: F) -> Result<Response, SearchError>
    where
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let failure = match build(self.client.as_ref()).send().await {
                Ok(response) if RETRY_STATUSES.contains(&response.status()) => {
                    response.status().to_string()
                }
                Ok(response) => return Ok(response),
                Err(error) if error.is_connect() || error.is_timeout() => {
                    if error.is_timeout() && !self.config.retry_on_timeout {
                        return Err(SearchError::Unavailable {
                            attempts: attempt,
                            reason: error.to_string(),
                        });
                    }
                    error.to_string()
                }
                Err(error) => return Err(SearchError::Http(error)),
            };

            if attempt > self.config.max_retries {
                return Err(SearchError::Unavailable {
                    attempts: attempt,
                    reason: failure,
                });
            }

            debug!(attempt, reason = %failure, "engine request failed, retrying");
            tokio::time::sleep(self.config.retry_backoff * attempt).await;
        }
    }
}

#[async_trait]
impl SearchEngine for ElasticsearchStore {
    async fn ping(&self) -> bool {
        match self.client.head(self.endpoint.clone()).send().await {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                debug!(error = %error, "ping failed");
                false
            }
        }
    }

    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        let url = self.url(&[index])?;
        let response = self.send(|client| client.head(url.clone())).await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(unexpected(response).await),
        }
    }

    async fn create_index(&self, index: &str, schema: &Value) -> Result<(), SearchError> {
        let url = self.url(&[index])?;
        let response = self.send(|client| client.put(url.clone()).json(schema)).await?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let error_type = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|parsed| {
                parsed
                    .pointer("/error/type")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            });

        if error_type.as_deref() == Some("resource_already_exists_exception") {
            return Err(SearchError::IndexAlreadyExists(index.to_string()));
        }

        Err(SearchError::BackendResponse {
            backend: BACKEND.to_string(),
            details: format!("{status}: {body}"),
        })
    }

    async fn delete_index(&self, index: &str) -> Result<(), SearchError> {
        let url = self.url(&[index])?;
        let response = self.send(|client| client.delete(url.clone())).await?;

        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(unexpected(response).await)
    }

    async fn index_document(
        &self,
        index: &str,
        id: &str,
        body: &Value,
    ) -> Result<(), SearchError> {
        let url = self.doc_url(index, id)?;
        let response = self.send(|client| client.put(url.clone()).json(body)).await?;

        if !response.status().is_success() {
            return Err(unexpected(response).await);
        }
        Ok(())
    }

    async fn get_document(&self, index: &str, id: &str) -> Result<Value, SearchError> {
        let url = self.doc_url(index, id)?;
        let response = self.send(|client| client.get(url.clone())).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(not_found(index, id));
        }
        if !response.status().is_success() {
            return Err(unexpected(response).await);
        }

        let body: Value = response.json().await?;
        if body.pointer("/found").and_then(Value::as_bool) == Some(false) {
            return Err(not_found(index, id));
        }

        body.pointer("/_source")
            .cloned()
            .ok_or_else(|| SearchError::BackendResponse {
                backend: BACKEND.to_string(),
                details: format!("document {id} has no _source"),
            })
    }

    async fn document_exists(&self, index: &str, id: &str) -> Result<bool, SearchError> {
        let url = self.doc_url(index, id)?;
        let response = self.send(|client| client.head(url.clone())).await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(unexpected(response).await),
        }
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<(), SearchError> {
        let url = self.doc_url(index, id)?;
        let response = self.send(|client| client.delete(url.clone())).await?;

        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(unexpected(response).await)
    }

    async fn update_document(
        &self,
        index: &str,
        id: &str,
        partial: &Value,
    ) -> Result<(), SearchError> {
        let url = self.url(&[index, "_update", id])?;
        let body = json!({ "doc": partial });
        let response = self.send(|client| client.post(url.clone()).json(&body)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(not_found(index, id));
        }
        if !response.status().is_success() {
            return Err(unexpected(response).await);
        }
        Ok(())
    }

    async fn count(&self, index: &str) -> Result<u64, SearchError> {
        let url = self.url(&[index, "_count"])?;
        let response = self.send(|client| client.get(url.clone())).await?;

        if !response.status().is_success() {
            return Err(unexpected(response).await);
        }

        let body: Value = response.json().await?;
        body.pointer("/count")
            .and_then(Value::as_u64)
            .ok_or_else(|| SearchError::BackendResponse {
                backend: BACKEND.to_string(),
                details: "count response has no `count`".to_string(),
            })
    }

    async fn search(
        &self,
        index: &str,
        query: &Value,
        size: usize,
    ) -> Result<Vec<EngineHit>, SearchError> {
        let url = self.url(&[index, "_search"])?;
        let size = size.to_string();
        let response = self
            .send(|client| {
                client
                    .post(url.clone())
                    .query(&[("size", size.as_str())])
                    .json(query)
            })
            .await?;

        if !response.status().is_success() {
            return Err(unexpected(response).await);
        }

        let response_json: Value = response.json().await?;
        let hits = response_json
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut result = Vec::with_capacity(hits.len());
        for raw in hits {
            let id = raw
                .pointer("/_id")
                .and_then(Value::as_str)
                .ok_or_else(|| SearchError::BackendResponse {
                    backend: BACKEND.to_string(),
                    details: "search hit has no `_id`".to_string(),
                })?
                .to_string();
            let score = raw.pointer("/_score").and_then(Value::as_f64).unwrap_or(0.0);
            let source = raw.pointer("/_source").cloned().unwrap_or(Value::Null);

            result.push(EngineHit { id, score, source });
        }

        Ok(result)
    }
}

fn not_found(index: &str, id: &str) -> SearchError {
    SearchError::DocumentNotFound {
        index: index.to_string(),
        id: id.to_string(),
    }
}

async fn unexpected(response: Response) -> SearchError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    SearchError::BackendResponse {
        backend: BACKEND.to_string(),
        details: format!("{status}: {body}"),
    }
}
