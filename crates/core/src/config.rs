use crate::SearchError;
use std::time::Duration;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:9200";

/// Connection and transport policy for the engine, fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub endpoint: String,
    pub request_timeout: Duration,
    /// Extra attempts after the first one; zero disables retries.
    pub max_retries: u32,
    pub retry_on_timeout: bool,
    /// Attempt `n` waits `n * retry_backoff` before resending.
    pub retry_backoff: Duration,
    /// Concurrent document writes during a bulk load. 1 keeps writes sequential.
    pub write_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(30),
            max_retries: 10,
            retry_on_timeout: true,
            retry_backoff: Duration::from_millis(250),
            write_concurrency: 1,
        }
    }
}

impl EngineConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_on_timeout(mut self, retry_on_timeout: bool) -> Self {
        self.retry_on_timeout = retry_on_timeout;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_write_concurrency(mut self, concurrency: usize) -> Self {
        self.write_concurrency = concurrency;
        self
    }

    /// Parses the endpoint and checks the numeric knobs.
    pub fn validate(&self) -> Result<Url, SearchError> {
        let url = Url::parse(&self.endpoint)?;
        if url.cannot_be_a_base() {
            return Err(SearchError::InvalidArgument(format!(
                "endpoint is not a base url: {}",
                self.endpoint
            )));
        }
        if self.write_concurrency == 0 {
            return Err(SearchError::InvalidArgument(
                "write concurrency must be at least 1".to_string(),
            ));
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_deployment() {
        let config = EngineConfig::default();
        assert_eq!(config.endpoint, "http://localhost:9200");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 10);
        assert!(config.retry_on_timeout);
        assert_eq!(config.write_concurrency, 1);
    }

    #[test]
    fn validation_rejects_bad_endpoint_and_zero_concurrency() {
        assert!(matches!(
            EngineConfig::new("not a url").validate(),
            Err(SearchError::Url(_))
        ));
        assert!(matches!(
            EngineConfig::default().with_write_concurrency(0).validate(),
            Err(SearchError::InvalidArgument(_))
        ));
        assert!(EngineConfig::new("http://es.internal:9200/").validate().is_ok());
    }
}
