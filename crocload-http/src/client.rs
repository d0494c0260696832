//! HTTP client implementation

use crate::config::HttpConfig;
use crate::errors::HttpError;
use crate::types::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
use futures::future::join_all;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client,
};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// HTTP client trait for making HTTP requests
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    /// Send one request and read the whole response body
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;

    /// Send all requests concurrently; results keep the input order
    async fn batch(&self, requests: Vec<HttpRequest>) -> Vec<Result<HttpResponse, HttpError>> {
        join_all(requests.into_iter().map(|request| self.send(request))).await
    }
}

/// Canned response served in offline mode
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// JSON body with a matching content type
    pub fn json(status: u16, body: &JsonValue) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self {
            status,
            headers,
            body: body.to_string(),
        }
    }
}

/// HTTP Manager for handling HTTP requests with mock support
#[derive(Debug, Clone)]
pub struct HttpManager {
    /// `None` in offline mode
    client: Option<Client>,
    mocks: HashMap<String, MockResponse>,
    config: HttpConfig,
}

impl HttpManager {
    /// Create an online HttpManager with default configuration
    pub fn new() -> Result<Self, HttpError> {
        Self::with_config(HttpConfig::default())
    }

    /// Create an online HttpManager with specific configuration.
    ///
    /// The underlying client (and its connection pool) is built once and
    /// shared by every request sent through this manager and its clones.
    pub fn with_config(config: HttpConfig) -> Result<Self, HttpError> {
        debug!(
            "Creating HttpManager with timeout: {}s",
            config.timeout.as_secs()
        );
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .redirect(reqwest::redirect::Policy::limited(
                config.max_redirects as usize,
            ))
            .build()
            .map_err(HttpError::ClientBuild)?;

        Ok(Self {
            client: Some(client),
            mocks: HashMap::new(),
            config,
        })
    }

    /// Create an HttpManager that only answers from registered mocks
    pub fn offline() -> Self {
        debug!("Creating offline HttpManager");
        Self {
            client: None,
            mocks: HashMap::new(),
            config: HttpConfig::default(),
        }
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Add a single HTTP mock, keyed by method and exact URL
    pub fn add_mock(&mut self, method: HttpMethod, url: &str, response: MockResponse) {
        self.mocks.insert(mock_key(method, url), response);
        debug!("Added HTTP mock for {} {}", method, url);
    }

    /// Add a single HTTP mock using string method
    pub fn add_mock_str(
        &mut self,
        method: &str,
        url: &str,
        response: MockResponse,
    ) -> Result<(), crate::types::HttpMethodError> {
        let http_method: HttpMethod = method.parse()?;
        self.add_mock(http_method, url, response);
        Ok(())
    }

    /// Clear all mocks
    pub fn clear_mocks(&mut self) {
        self.mocks.clear();
        debug!("Cleared all HTTP mocks");
    }

    fn mock_response(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let mock = self
            .mocks
            .get(&mock_key(request.method, &request.url))
            .ok_or_else(|| HttpError::MockNotFound {
                method: request.method.to_string(),
                url: request.url.clone(),
            })?;

        trace!("Serving mock response for {} {}", request.method, request.url);
        Ok(HttpResponse {
            method: request.method,
            url: request.url.clone(),
            status: mock.status,
            headers: mock.headers.clone(),
            body: mock.body.clone(),
            duration: Duration::ZERO,
        })
    }
}

#[async_trait::async_trait]
impl HttpClient for HttpManager {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let Some(client) = &self.client else {
            return self.mock_response(&request);
        };

        let url = reqwest::Url::parse(&request.url).map_err(|e| HttpError::InvalidUrl {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;

        let mut header_map = HeaderMap::new();
        for (key, value) in &request.headers {
            let header_name = HeaderName::from_str(key)
                .map_err(|_| HttpError::InvalidHeader(format!("name '{}'", key)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| HttpError::InvalidHeader(format!("value for '{}'", key)))?;
            header_map.insert(header_name, header_value);
        }

        let mut builder = client
            .request(reqwest::Method::from(request.method), url)
            .headers(header_map);

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Form(pairs) => builder.form(pairs),
            RequestBody::Json(value) => builder.json(value),
        };

        debug!("Sending {} {}", request.method, request.url);
        let started = Instant::now();
        let timeout = self.config.timeout;
        let on_error = |e: reqwest::Error| {
            if e.is_timeout() {
                HttpError::Timeout {
                    url: request.url.clone(),
                    timeout,
                }
            } else {
                HttpError::Transport(e)
            }
        };
        let response = builder.send().await.map_err(on_error)?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(on_error)?;
        let duration = started.elapsed();

        debug!(
            "{} {} -> {} in {}ms",
            request.method,
            request.url,
            status,
            duration.as_millis()
        );

        Ok(HttpResponse {
            method: request.method,
            url: request.url,
            status,
            headers,
            body,
            duration,
        })
    }
}

fn mock_key(method: HttpMethod, url: &str) -> String {
    format!("{}:{}", method.as_str(), url)
}
