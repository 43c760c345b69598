//! Client for the remote DataGraph HTTP API
//!
//! Every tool and resource ends in exactly one call through [`DataGraphApi`]. The HTTP
//! implementation performs no retries; callers that want another attempt re-invoke.

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    config::{AuthScheme, Config},
    errors::AppError,
};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Body of `POST /api/{city}/query`. Absent optionals are left out of the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cypher_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cypher_params: Option<Map<String, Value>>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("remote API returned status {status}")]
    Rejected { status: u16, message: Option<String> },
    #[error("{0}")]
    Transport(String),
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Folds the client failure into the dispatcher taxonomy. `operation` names the tool or
    /// resource and fills in the message when the API gave no `error` field.
    pub fn into_app_error(self, operation: &str) -> AppError {
        match self {
            Self::Rejected { status, message } => AppError::RemoteRejected {
                status,
                message: message
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| format!("{operation} failed")),
            },
            Self::Transport(message) => AppError::Transport(message),
            Self::Decode(message) => {
                AppError::Transport(format!("invalid response from DataGraph API: {message}"))
            }
            Self::Config(message) => AppError::internal(message),
        }
    }
}

#[async_trait]
pub trait DataGraphApi: Send + Sync {
    async fn city_schema(&self, city: &str) -> Result<Value, ApiError>;
    async fn query_city(&self, city: &str, request: &QueryRequest) -> Result<Value, ApiError>;
    async fn list_datasets(&self, city: Option<&str>) -> Result<Value, ApiError>;
    async fn list_cities(&self) -> Result<Value, ApiError>;
    async fn usage(&self) -> Result<Value, ApiError>;
    async fn health(&self) -> Result<Value, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpDataGraphClient {
    client: Client,
    base_url: String,
}

impl HttpDataGraphClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let (name, raw_value) = match config.auth_scheme {
            AuthScheme::Bearer => (header::AUTHORIZATION, format!("Bearer {}", config.api_key)),
            AuthScheme::ApiKeyHeader => (
                header::HeaderName::from_static("x-api-key"),
                config.api_key.clone(),
            ),
        };
        let mut value = header::HeaderValue::from_str(&raw_value)
            .map_err(|_| ApiError::Config("API key is not a valid header value".to_string()))?;
        value.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(name, value);

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|err| ApiError::Config(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_base(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.url(path);
        debug!(method = "GET", url = %url, "calling DataGraph API");
        send(self.client.get(url)).await
    }
}

#[async_trait]
impl DataGraphApi for HttpDataGraphClient {
    async fn city_schema(&self, city: &str) -> Result<Value, ApiError> {
        self.get(&format!("/api/{city}/schema")).await
    }

    async fn query_city(&self, city: &str, request: &QueryRequest) -> Result<Value, ApiError> {
        let url = self.url(&format!("/api/{city}/query"));
        debug!(method = "POST", url = %url, "calling DataGraph API");
        send(self.client.post(url).json(request)).await
    }

    async fn list_datasets(&self, city: Option<&str>) -> Result<Value, ApiError> {
        let url = self.url("/datasets");
        debug!(method = "GET", url = %url, city = ?city, "calling DataGraph API");
        let mut request = self.client.get(url);
        if let Some(city) = city {
            request = request.query(&[("city", city)]);
        }
        send(request).await
    }

    async fn list_cities(&self) -> Result<Value, ApiError> {
        self.get("/cities").await
    }

    async fn usage(&self) -> Result<Value, ApiError> {
        self.get("/usage").await
    }

    async fn health(&self) -> Result<Value, ApiError> {
        self.get("/health").await
    }
}

async fn send(request: RequestBuilder) -> Result<Value, ApiError> {
    let response = request.send().await.map_err(describe_transport_error)?;
    let status = response.status();
    let body = response.text().await.map_err(describe_transport_error)?;
    debug!(status = status.as_u16(), bytes = body.len(), "DataGraph API responded");

    if !status.is_success() {
        warn!(status = status.as_u16(), "DataGraph API rejected request");
        return Err(ApiError::Rejected {
            status: status.as_u16(),
            message: extract_error_message(&body),
        });
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&body).map_err(|err| ApiError::Decode(err.to_string()))
}

fn describe_transport_error(err: reqwest::Error) -> ApiError {
    let message = if err.is_timeout() {
        "DataGraph API request timed out".to_string()
    } else if err.is_connect() {
        format!("could not connect to DataGraph API: {err}")
    } else {
        format!("DataGraph API request failed: {err}")
    };
    ApiError::Transport(message)
}

/// Pulls a readable message out of an API error payload, if it carries one.
pub fn extract_error_message(body: &str) -> Option<String> {
    let payload: Value = serde_json::from_str(body).ok()?;
    let message = match payload.get("error")? {
        Value::Null => return None,
        Value::String(message) => message.clone(),
        Value::Object(object) => object
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Value::Object(object.clone()).to_string()),
        other => other.to_string(),
    };

    let message = message.trim();
    (!message.is_empty()).then(|| message.to_string())
}

/// One-shot connectivity check run at startup. Never fatal.
pub async fn probe_health(api: &dyn DataGraphApi) {
    match api.health().await {
        Ok(_) => info!("DataGraph API health check passed"),
        Err(err) => warn!(error = %err, "DataGraph API health check failed; continuing"),
    }
}
