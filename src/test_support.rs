use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::{ApiError, DataGraphApi, QueryRequest};
use crate::config::{AuthScheme, Config};
use crate::AppState;

enum StubOutcome {
    Ok(Value),
    Rejected(u16, Option<String>),
    Transport(String),
}

/// Answers every endpoint with one canned outcome and records the calls it received.
pub struct StubApi {
    outcome: StubOutcome,
    calls: Mutex<Vec<String>>,
}

impl StubApi {
    pub fn ok(body: Value) -> Self {
        Self::with(StubOutcome::Ok(body))
    }

    pub fn rejected(status: u16, message: Option<&str>) -> Self {
        Self::with(StubOutcome::Rejected(status, message.map(str::to_string)))
    }

    pub fn transport(message: &str) -> Self {
        Self::with(StubOutcome::Transport(message.to_string()))
    }

    fn with(outcome: StubOutcome) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    fn respond(&self, call: String) -> Result<Value, ApiError> {
        self.calls.lock().expect("calls lock").push(call);
        match &self.outcome {
            StubOutcome::Ok(body) => Ok(body.clone()),
            StubOutcome::Rejected(status, message) => Err(ApiError::Rejected {
                status: *status,
                message: message.clone(),
            }),
            StubOutcome::Transport(message) => Err(ApiError::Transport(message.clone())),
        }
    }
}

#[async_trait]
impl DataGraphApi for StubApi {
    async fn city_schema(&self, city: &str) -> Result<Value, ApiError> {
        self.respond(format!("GET /api/{city}/schema"))
    }

    async fn query_city(&self, city: &str, _request: &QueryRequest) -> Result<Value, ApiError> {
        self.respond(format!("POST /api/{city}/query"))
    }

    async fn list_datasets(&self, city: Option<&str>) -> Result<Value, ApiError> {
        match city {
            Some(city) => self.respond(format!("GET /datasets?city={city}")),
            None => self.respond("GET /datasets".to_string()),
        }
    }

    async fn list_cities(&self) -> Result<Value, ApiError> {
        self.respond("GET /cities".to_string())
    }

    async fn usage(&self) -> Result<Value, ApiError> {
        self.respond("GET /usage".to_string())
    }

    async fn health(&self) -> Result<Value, ApiError> {
        self.respond("GET /health".to_string())
    }
}

pub fn test_config() -> Config {
    Config {
        api_key: "dg-test-key".to_string(),
        api_url: "http://datagraph.test".parse().expect("valid url"),
        auth_scheme: AuthScheme::Bearer,
        timeout: Duration::from_secs(5),
    }
}

pub fn test_state(api: Arc<dyn DataGraphApi>) -> AppState {
    AppState::new(&test_config(), api)
}
