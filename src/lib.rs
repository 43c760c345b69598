use std::sync::Arc;

use chrono::{DateTime, Utc};

pub mod api;
pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod mcp;

#[cfg(test)]
pub(crate) mod test_support;

use api::DataGraphApi;
use config::{AuthScheme, Config};

/// Read-only state shared by every request: built once at startup, never mutated.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn DataGraphApi>,
    pub api_base_url: Arc<str>,
    pub auth_scheme: AuthScheme,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: &Config, api: Arc<dyn DataGraphApi>) -> Self {
        Self {
            api,
            api_base_url: Arc::<str>::from(config.api_base()),
            auth_scheme: config.auth_scheme,
            started_at: Utc::now(),
        }
    }
}
