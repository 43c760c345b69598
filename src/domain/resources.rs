//! Read-only resources backed by the DataGraph API
//!
//! Unlike tools, a failed read is reported as a JSON-RPC error naming the URI rather than
//! folded into a successful result.

use rust_mcp_sdk::schema::{
    ReadResourceContent, ReadResourceRequestParams, ReadResourceResult, Resource,
    TextResourceContents,
};
use serde_json::{json, Value};
use tracing::warn;

use crate::domain::utils::pretty_json;
use crate::errors::AppError;
use crate::mcp::rpc::{app_error_to_json_rpc_with_context, json_rpc_error, json_rpc_result};
use crate::AppState;

pub const CITIES_RESOURCE_URI: &str = "datagraph://cities";
pub const DATASETS_RESOURCE_URI: &str = "datagraph://datasets";
pub const NYC_SCHEMA_RESOURCE_URI: &str = "datagraph://schema/nyc";
pub const USAGE_RESOURCE_URI: &str = "datagraph://usage";

pub const RESOURCE_URIS: [&str; 4] = [
    CITIES_RESOURCE_URI,
    DATASETS_RESOURCE_URI,
    NYC_SCHEMA_RESOURCE_URI,
    USAGE_RESOURCE_URI,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataGraphResource {
    Cities,
    Datasets,
    CitySchema { city: String },
    Usage,
}

impl DataGraphResource {
    /// Only registered URIs resolve; the schema city comes from the last path segment.
    pub fn resolve(uri: &str) -> Result<Self, AppError> {
        if !RESOURCE_URIS.contains(&uri) {
            return Err(AppError::UnknownResource(uri.to_string()));
        }

        let resource = match uri {
            CITIES_RESOURCE_URI => Self::Cities,
            DATASETS_RESOURCE_URI => Self::Datasets,
            USAGE_RESOURCE_URI => Self::Usage,
            _ => Self::CitySchema {
                city: uri.rsplit('/').next().unwrap_or_default().to_string(),
            },
        };

        Ok(resource)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Cities => "Available Cities",
            Self::Datasets => "Datasets",
            Self::CitySchema { .. } => "NYC Graph Schema",
            Self::Usage => "API Usage",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::Cities => "Cities with civic data loaded in the graph",
            Self::Datasets => "All datasets loaded in the graph with their sources",
            Self::CitySchema { .. } => "Node labels, relationships and properties for New York City",
            Self::Usage => "API usage statistics for the configured key",
        }
    }
}

pub fn build_resources_list() -> Vec<Resource> {
    RESOURCE_URIS
        .into_iter()
        .filter_map(|uri| DataGraphResource::resolve(uri).ok().map(|resource| (uri, resource)))
        .map(|(uri, resource)| Resource {
            annotations: None,
            description: Some(resource.description().to_string()),
            icons: vec![],
            meta: None,
            mime_type: Some("application/json".to_string()),
            name: resource.name().to_string(),
            size: None,
            title: None,
            uri: uri.to_string(),
        })
        .collect()
}

pub async fn read_resource(state: &AppState, uri: &str) -> Result<ReadResourceResult, AppError> {
    let resource = DataGraphResource::resolve(uri)?;
    let outcome = match &resource {
        DataGraphResource::Cities => state.api.list_cities().await,
        DataGraphResource::Datasets => state.api.list_datasets(None).await,
        DataGraphResource::CitySchema { city } => state.api.city_schema(city).await,
        DataGraphResource::Usage => state.api.usage().await,
    };
    let body = outcome.map_err(|err| err.into_app_error(&format!("Read {uri}")))?;

    Ok(ReadResourceResult {
        contents: vec![ReadResourceContent::from(TextResourceContents {
            meta: None,
            mime_type: Some("application/json".to_string()),
            text: pretty_json(&body)?,
            uri: uri.to_string(),
        })],
        meta: None,
    })
}

pub async fn handle_resources_read(
    state: &AppState,
    id: Option<Value>,
    params: Option<Value>,
) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, -32602, "Invalid params");
    };

    let resource_read: ReadResourceRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, -32602, "Invalid params"),
    };

    match read_resource(state, &resource_read.uri).await {
        Ok(result) => json_rpc_result(
            id,
            serde_json::to_value(result).expect("read resource result serialization"),
        ),
        Err(err) => {
            warn!(uri = %resource_read.uri, code = err.code(), error = %err, "resource read failed");
            let context = format!("Failed to read resource {}", resource_read.uri);
            app_error_to_json_rpc_with_context(
                id,
                err,
                &context,
                json!({ "uri": resource_read.uri }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::test_support::{test_state, StubApi};

    #[test]
    fn resources_are_listed_in_fixed_order() {
        let uris = build_resources_list()
            .into_iter()
            .map(|resource| resource.uri)
            .collect::<Vec<_>>();
        assert_eq!(uris, RESOURCE_URIS.to_vec());
    }

    #[test]
    fn schema_uri_yields_city_from_last_segment() {
        assert_eq!(
            DataGraphResource::resolve(NYC_SCHEMA_RESOURCE_URI).expect("registered"),
            DataGraphResource::CitySchema {
                city: "nyc".to_string()
            }
        );
    }

    #[test]
    fn unregistered_uri_is_rejected_even_if_well_formed() {
        let error = DataGraphResource::resolve("datagraph://schema/chicago").expect_err("unknown");
        assert!(matches!(error, AppError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn reads_schema_from_api() {
        let api = Arc::new(StubApi::ok(json!({"labels": ["Building", "Violation"]})));
        let state = test_state(api.clone());

        let result = read_resource(&state, NYC_SCHEMA_RESOURCE_URI)
            .await
            .expect("read");
        let value = serde_json::to_value(result).expect("serialize");

        assert_eq!(value["contents"][0]["uri"], NYC_SCHEMA_RESOURCE_URI);
        assert_eq!(value["contents"][0]["mimeType"], "application/json");
        let text = value["contents"][0]["text"].as_str().expect("text");
        assert_eq!(
            serde_json::from_str::<Value>(text).expect("json"),
            json!({"labels": ["Building", "Violation"]})
        );
        assert_eq!(api.calls(), vec!["GET /api/nyc/schema"]);
    }

    #[tokio::test]
    async fn remote_failure_is_raised_as_json_rpc_error() {
        let api = Arc::new(StubApi::rejected(503, Some("maintenance window")));
        let state = test_state(api);

        let response = handle_resources_read(
            &state,
            Some(json!(9)),
            Some(json!({"uri": USAGE_RESOURCE_URI})),
        )
        .await;

        assert!(response.get("result").is_none());
        assert_eq!(response["error"]["code"], -32603);
        assert_eq!(
            response["error"]["message"],
            "Failed to read resource datagraph://usage: maintenance window"
        );
        assert_eq!(response["error"]["data"]["code"], "remote_rejected");
    }

    #[tokio::test]
    async fn unknown_resource_never_reaches_the_network() {
        let api = Arc::new(StubApi::ok(json!({})));
        let state = test_state(api.clone());

        let response = handle_resources_read(
            &state,
            Some(json!(1)),
            Some(json!({"uri": "datagraph://secrets"})),
        )
        .await;

        assert_eq!(response["error"]["code"], -32002);
        assert_eq!(response["error"]["data"]["code"], "resource_not_found");
        assert_eq!(response["error"]["data"]["details"]["uri"], "datagraph://secrets");
        assert_eq!(api.call_count(), 0);
    }
}
