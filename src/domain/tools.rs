//! Interactive tools exposed via Model Context Protocol
//!
//! Each tool checks its required arguments locally and then forwards to exactly one
//! DataGraph API endpoint. `get_server_info` is answered from local package metadata.
//! Failures never escape as JSON-RPC errors: they come back as `isError` results with an
//! `"Error: ..."` text so the host can show them as-is.

use chrono::SecondsFormat;
use rust_mcp_sdk::schema::{
    CallToolRequestParams, CallToolResult, ContentBlock, TextContent, Tool,
};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::api::QueryRequest;
use crate::domain::{
    prompts::DataGraphPrompt,
    resources::RESOURCE_URIS,
    utils::{
        ensure_present, normalize_category, normalize_city, optional_limit, optional_object,
        optional_string, pretty_json, required_string, MAX_QUERY_LIMIT, QUERY_CATEGORIES,
    },
};
use crate::mcp::{
    rpc::{json_rpc_error, json_rpc_result},
    server::SUPPORTED_PROTOCOL_VERSIONS,
};
use crate::{errors::AppError, AppState};

const CITY_DESCRIPTION: &str =
    "City code identifying the dataset partition, e.g. \"nyc\". Read the datagraph://cities resource to discover codes.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataGraphTool {
    GetCitySchema,
    QueryCityData,
    ListDatasets,
    GetUsageStats,
    GetServerInfo,
}

impl DataGraphTool {
    pub const ALL: [Self; 5] = [
        Self::GetCitySchema,
        Self::QueryCityData,
        Self::ListDatasets,
        Self::GetUsageStats,
        Self::GetServerInfo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::GetCitySchema => "get_city_schema",
            Self::QueryCityData => "query_city_data",
            Self::ListDatasets => "list_datasets",
            Self::GetUsageStats => "get_usage_stats",
            Self::GetServerInfo => "get_server_info",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn required_arguments(self) -> &'static [&'static str] {
        match self {
            Self::GetCitySchema => &["city"],
            Self::QueryCityData => &["city", "query"],
            Self::ListDatasets | Self::GetUsageStats | Self::GetServerInfo => &[],
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::GetCitySchema => {
                "Get the graph schema (node labels, relationship types and properties) for a city's civic data"
            }
            Self::QueryCityData => {
                "Query a city's civic data graph with a natural-language question, or with a read-only Cypher query"
            }
            Self::ListDatasets => "List the datasets loaded into the graph, optionally for one city",
            Self::GetUsageStats => "Get API usage statistics and remaining quota for the configured key",
            Self::GetServerInfo => "Get version and configuration details of this MCP server",
        }
    }

    fn properties(self) -> Value {
        match self {
            Self::GetCitySchema => json!({
                "city": { "type": "string", "description": CITY_DESCRIPTION }
            }),
            Self::QueryCityData => json!({
                "city": { "type": "string", "description": CITY_DESCRIPTION },
                "query": {
                    "type": "string",
                    "description": "Natural-language question about the city's data"
                },
                "category": {
                    "type": "string",
                    "enum": QUERY_CATEGORIES,
                    "description": "Restrict the search to one data category"
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_QUERY_LIMIT,
                    "description": "Maximum number of rows to return"
                },
                "cypher_query": {
                    "type": "string",
                    "description": "Read-only Cypher query to run instead of translating `query`. The API rejects write clauses and enforces a LIMIT."
                },
                "cypher_params": {
                    "type": "object",
                    "description": "Parameters referenced by cypher_query",
                    "additionalProperties": true
                }
            }),
            Self::ListDatasets => json!({
                "city": {
                    "type": "string",
                    "description": "Only list datasets for this city code"
                }
            }),
            Self::GetUsageStats | Self::GetServerInfo => json!({}),
        }
    }

    pub fn descriptor(self) -> Tool {
        let descriptor = json!({
            "name": self.name(),
            "description": self.description(),
            "inputSchema": {
                "type": "object",
                "properties": self.properties(),
                "required": self.required_arguments(),
            }
        });
        serde_json::from_value(descriptor).expect("static tool descriptor matches MCP schema")
    }
}

pub fn build_tools_list() -> Vec<Tool> {
    DataGraphTool::ALL
        .into_iter()
        .map(DataGraphTool::descriptor)
        .collect()
}

/// A tool call whose arguments have passed local validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    GetCitySchema { city: String },
    QueryCityData { city: String, request: QueryRequest },
    ListDatasets { city: Option<String> },
    GetUsageStats,
    GetServerInfo,
}

impl ToolInvocation {
    pub fn parse(name: &str, args: &Map<String, Value>) -> Result<Self, AppError> {
        let tool =
            DataGraphTool::from_name(name).ok_or_else(|| AppError::UnknownTool(name.to_string()))?;
        ensure_present(args, tool.required_arguments())?;

        let invocation = match tool {
            DataGraphTool::GetCitySchema => Self::GetCitySchema {
                city: normalize_city("city", required_string(args, "city")?)?,
            },
            DataGraphTool::QueryCityData => Self::QueryCityData {
                city: normalize_city("city", required_string(args, "city")?)?,
                request: QueryRequest {
                    query: required_string(args, "query")?,
                    category: normalize_category(optional_string(args, "category")?)?,
                    limit: optional_limit(args)?,
                    cypher_query: optional_string(args, "cypher_query")?,
                    cypher_params: optional_object(args, "cypher_params")?,
                },
            },
            DataGraphTool::ListDatasets => Self::ListDatasets {
                city: optional_string(args, "city")?
                    .map(|city| normalize_city("city", city))
                    .transpose()?,
            },
            DataGraphTool::GetUsageStats => Self::GetUsageStats,
            DataGraphTool::GetServerInfo => Self::GetServerInfo,
        };

        Ok(invocation)
    }

    pub fn tool(&self) -> DataGraphTool {
        match self {
            Self::GetCitySchema { .. } => DataGraphTool::GetCitySchema,
            Self::QueryCityData { .. } => DataGraphTool::QueryCityData,
            Self::ListDatasets { .. } => DataGraphTool::ListDatasets,
            Self::GetUsageStats => DataGraphTool::GetUsageStats,
            Self::GetServerInfo => DataGraphTool::GetServerInfo,
        }
    }
}

pub async fn execute(state: &AppState, invocation: ToolInvocation) -> Result<Value, AppError> {
    let operation = invocation.tool().name();
    let outcome = match &invocation {
        ToolInvocation::GetCitySchema { city } => state.api.city_schema(city).await,
        ToolInvocation::QueryCityData { city, request } => {
            state.api.query_city(city, request).await
        }
        ToolInvocation::ListDatasets { city } => state.api.list_datasets(city.as_deref()).await,
        ToolInvocation::GetUsageStats => state.api.usage().await,
        ToolInvocation::GetServerInfo => return Ok(server_info(state)),
    };

    outcome.map_err(|err| err.into_app_error(operation))
}

/// Runs a tool by name. Every failure is folded into an `isError` result.
pub async fn call_tool(state: &AppState, name: &str, args: &Map<String, Value>) -> CallToolResult {
    let outcome = match ToolInvocation::parse(name, args) {
        Ok(invocation) => execute(state, invocation)
            .await
            .and_then(|value| pretty_json(&value)),
        Err(err) => Err(err),
    };

    match outcome {
        Ok(text) => text_result(text, false),
        Err(err) => {
            warn!(tool = %name, code = err.code(), error = %err, "tool call failed");
            text_result(err.to_user_message(), true)
        }
    }
}

fn text_result(text: String, is_error: bool) -> CallToolResult {
    CallToolResult {
        content: vec![ContentBlock::from(TextContent::new(text, None, None))],
        is_error: is_error.then_some(true),
        meta: None,
        structured_content: None,
    }
}

fn server_info(state: &AppState) -> Value {
    json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "api_base_url": state.api_base_url.as_ref(),
        "auth_scheme": state.auth_scheme.as_str(),
        "protocol_versions": SUPPORTED_PROTOCOL_VERSIONS,
        "started_at_utc": state.started_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        "tools": DataGraphTool::ALL.map(DataGraphTool::name),
        "prompts": DataGraphPrompt::ALL.map(DataGraphPrompt::name),
        "resources": RESOURCE_URIS,
    })
}

pub async fn handle_tools_call(
    state: &AppState,
    id: Option<Value>,
    params: Option<Value>,
) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, -32602, "Invalid params");
    };

    let tool_call: CallToolRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, -32602, "Invalid params"),
    };

    let arguments = tool_call.arguments.unwrap_or_default();
    let result = call_tool(state, &tool_call.name, &arguments).await;

    json_rpc_result(
        id,
        serde_json::to_value(result).expect("tool result serialization"),
    )
}
