//! Guided prompt templates
//!
//! Prompts are pure string interpolation: no API call is made. Optional arguments fall back
//! to fixed default phrases so the same arguments always expand to the same text.

use rust_mcp_sdk::schema::{GetPromptResult, Prompt};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::domain::utils::{optional_text, required_text};
use crate::errors::AppError;
use crate::mcp::rpc::{json_rpc_error, json_rpc_result};

pub const DEFAULT_TOPIC: &str = "general overview";
pub const DEFAULT_PROPERTY_CITY: &str = "nyc";
pub const DEFAULT_PROPERTY_FOCUS: &str = "ownership, violations, and permits";

struct PromptArgumentSpec {
    name: &'static str,
    description: &'static str,
    required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataGraphPrompt {
    ExploreCity,
    LookupProperty,
    CompareNeighborhoods,
    WriteCypherQuery,
}

impl DataGraphPrompt {
    pub const ALL: [Self; 4] = [
        Self::ExploreCity,
        Self::LookupProperty,
        Self::CompareNeighborhoods,
        Self::WriteCypherQuery,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ExploreCity => "explore_city",
            Self::LookupProperty => "lookup_property",
            Self::CompareNeighborhoods => "compare_neighborhoods",
            Self::WriteCypherQuery => "write_cypher_query",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|prompt| prompt.name() == name)
    }

    fn description(self) -> &'static str {
        match self {
            Self::ExploreCity => "Explore what civic data is available for a city",
            Self::LookupProperty => {
                "Look up everything known about a property address via its borough-block-lot key"
            }
            Self::CompareNeighborhoods => "Compare neighborhoods of a city on a chosen metric",
            Self::WriteCypherQuery => {
                "Draft a read-only Cypher query for a question and run it against the graph"
            }
        }
    }

    fn arguments(self) -> &'static [PromptArgumentSpec] {
        match self {
            Self::ExploreCity => &[
                PromptArgumentSpec {
                    name: "city",
                    description: "City code, e.g. nyc",
                    required: true,
                },
                PromptArgumentSpec {
                    name: "topic",
                    description: "What to focus on (default: general overview)",
                    required: false,
                },
            ],
            Self::LookupProperty => &[
                PromptArgumentSpec {
                    name: "address",
                    description: "Street address of the property",
                    required: true,
                },
                PromptArgumentSpec {
                    name: "city",
                    description: "City code (default: nyc)",
                    required: false,
                },
                PromptArgumentSpec {
                    name: "focus",
                    description: "Record types of interest (default: ownership, violations, and permits)",
                    required: false,
                },
            ],
            Self::CompareNeighborhoods => &[
                PromptArgumentSpec {
                    name: "city",
                    description: "City code, e.g. nyc",
                    required: true,
                },
                PromptArgumentSpec {
                    name: "neighborhoods",
                    description: "Comma-separated neighborhood names",
                    required: true,
                },
                PromptArgumentSpec {
                    name: "metric",
                    description: "What to compare (default: general overview)",
                    required: false,
                },
            ],
            Self::WriteCypherQuery => &[
                PromptArgumentSpec {
                    name: "city",
                    description: "City code, e.g. nyc",
                    required: true,
                },
                PromptArgumentSpec {
                    name: "question",
                    description: "Question the query should answer",
                    required: true,
                },
            ],
        }
    }

    pub fn required_arguments(self) -> Vec<&'static str> {
        self.arguments()
            .iter()
            .filter(|argument| argument.required)
            .map(|argument| argument.name)
            .collect()
    }

    pub fn descriptor(self) -> Prompt {
        let arguments = self
            .arguments()
            .iter()
            .map(|argument| {
                json!({
                    "name": argument.name,
                    "description": argument.description,
                    "required": argument.required,
                })
            })
            .collect::<Vec<_>>();

        serde_json::from_value(json!({
            "name": self.name(),
            "description": self.description(),
            "arguments": arguments,
        }))
        .expect("static prompt descriptor matches MCP schema")
    }

    /// Interpolates the template. Required arguments are checked before any text is built.
    pub fn render(self, args: &Map<String, Value>) -> Result<String, AppError> {
        for name in self.required_arguments() {
            required_text(args, name)?;
        }

        let text = match self {
            Self::ExploreCity => {
                let city = required_text(args, "city")?;
                let topic = optional_text(args, "topic").unwrap_or_else(|| DEFAULT_TOPIC.into());
                format!(
                    "I want to explore the civic data available for the city \"{city}\", focusing on: {topic}.\n\
                     \n\
                     1. Call get_city_schema with city \"{city}\" to learn which node labels, relationship types and properties exist.\n\
                     2. Call list_datasets with city \"{city}\" to see which source datasets are loaded.\n\
                     3. Use query_city_data with city \"{city}\" to answer questions about {topic}, starting broad and then drilling into anything notable.\n\
                     \n\
                     Summarize what the data covers, point out interesting patterns, and suggest follow-up questions."
                )
            }
            Self::LookupProperty => {
                let address = required_text(args, "address")?;
                let city = optional_text(args, "city")
                    .unwrap_or_else(|| DEFAULT_PROPERTY_CITY.into());
                let focus =
                    optional_text(args, "focus").unwrap_or_else(|| DEFAULT_PROPERTY_FOCUS.into());
                format!(
                    "Look up the property at \"{address}\" in the \"{city}\" civic data graph, focusing on {focus}.\n\
                     \n\
                     Property records are joined on the borough-block-lot (BBL) key: a 10-digit identifier made of a 1-digit borough code, a 5-digit block and a 4-digit lot.\n\
                     1. Call query_city_data with city \"{city}\" to resolve the address to its BBL.\n\
                     2. Use that BBL to query the related records for {focus}.\n\
                     3. If the address matches several lots, list the candidates and ask which one is meant.\n\
                     \n\
                     Report the BBL you used and summarize the findings with dates."
                )
            }
            Self::CompareNeighborhoods => {
                let city = required_text(args, "city")?;
                let neighborhoods = required_text(args, "neighborhoods")?;
                let metric = optional_text(args, "metric").unwrap_or_else(|| DEFAULT_TOPIC.into());
                format!(
                    "Compare these neighborhoods in \"{city}\": {neighborhoods}. Metric: {metric}.\n\
                     \n\
                     1. Call get_city_schema with city \"{city}\" to find how neighborhoods are represented.\n\
                     2. Use query_city_data with city \"{city}\" to collect comparable figures for each neighborhood.\n\
                     3. Normalize counts by population or area where the data allows it.\n\
                     \n\
                     Present the comparison as a table, then explain the most significant differences."
                )
            }
            Self::WriteCypherQuery => {
                let city = required_text(args, "city")?;
                let question = required_text(args, "question")?;
                format!(
                    "Write a Cypher query that answers this question about \"{city}\": {question}\n\
                     \n\
                     1. Call get_city_schema with city \"{city}\" and use only the labels, relationship types and properties it lists.\n\
                     2. Keep the query read-only: MATCH, OPTIONAL MATCH, WITH, WHERE, RETURN, ORDER BY and LIMIT only. The API rejects CREATE, MERGE, SET, DELETE and REMOVE.\n\
                     3. End with a LIMIT of at most 1000 and pass literal values through cypher_params.\n\
                     4. Run it with query_city_data using cypher_query and cypher_params.\n\
                     \n\
                     Show the final query and explain the results."
                )
            }
        };

        Ok(text)
    }
}

pub fn build_prompts_list() -> Vec<Prompt> {
    DataGraphPrompt::ALL
        .into_iter()
        .map(DataGraphPrompt::descriptor)
        .collect()
}

pub fn get_prompt(name: &str, args: &Map<String, Value>) -> Result<GetPromptResult, AppError> {
    let prompt =
        DataGraphPrompt::from_name(name).ok_or_else(|| AppError::UnknownPrompt(name.to_string()))?;
    let text = prompt.render(args)?;
    Ok(prompt_result(prompt.description(), text, false))
}

fn prompt_result(description: &str, text: String, is_error: bool) -> GetPromptResult {
    let mut result = json!({
        "description": description,
        "messages": [{
            "role": "user",
            "content": { "type": "text", "text": text }
        }]
    });
    if is_error {
        result["_meta"] = json!({ "isError": true });
    }

    serde_json::from_value(result).expect("prompt result matches MCP schema")
}

#[derive(Debug, Deserialize)]
struct PromptGetParams {
    name: String,
    #[serde(default)]
    arguments: Option<Map<String, Value>>,
}

/// Prompt failures are folded into an error-flagged message, like tool failures.
pub fn handle_prompts_get(id: Option<Value>, params: Option<Value>) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, -32602, "Invalid params");
    };

    let request: PromptGetParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, -32602, "Invalid params"),
    };

    let arguments = request.arguments.unwrap_or_default();
    let result = get_prompt(&request.name, &arguments).unwrap_or_else(|err| {
        warn!(prompt = %request.name, code = err.code(), error = %err, "prompt expansion failed");
        prompt_result("Error", err.to_user_message(), true)
    });

    json_rpc_result(
        id,
        serde_json::to_value(result).expect("prompt result serialization"),
    )
}
