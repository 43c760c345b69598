//! Argument extraction and validation shared by tools and prompts

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::errors::AppError;

pub const MAX_QUERY_LIMIT: u32 = 1_000;
pub const QUERY_CATEGORIES: [&str; 8] = [
    "property",
    "housing",
    "permits",
    "violations",
    "complaints",
    "transportation",
    "public_safety",
    "environment",
];

static CITY_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("city code pattern"));

/// True when the argument is absent, `null`, or a blank string.
pub fn is_missing(args: &Map<String, Value>, name: &str) -> bool {
    match args.get(name) {
        None | Some(Value::Null) => true,
        Some(Value::String(value)) => value.trim().is_empty(),
        Some(_) => false,
    }
}

pub fn ensure_present(args: &Map<String, Value>, required: &[&str]) -> Result<(), AppError> {
    match required.iter().find(|name| is_missing(args, name)) {
        Some(name) => Err(AppError::missing_argument(*name)),
        None => Ok(()),
    }
}

pub fn required_string(args: &Map<String, Value>, name: &str) -> Result<String, AppError> {
    optional_string(args, name)?.ok_or_else(|| AppError::missing_argument(name))
}

/// Reads a string argument, treating `null` and blank values as absent.
pub fn optional_string(args: &Map<String, Value>, name: &str) -> Result<Option<String>, AppError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => {
            let trimmed = value.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Some(_) => Err(AppError::invalid_argument(name, "must be a string")),
    }
}

/// Prompt arguments are strings on the wire, but hosts sometimes send numbers or booleans.
pub fn optional_text(args: &Map<String, Value>, name: &str) -> Option<String> {
    match args.get(name)? {
        Value::Null => None,
        Value::String(value) => {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        other => Some(other.to_string()),
    }
}

pub fn required_text(args: &Map<String, Value>, name: &str) -> Result<String, AppError> {
    optional_text(args, name).ok_or_else(|| AppError::missing_argument(name))
}

/// City codes are interpolated into URL paths, so only a conservative charset is allowed.
pub fn normalize_city(name: &str, value: String) -> Result<String, AppError> {
    if !CITY_CODE.is_match(&value) {
        return Err(AppError::invalid_argument(
            name,
            "must be 1-64 characters of letters, digits, '-' or '_'",
        ));
    }

    Ok(value)
}

pub fn normalize_category(category: Option<String>) -> Result<Option<String>, AppError> {
    let Some(value) = category else {
        return Ok(None);
    };

    let normalized = value.trim().to_ascii_lowercase();
    if !QUERY_CATEGORIES.contains(&normalized.as_str()) {
        return Err(AppError::invalid_argument(
            "category",
            format!("must be one of: {}", QUERY_CATEGORIES.join(", ")),
        ));
    }

    Ok(Some(normalized))
}

pub fn optional_limit(args: &Map<String, Value>) -> Result<Option<u32>, AppError> {
    let limit = match args.get("limit") {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value.as_u64(),
    };

    match limit {
        Some(limit) if (1..=u64::from(MAX_QUERY_LIMIT)).contains(&limit) => Ok(Some(limit as u32)),
        _ => Err(AppError::invalid_argument(
            "limit",
            format!("must be an integer between 1 and {MAX_QUERY_LIMIT}"),
        )),
    }
}

pub fn optional_object(
    args: &Map<String, Value>,
    name: &str,
) -> Result<Option<Map<String, Value>>, AppError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(object)) => Ok(Some(object.clone())),
        Some(_) => Err(AppError::invalid_argument(name, "must be an object")),
    }
}

pub fn pretty_json(value: &Value) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|err| AppError::internal(format!("failed to serialize response: {err}")))
}
