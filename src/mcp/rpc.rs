//! JSON-RPC protocol representations and formatting utilities
//!
//! Maps internal `AppError`s onto JSON-RPC error payloads for the protocol-level failures
//! that are not folded into tool or prompt results.

use rust_mcp_sdk::schema::{
    JsonrpcErrorResponse, JsonrpcResultResponse, RequestId, Result as McpResult, RpcError,
};
use serde_json::{json, Value};

use crate::errors::AppError;

pub fn is_failure_response(value: &Value) -> bool {
    value.get("error").is_some()
        || value
            .pointer("/result/isError")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        || value
            .pointer("/result/_meta/isError")
            .and_then(Value::as_bool)
            .unwrap_or(false)
}

pub fn app_error_to_json_rpc(id: Option<Value>, err: AppError) -> Value {
    let message = match json_rpc_code(&err) {
        -32602 => "Invalid params",
        -32002 => "Resource not found",
        _ => "Internal error",
    };
    error_response(id, err, message.to_string(), json!({}))
}

/// Like `app_error_to_json_rpc`, but the message reads `<context>: <error>`.
pub fn app_error_to_json_rpc_with_context(
    id: Option<Value>,
    err: AppError,
    context: &str,
    details: Value,
) -> Value {
    let message = match &err {
        AppError::Internal(_) => format!("{context}: internal error"),
        other => format!("{context}: {other}"),
    };
    error_response(id, err, message, details)
}

fn json_rpc_code(err: &AppError) -> i32 {
    match err {
        AppError::BadRequest { .. } => -32602,
        AppError::UnknownResource(_) => -32002,
        _ => -32603,
    }
}

fn error_response(id: Option<Value>, err: AppError, message: String, details: Value) -> Value {
    let code = json_rpc_code(&err);
    if matches!(err, AppError::Internal(_)) {
        return json_rpc_error(id, code, &message);
    }

    json_rpc_error_with_data(
        id,
        code,
        &message,
        Some(json!({
            "code": err.code(),
            "message": err.to_string(),
            "details": details
        })),
    )
}

pub fn json_rpc_error(id: Option<Value>, code: i32, message: &str) -> Value {
    json_rpc_error_with_data(id, code, message, None)
}

pub fn json_rpc_error_with_data(
    id: Option<Value>,
    code: i32,
    message: &str,
    data: Option<Value>,
) -> Value {
    let response = JsonrpcErrorResponse::new(
        RpcError {
            code: i64::from(code),
            data,
            message: message.to_string(),
        },
        id.as_ref().and_then(value_to_request_id),
    );
    serde_json::to_value(response).expect("jsonrpc error response serialization")
}

pub fn json_rpc_result(id: Option<Value>, result: Value) -> Value {
    if let Some(request_id) = id.as_ref().and_then(value_to_request_id) {
        let extra = result.as_object().cloned();
        let response = JsonrpcResultResponse::new(request_id, McpResult { meta: None, extra });
        return serde_json::to_value(response).expect("jsonrpc result response serialization");
    }

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub fn value_to_request_id(value: &Value) -> Option<RequestId> {
    if let Some(string_id) = value.as_str() {
        return Some(RequestId::String(string_id.to_string()));
    }

    value.as_i64().map(RequestId::Integer)
}

pub fn request_id_to_value(id: RequestId) -> Value {
    match id {
        RequestId::String(value) => Value::String(value),
        RequestId::Integer(value) => Value::Number(value.into()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn result_keeps_string_ids() {
        let response = json_rpc_result(Some(json!("req-7")), json!({"tools": []}));
        assert_eq!(response["id"], "req-7");
        assert_eq!(response["jsonrpc"], "2.0");
        assert_eq!(response["result"]["tools"], json!([]));
    }

    #[test]
    fn bad_request_maps_to_invalid_params() {
        let response = app_error_to_json_rpc(
            Some(json!(3)),
            AppError::bad_request("invalid_protocol_version", "protocolVersion is required"),
        );
        assert_eq!(response["error"]["code"], -32602);
        assert_eq!(response["error"]["data"]["code"], "invalid_protocol_version");
    }

    #[test]
    fn internal_error_hides_details() {
        let response =
            app_error_to_json_rpc(Some(json!(3)), AppError::internal("stack trace here"));
        assert_eq!(response["error"]["code"], -32603);
        assert!(response["error"].get("data").is_none());
    }

    #[test]
    fn contextual_error_names_the_subject() {
        let response = app_error_to_json_rpc_with_context(
            Some(json!(4)),
            AppError::UnknownResource("datagraph://secrets".to_string()),
            "Failed to read resource datagraph://secrets",
            json!({"uri": "datagraph://secrets"}),
        );
        assert_eq!(response["error"]["code"], -32002);
        assert_eq!(
            response["error"]["message"],
            "Failed to read resource datagraph://secrets: Unknown resource: datagraph://secrets"
        );
        assert_eq!(response["error"]["data"]["details"]["uri"], "datagraph://secrets");
    }

    #[test]
    fn contextual_internal_error_hides_details() {
        let response = app_error_to_json_rpc_with_context(
            Some(json!(5)),
            AppError::internal("client builder exploded"),
            "Failed to read resource datagraph://usage",
            json!({"uri": "datagraph://usage"}),
        );
        assert_eq!(response["error"]["code"], -32603);
        assert_eq!(
            response["error"]["message"],
            "Failed to read resource datagraph://usage: internal error"
        );
        assert!(response["error"].get("data").is_none());
    }

    #[test]
    fn error_flagged_results_count_as_failures() {
        assert!(is_failure_response(
            &json!({"jsonrpc": "2.0", "id": 1, "result": {"content": [], "isError": true}})
        ));
        assert!(!is_failure_response(
            &json!({"jsonrpc": "2.0", "id": 1, "result": {"content": []}})
        ));
    }
}
