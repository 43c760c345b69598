use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing required argument: {name}")]
    MissingArgument { name: String },
    #[error("Invalid argument '{name}': {message}")]
    InvalidArgument { name: String, message: String },
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Unknown prompt: {0}")]
    UnknownPrompt(String),
    #[error("Unknown resource: {0}")]
    UnknownResource(String),
    #[error("{message}")]
    RemoteRejected { status: u16, message: String },
    #[error("{0}")]
    Transport(String),
    #[error("bad request: {message}")]
    BadRequest {
        code: &'static str,
        message: &'static str,
    },
    #[error("internal error")]
    Internal(String),
}

impl AppError {
    pub fn missing_argument(name: impl Into<String>) -> Self {
        Self::MissingArgument { name: name.into() }
    }

    pub fn invalid_argument(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(code: &'static str, message: &'static str) -> Self {
        Self::BadRequest { code, message }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingArgument { .. } => "missing_argument",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::UnknownTool(_) => "tool_not_found",
            Self::UnknownPrompt(_) => "prompt_not_found",
            Self::UnknownResource(_) => "resource_not_found",
            Self::RemoteRejected { .. } => "remote_rejected",
            Self::Transport(_) => "transport_error",
            Self::BadRequest { code, .. } => *code,
            Self::Internal(_) => "internal_error",
        }
    }

    /// Text shown to the MCP host when a failure is folded into a result.
    pub fn to_user_message(&self) -> String {
        match self {
            Self::Internal(message) => {
                tracing::error!(error = %message, "request failed with internal error");
                "Error: internal error".to_string()
            }
            other => format!("Error: {other}"),
        }
    }
}
