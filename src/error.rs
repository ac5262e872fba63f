use crate::tool::Tool;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type Result<T, E = MetadataError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("{tool} is not available: {reason}")]
    ToolUnavailable { tool: Tool, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File not found: {path}. command={command}")]
    FileNotFound { path: PathBuf, command: String },

    #[error("{tool} failed ({status}): {stderr}. command={command}")]
    ExternalToolFailure {
        tool: Tool,
        status: String,
        stderr: String,
        command: String,
    },

    #[error("{tool} did not finish within {timeout:?}. command={command}")]
    Timeout {
        tool: Tool,
        command: String,
        timeout: Duration,
    },
}
