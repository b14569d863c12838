//! Error handling module
//!
//! Errors fall into three tiers:
//!
//! - configuration problems (`Config`, `Settings`) are raised before any request is sent;
//! - transport failures on reads never reach the caller, they degrade to an
//!   error-status reading in `ValueClient::get_value`;
//! - write failures and undecodable responses propagate with whatever
//!   diagnostics the controller reported.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Convenience alias for results using the client error type.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("{what} {value} out of range ({min} to {max})")]
    OutOfRange {
        what: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Controller API error: {0}")]
    Api(#[from] ApiError),

    #[error("Malformed response for {query}: {source}")]
    Decode {
        query: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Response for {query} has no value entry")]
    MissingValue { query: String },

    #[error("Unexpected value for {query}: {value}")]
    UnexpectedValue { query: String, value: String },

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Failure to complete an HTTP exchange with the controller.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Controller returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Connection failed: {0}")]
    Connection(String),
}

// Request URLs carry the API key in their query
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Request(err.without_url())
    }
}

impl TransportError {
    /// Response body of a non-2xx reply, if there was one.
    pub fn body(&self) -> Option<&str> {
        match self {
            TransportError::Status { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }
}

/// Error code as reported by the controller (numeric on most firmware).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Number(i64),
    Text(String),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Number(code) => write!(f, "{}", code),
            ErrorCode::Text(code) => f.write_str(code),
        }
    }
}

/// One entry of the controller's error detail list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiErrorDetail {
    pub code: ErrorCode,
    #[serde(rename = "name")]
    pub reason: String,
}

/// Error object returned by the controller in place of `data`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error(
    "{name}: {description}, due to the following errors: {}",
    join_details(.details)
)]
pub struct ApiError {
    pub name: String,
    pub description: String,
    pub details: Vec<ApiErrorDetail>,
    pub query: Option<String>,
    pub query_data: Option<serde_json::Value>,
    pub data: Option<serde_json::Value>,
}

fn join_details(details: &[ApiErrorDetail]) -> String {
    details
        .iter()
        .map(|d| format!("Code: {}, Reason: {}", d.code, d.reason))
        .collect::<Vec<_>>()
        .join("; ")
}
