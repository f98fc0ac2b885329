//! Client error types
//!
//! Failures are scoped to the action that triggered them. Nothing here is
//! fatal to the process.

use thiserror::Error;

use crate::polls::PollError;
use crate::session::{ApiResponse, TransportError};
use crate::store::StoreError;

/// Errors surfaced by API operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// The API answered 401; the session has already been torn down
    #[error("Session expired. Please login again.")]
    Unauthorized,

    /// Owner-only action attempted without a stored token
    #[error("You are not logged in")]
    NotLoggedIn,

    /// Non-2xx response, with the server's `message` when it sent one
    #[error("{}", rejected_text(*status, message.as_deref()))]
    Rejected { status: u16, message: Option<String> },

    /// Network or transport failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Response body did not match the expected shape
    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Local input failed validation before any request was made
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error("Local state error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn rejected_text(status: u16, message: Option<&str>) -> String {
    match message {
        Some(m) => format!("Request rejected ({}): {}", status, m),
        None => format!("Request rejected ({})", status),
    }
}

impl ClientError {
    /// Classify a non-success response
    pub fn from_response(response: &ApiResponse) -> Self {
        if response.is_unauthorized() {
            ClientError::Unauthorized
        } else {
            ClientError::Rejected {
                status: response.status,
                message: response.message(),
            }
        }
    }

    /// The server-supplied message, if this is a rejection that carried one
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Pass 2xx responses through, classify everything else
pub(crate) fn expect_success(response: ApiResponse) -> ClientResult<ApiResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ClientError::from_response(&response))
    }
}
