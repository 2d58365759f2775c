//! Error types for the inventory API client.
//!
//! # Design
//! Status codes are classified once, in `ApiError::from_status`: 404 is
//! `NotFound`, any other 4xx is `Validation`, everything else non-2xx is
//! `Server`. Status variants keep the raw body so the user-facing message can
//! be pulled from the server's `detail` field later.

use serde_json::Value;
use thiserror::Error;

/// Errors returned by `InventoryClient` parse methods and by transports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The server returned 404 for the referenced item.
    #[error("item not found")]
    NotFound { body: String },

    /// The server rejected the request with a 4xx other than 404.
    #[error("request rejected with HTTP {status}")]
    Validation { status: u16, body: String },

    /// The server returned 5xx or an unexpected non-2xx status.
    #[error("server error: HTTP {status}")]
    Server { status: u16, body: String },

    /// A 2xx body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Decode(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Encode(String),
}

impl ApiError {
    /// Classify a non-2xx response.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            404 => ApiError::NotFound { body },
            400..=499 => ApiError::Validation { status, body },
            _ => ApiError::Server { status, body },
        }
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound { .. } => Some(404),
            ApiError::Validation { status, .. } | ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The structured `detail` field of an error body.
    ///
    /// A string detail is returned as-is. A list of validation entries is
    /// flattened by joining each entry's `msg` with `"; "`.
    pub fn detail(&self) -> Option<String> {
        let body = match self {
            ApiError::NotFound { body }
            | ApiError::Validation { body, .. }
            | ApiError::Server { body, .. } => body,
            _ => return None,
        };
        let value: Value = serde_json::from_str(body).ok()?;
        match value.get("detail")? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Array(entries) => {
                let msgs: Vec<&str> = entries
                    .iter()
                    .filter_map(|e| e.get("msg").and_then(Value::as_str))
                    .collect();
                (!msgs.is_empty()).then(|| msgs.join("; "))
            }
            _ => None,
        }
    }

    /// The failure's own message, independent of any response body.
    ///
    /// Only failures that happened on our side of the wire carry one; a bare
    /// status code is not a message worth showing.
    pub fn own_message(&self) -> Option<String> {
        match self {
            ApiError::Network(msg) | ApiError::Decode(msg) | ApiError::Encode(msg)
                if !msg.trim().is_empty() =>
            {
                Some(self.to_string())
            }
            _ => None,
        }
    }

    /// Message to show the user: server detail, then own message, then
    /// `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail()
            .or_else(|| self.own_message())
            .unwrap_or_else(|| fallback.to_string())
    }
}
