//! # Provider Errors
//!
//! Every provider operation fails with a [`ProviderError`]. Queries and mutations never let it
//! escape: they capture its `Display` rendering into their state, so the message shown to the
//! user is whatever this module renders.

use std::collections::BTreeMap;

/// Errors that can occur while talking to a data provider.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ProviderError {
    /// Non-2xx response. `message` is the server-supplied detail when there was one.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        field_errors: BTreeMap<String, Vec<String>>,
    },

    /// The request never produced a response (connection refused, timeout, ...).
    #[error("Network error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("{0} not found")]
    NotFound(String),

    /// A precondition of the in-memory store was not met.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Failure injected by the in-memory adapter's `error` mode.
    #[error("{0}")]
    Simulated(String),

    #[error("Store closed")]
    StoreClosed,

    #[error("Store dropped response channel")]
    StoreDropped,
}

impl ProviderError {
    /// HTTP status, for `Http` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Per-field validation messages (FastAPI 422 responses).
    pub fn field_errors(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match self {
            ProviderError::Http { field_errors, .. } if !field_errors.is_empty() => Some(field_errors),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_)) || self.status() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_displays_server_message() {
        let err = ProviderError::Http {
            status: 409,
            message: "La obra ya existe".to_string(),
            field_errors: BTreeMap::new(),
        };
        assert_eq!(err.to_string(), "La obra ya existe");
        assert_eq!(err.status(), Some(409));
        assert!(err.field_errors().is_none());
    }

    #[test]
    fn test_not_found_detection() {
        assert!(ProviderError::NotFound("obras/x".into()).is_not_found());
        let http_404 = ProviderError::Http {
            status: 404,
            message: "Not Found".into(),
            field_errors: BTreeMap::new(),
        };
        assert!(http_404.is_not_found());
        assert!(!ProviderError::StoreClosed.is_not_found());
    }
}
