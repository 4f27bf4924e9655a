//! Error types for the Vercel provider.

use crate::schema::Diagnostic;
use thiserror::Error;

/// Errors that can occur while managing Vercel resources.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A provider configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is not registered.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// The requested data source type is not registered.
    #[error("Unknown data source type: {0}")]
    UnknownDataSource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The resource already exists (create conflict).
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// The API rejected the credentials or the token lacks access.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The API rate limit was exceeded.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The operation conflicts with the resource's current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The Vercel API returned an unexpected error response.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code reported by the API.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// The operation is not supported by this resource.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl ProviderError {
    /// Get the error message as a string.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) => msg,
            Self::Validation(msg) => msg,
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::UnknownDataSource(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
            Self::AlreadyExists(msg) => msg,
            Self::Unauthorized(msg) => msg,
            Self::RateLimited(msg) => msg,
            Self::Conflict(msg) => msg,
            Self::Api { message, .. } => message,
            Self::Unsupported(msg) => msg,
        }
    }

    /// Whether this error is a not-found response.
    ///
    /// Read-after-write call sites treat not-found shortly after a create as
    /// transient; the retry helper itself never makes that call.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this error class is worth retrying at all.
    ///
    /// Covers rate limiting and 5xx API responses. Not-found is deliberately
    /// excluded: only a call site that just wrote the resource can know it is
    /// transient, via [`is_not_found`](Self::is_not_found).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Convert this error into a user-facing diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DiagnosticSeverity;

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("prj_123".to_string());
        assert_eq!(format!("{}", err), "Resource not found: prj_123");

        let err = ProviderError::Validation("invalid input".to_string());
        assert_eq!(format!("{}", err), "Validation error: invalid input");

        let err = ProviderError::UnknownResource("vercel_custom".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: vercel_custom");

        let err = ProviderError::Api {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(format!("{}", err), "API error (status 502): bad gateway");
    }

    #[test]
    fn test_message_method() {
        let err = ProviderError::NotFound("prj_123".to_string());
        assert_eq!(err.message(), "prj_123");

        let err = ProviderError::Configuration("missing token".to_string());
        assert_eq!(err.message(), "missing token");

        let err = ProviderError::Api {
            status: 500,
            message: "internal".to_string(),
        };
        assert_eq!(err.message(), "internal");
    }

    #[test]
    fn test_is_not_found() {
        assert!(ProviderError::NotFound("x".to_string()).is_not_found());
        assert!(!ProviderError::Conflict("x".to_string()).is_not_found());
    }

    #[test]
    fn test_is_transient() {
        assert!(ProviderError::RateLimited("slow down".to_string()).is_transient());
        assert!(ProviderError::Api {
            status: 503,
            message: "unavailable".to_string()
        }
        .is_transient());

        assert!(!ProviderError::Api {
            status: 400,
            message: "bad request".to_string()
        }
        .is_transient());
        assert!(!ProviderError::NotFound("x".to_string()).is_transient());
        assert!(!ProviderError::Unauthorized("bad token".to_string()).is_transient());
    }

    #[test]
    fn test_to_diagnostic() {
        let diag = ProviderError::Conflict("domain in use".to_string()).to_diagnostic();
        assert_eq!(diag.severity, DiagnosticSeverity::Error);
        assert!(diag.summary.contains("domain in use"));
    }

    #[test]
    fn test_from_serde_error() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ProviderError = serde_err.into();
        assert!(matches!(err, ProviderError::Serialization(_)));
    }
}
