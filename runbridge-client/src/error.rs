//! Errors returned by [`PlatformClient`](crate::PlatformClient)

use serde::Deserialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Error code the platform uses for unknown runs
const RESOURCE_DOES_NOT_EXIST: &str = "RESOURCE_DOES_NOT_EXIST";

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (connect, TLS, timeout)
    #[error("request to platform failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx answer from the platform
    #[error(
        "platform returned HTTP {status} ({}): {message}",
        .error_code.as_deref().unwrap_or("no error code")
    )]
    Api {
        status: u16,
        error_code: Option<String>,
        message: String,
    },

    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The platform answered `runs/get` with an empty document
    #[error("run {0} not found")]
    RunNotFound(String),

    /// Rejected locally, nothing was sent
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Error document workspaces send with 4xx/5xx answers
#[derive(Deserialize)]
struct ErrorBody {
    error_code: Option<String>,
    message: Option<String>,
}

impl ClientError {
    /// Builds an [`ClientError::Api`] from a failed response body
    ///
    /// Workspaces answer with `{"error_code": .., "message": ..}`; gateways and
    /// local mocks answer with plain text, which is kept verbatim.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) if parsed.error_code.is_some() || parsed.message.is_some() => {
                Self::Api {
                    status,
                    error_code: parsed.error_code,
                    message: parsed.message.unwrap_or_default(),
                }
            }
            _ => Self::Api {
                status,
                error_code: None,
                message: body.trim().to_string(),
            },
        }
    }

    /// Whether the run the request referred to does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::RunNotFound(_) => true,
            Self::Api {
                status, error_code, ..
            } => *status == 404 || error_code.as_deref() == Some(RESOURCE_DOES_NOT_EXIST),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_platform_error_document() {
        let err = ClientError::from_response(
            400,
            r#"{"error_code": "RESOURCE_DOES_NOT_EXIST", "message": "Run 7 does not exist."}"#,
        );

        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "platform returned HTTP 400 (RESOURCE_DOES_NOT_EXIST): Run 7 does not exist."
        );
    }

    #[test]
    fn test_keeps_plain_text_body() {
        let err = ClientError::from_response(404, "Not Found\n");
        assert!(err.is_not_found());
        assert!(matches!(
            &err,
            ClientError::Api { error_code: None, message, .. } if message == "Not Found"
        ));

        let err = ClientError::from_response(503, "upstream unavailable");
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "platform returned HTTP 503 (no error code): upstream unavailable"
        );
    }

    #[test]
    fn test_local_errors_are_not_not_found() {
        assert!(ClientError::RunNotFound("7".to_string()).is_not_found());
        assert!(!ClientError::InvalidRequest("bad".to_string()).is_not_found());
    }
}
