//! Error types for query construction and execution

use serde::Deserialize;

/// Errors raised by builders, accessors and executors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Duplicate aggregation name: {0}")]
    DuplicateName(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Executor failure: {0}")]
    Executor(#[from] ExecutorError),
}

impl Error {
    /// True when the error came back from the executor rather than local validation
    pub fn is_executor_failure(&self) -> bool {
        matches!(self, Self::Executor(_))
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Failures surfaced by a [`SearchExecutor`](crate::executor::SearchExecutor)
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("Connection failed: {0}")]
    Connection(#[from] reqwest::Error),

    #[error("Engine error (status {status}) {error_type}: {reason}")]
    Engine {
        status: u16,
        error_type: String,
        reason: String,
    },

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Elasticsearch-style error envelope
#[derive(Debug, Deserialize)]
struct EsErrorResponse {
    error: EsErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EsErrorBody {
    Detail {
        #[serde(rename = "type")]
        error_type: String,
        reason: String,
    },
    Message(String),
}

impl ExecutorError {
    /// Build an engine error from a status code and raw response body.
    ///
    /// Understands the `{"error": {"type": .., "reason": ..}}` envelope and
    /// falls back to the raw text for anything else.
    pub fn from_engine_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<EsErrorResponse>(body) {
            Ok(EsErrorResponse {
                error: EsErrorBody::Detail { error_type, reason },
            }) => Self::Engine {
                status,
                error_type,
                reason,
            },
            Ok(EsErrorResponse {
                error: EsErrorBody::Message(reason),
            }) => Self::Engine {
                status,
                error_type: "engine_error".to_string(),
                reason,
            },
            Err(_) => Self::Engine {
                status,
                error_type: "engine_error".to_string(),
                reason: body.to_string(),
            },
        }
    }

    pub(crate) fn index_not_found(index: &str) -> Self {
        Self::Engine {
            status: 404,
            error_type: "index_not_found_exception".to_string(),
            reason: format!("no such index [{}]", index),
        }
    }

    /// HTTP status for engine errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Engine { status, .. } => Some(*status),
            Self::Connection(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_body_detail() {
        let body = r#"{"error":{"root_cause":[],"type":"index_not_found_exception","reason":"no such index [x]"},"status":404}"#;
        match ExecutorError::from_engine_body(404, body) {
            ExecutorError::Engine {
                status,
                error_type,
                reason,
            } => {
                assert_eq!(status, 404);
                assert_eq!(error_type, "index_not_found_exception");
                assert_eq!(reason, "no such index [x]");
            }
            other => panic!("Expected Engine, got {:?}", other),
        }
    }

    #[test]
    fn test_engine_body_plain_message() {
        let err = ExecutorError::from_engine_body(400, r#"{"error":"bad things"}"#);
        assert!(matches!(err, ExecutorError::Engine { ref reason, .. } if reason == "bad things"));
    }

    #[test]
    fn test_engine_body_not_json() {
        let err = ExecutorError::from_engine_body(502, "Bad Gateway");
        assert_eq!(err.status(), Some(502));
        assert!(err.to_string().contains("Bad Gateway"));
    }

    #[test]
    fn test_executor_failure_classification() {
        let local = Error::invalid("limit must be >= 0");
        assert!(!local.is_executor_failure());

        let remote: Error = ExecutorError::index_not_found("bank").into();
        assert!(remote.is_executor_failure());
        assert!(remote.to_string().contains("no such index [bank]"));
    }
}
