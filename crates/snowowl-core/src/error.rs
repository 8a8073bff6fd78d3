//! Error taxonomy of the repository layer.

use thiserror::Error;

/// Errors surfaced to callers of repository operations.
///
/// Every variant maps to an HTTP-like status code through
/// [`SnowowlError::status`] so that request layers can translate it.
#[derive(Error, Debug)]
pub enum SnowowlError {
    /// The operation conflicts with the current state, e.g. a refused deletion.
    #[error("{0}")]
    Conflict(String),

    /// A uniqueness constraint was violated.
    #[error("{doc_type} with identifier '{id}' already exists")]
    AlreadyExists {
        /// Document type of the offending id.
        doc_type: String,
        /// First offending id.
        id: String,
    },

    /// Required components do not exist.
    #[error("{doc_type} with identifier(s) {} not found", .ids.join(", "))]
    ComponentNotFound {
        /// Document type of the missing ids.
        doc_type: String,
        /// Missing ids.
        ids: Vec<String>,
    },

    /// The request is invalid; `ids` names the offending components if any.
    #[error("{message}")]
    BadRequest {
        /// Human readable reason.
        message: String,
        /// Offending component ids.
        ids: Vec<String>,
    },

    /// The commit would introduce a cycle into the revision graph.
    #[error("cycle detected: {0}")]
    CycleDetected(String),

    /// A bounded wait elapsed.
    #[error("{0}")]
    RequestTimeout(String),

    /// The operation is not supported for the given input.
    #[error("{0}")]
    UnsupportedOperation(String),

    /// The object is not in a state that allows the operation.
    #[error("{0}")]
    IllegalState(String),

    /// Any other failure, with the underlying message preserved.
    #[error("{0}")]
    Internal(String),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SnowowlError {
    /// Creates a bad request error without component ids.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            ids: Vec::new(),
        }
    }

    /// HTTP-like status code of this error.
    pub fn status(&self) -> u16 {
        match self {
            Self::Conflict(_) | Self::AlreadyExists { .. } => 409,
            Self::ComponentNotFound { .. } => 404,
            Self::BadRequest { .. } | Self::CycleDetected(_) | Self::UnsupportedOperation(_) => 400,
            Self::RequestTimeout(_) => 408,
            Self::IllegalState(_) | Self::Internal(_) | Self::Io(_) => 500,
        }
    }
}

/// Result type alias for repository operations.
pub type Result<T> = std::result::Result<T, SnowowlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SnowowlError::AlreadyExists {
            doc_type: "Concept".to_string(),
            id: "100005".to_string(),
        };
        assert_eq!(err.to_string(), "Concept with identifier '100005' already exists");
        assert_eq!(err.status(), 409);

        let err = SnowowlError::ComponentNotFound {
            doc_type: "concept".to_string(),
            ids: vec!["100005".to_string(), "73211009".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "concept with identifier(s) 100005, 73211009 not found"
        );
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn test_io_errors_convert() {
        let err: SnowowlError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, SnowowlError::Io(_)));
        assert_eq!(err.status(), 500);
    }
}
