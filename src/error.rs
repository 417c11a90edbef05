//! Error types for social-recall.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=config, 3=embedding, 4=store, etc.)
//! - Retryability flags for agent self-correction
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use thiserror::Error;

/// Result type alias for social-recall operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Agents match on the string; shell scripts on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Config (exit 2)
    ConfigError,
    ReadOnly,

    // Embedding (exit 3)
    EmbeddingError,
    DimensionMismatch,

    // Remote store (exit 4)
    StoreError,

    // Validation (exit 5)
    InvalidArgument,

    // I/O (exit 6)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::ConfigError => "CONFIG_ERROR",
            Self::ReadOnly => "READ_ONLY",
            Self::EmbeddingError => "EMBEDDING_ERROR",
            Self::DimensionMismatch => "DIMENSION_MISMATCH",
            Self::StoreError => "STORE_ERROR",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-6).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::ConfigError | Self::ReadOnly => 2,
            Self::EmbeddingError | Self::DimensionMismatch => 3,
            Self::StoreError => 4,
            Self::InvalidArgument => 5,
            Self::IoError | Self::JsonError => 6,
        }
    }

    /// Whether an agent should retry with corrected input.
    ///
    /// Only input errors qualify. Remote store failures are surfaced
    /// as-is; retry policy belongs to whoever owns the transport.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::InvalidArgument)
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in social-recall operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store is read-only: writes are disabled")]
    ReadOnly,

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector dimension mismatch for '{vector_name}': expected {expected}, got {actual}")]
    DimensionMismatch {
        vector_name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Qdrant error{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Store {
        status: Option<u16>,
        message: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<qdrant_client::QdrantError> for Error {
    fn from(err: qdrant_client::QdrantError) -> Self {
        match err {
            qdrant_client::QdrantError::ResponseError { status } => {
                Self::from_grpc_status(status.code() as i32, status.message())
            }
            other => Self::Store {
                status: None,
                message: other.to_string(),
            },
        }
    }
}

/// HTTP-equivalent status for a gRPC status code.
///
/// `None` means the server was never reached (`UNAVAILABLE`), which is what
/// the connectivity hint keys on.
#[must_use]
pub fn http_status_for_grpc(code: i32) -> Option<u16> {
    match code {
        3 => Some(400),  // INVALID_ARGUMENT
        5 => Some(404),  // NOT_FOUND
        6 => Some(409),  // ALREADY_EXISTS
        7 => Some(403),  // PERMISSION_DENIED
        14 => None,      // UNAVAILABLE
        16 => Some(401), // UNAUTHENTICATED
        _ => Some(500),
    }
}

impl Error {
    /// Store error for a gRPC status returned by Qdrant.
    #[must_use]
    pub fn from_grpc_status(code: i32, message: &str) -> Self {
        Self::Store {
            status: http_status_for_grpc(code),
            message: message.to_string(),
        }
    }

    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Config(_) => ErrorCode::ConfigError,
            Self::ReadOnly => ErrorCode::ReadOnly,
            Self::Embedding(_) => ErrorCode::EmbeddingError,
            Self::DimensionMismatch { .. } => ErrorCode::DimensionMismatch,
            Self::Store { .. } => ErrorCode::StoreError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Whether the remote store rejected a collection creation because the
    /// collection is already there.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        match self {
            Self::Store { status: Some(409), .. } => true,
            Self::Store { message, .. } => message.contains("already exists"),
            _ => false,
        }
    }

    /// Context-aware recovery hint for agents and humans.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Config(msg) if msg.contains("collection") => Some(
                "Set COLLECTION_NAME or pass --collection <name>".to_string(),
            ),
            Self::ReadOnly => Some(
                "Unset QDRANT_READ_ONLY (or set it to false) to enable `recall store`".to_string(),
            ),
            Self::DimensionMismatch { .. } => Some(
                "The configured model does not produce vectors of the declared size. \
                 Check EMBEDDING_MODEL against the collection schema."
                    .to_string(),
            ),
            Self::Store { status: None, .. } => Some(
                "Could not reach Qdrant. Check QDRANT_URL and that the server is running."
                    .to_string(),
            ),
            Self::Store { status: Some(401 | 403), .. } => {
                Some("Qdrant rejected the credentials. Check QDRANT_API_KEY.".to_string())
            }
            Self::Embedding(msg) if msg.contains("load") => Some(format!(
                "Inspect the model cache with `recall model` (MODEL_CACHE_DIR currently \
                 resolves to {})",
                crate::embeddings::config::resolve_cache_dir().display()
            )),
            Self::Config(_)
            | Self::Embedding(_)
            | Self::Store { .. }
            | Self::InvalidArgument(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint. Agents parse this instead of stderr text.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
