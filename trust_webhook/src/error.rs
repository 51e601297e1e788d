use thiserror::Error;

/// Errors that can occur while defaulting or serving admission requests
#[derive(Error, Debug)]
pub enum Error {
    /// The admission object is not of the kind the defaulter handles
    #[error("expected a {expected}, but got a {got}")]
    UnexpectedType { expected: String, got: String },

    /// Error during JSON serialization/deserialization
    #[error("SerializationError: {0}")]
    SerializationError(#[source] serde_json::Error),

    /// The JSON patch could not be attached to the admission response
    #[error("PatchError: {0}")]
    PatchError(String),

    /// The webhook server failed to bind or serve
    #[error("Server Error: {0}")]
    ServerError(#[source] std::io::Error),

    /// Incomplete or unreadable TLS configuration
    #[error("TLS Error: {0}")]
    TlsError(String),
}

/// Errors that can occur during admission handler execution
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Error from the webhook
    #[error("{0}")]
    WebhookError(#[from] Error),
}

/// Result type for webhook operations
pub type Result<T, E = Error> = std::result::Result<T, E>;
