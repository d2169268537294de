use crate::labels::LabelError;

/// Errors returned by the AgentBay SDK.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 401/403, or a client built without an API key.
    #[error("authentication error: {0}")]
    Auth(String),

    /// 404 Not Found.
    #[error("not found: {0}")]
    NotFound(String),

    /// 400 Bad Request, or a parameter rejected before sending.
    #[error("validation error: {0}")]
    Validation(String),

    /// Any other HTTP error status.
    #[error("server error: {0}")]
    Server(String),

    /// The service answered 2xx but reported `Success: false`.
    #[error("api error [{code}]: {message} (request id: {request_id})")]
    Api {
        code: String,
        message: String,
        request_id: String,
    },

    /// A tool call inside the session reported an error.
    #[error("tool error: {message} (request id: {request_id})")]
    Tool { message: String, request_id: String },

    /// Labels failed local validation; nothing was sent.
    #[error("{0}")]
    InvalidLabels(#[from] LabelError),

    /// A successful response carried no request id.
    #[error("response to {0} carried no request id")]
    MissingRequestId(String),

    /// The `AgentBay` client that created this session has been dropped.
    #[error("the owning AgentBay client has been dropped")]
    ClientDropped,

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network / connection error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Map an HTTP status + body to the appropriate error variant.
pub fn error_from_status(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("Message")
                .or_else(|| v.get("error"))
                .and_then(|e| e.as_str().map(String::from))
        })
        .unwrap_or_else(|| body.to_string());

    match status {
        400 => Error::Validation(message),
        401 | 403 => Error::Auth(message),
        404 => Error::NotFound(message),
        _ => Error::Server(message),
    }
}
