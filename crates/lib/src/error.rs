//! Error type shared by the HTTP gateway and the subscription multiplexer.

/// Errors surfaced by client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connection, DNS or timeout failure at the HTTP layer.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response whose body is not an envelope.
    #[error("http error ({status}): {body}")]
    Http { status: u16, body: String },

    /// The service answered with `status: "error"`. Displays as the service's message.
    #[error("{message}")]
    Service {
        code: i64,
        message: String,
        details: Option<String>,
    },

    /// Response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    /// WebSocket handshake or socket failure.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("WebSocket not connected. Call connect() first.")]
    NotConnected,

    #[error("WebSocket connection already in progress")]
    AlreadyConnecting,

    /// The server rejected an acknowledged subscribe/unsubscribe.
    #[error("subscription rejected: {0}")]
    Subscription(String),

    #[error("timed out waiting for subscription acknowledgment")]
    AckTimeout,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Service-supplied message when the envelope reported an error.
    pub fn service_message(&self) -> Option<&str> {
        match self {
            ClientError::Service { message, .. } => Some(message),
            _ => None,
        }
    }
}
