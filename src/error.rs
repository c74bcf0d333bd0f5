use thiserror::Error;

/// Result type for webcam-mode operations
pub type Result<T> = std::result::Result<T, WebcamError>;

/// Errors that can occur when talking to the endpoint
#[derive(Error, Debug)]
pub enum WebcamError {
    /// WebSocket connection error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Connection was closed unexpectedly
    #[error("Connection closed")]
    ConnectionClosed,

    /// Request timed out waiting for response
    #[error("Request timeout")]
    Timeout,

    /// The device returned a JSON-RPC error
    #[error("Device error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// Error message from the device
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unexpected response from the device
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Channel receive error
    #[error("Channel error: {0}")]
    ChannelError(String),
}
