use thiserror::Error;

/// Failures talking to the media daemon.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Request never got an answer.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("daemon answered {status} for {uri}")]
    Status { status: u16, uri: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

    /// The daemon understood the request and refused it.
    #[error("daemon refused: {0}")]
    Rejected(String),

    #[error("live channel closed")]
    Closed,
}

impl From<tokio_tungstenite::tungstenite::Error> for DaemonError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        DaemonError::WebSocket(Box::new(e))
    }
}
