use crate::models::ServerError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Inbound frame could not be decoded into a `TickMessage`.
    #[error("{0}")]
    Decode(String),

    /// Error reported by the remote service in the `error` field of a frame.
    #[error("{message}")]
    Protocol {
        code: Option<String>,
        message: String,
    },

    #[error("{0}")]
    Connection(String),

    #[error("already subscribed to ticks")]
    AlreadySubscribed,

    #[error("not subscribed to ticks")]
    NotSubscribed,

    #[error("transport is closed")]
    TransportClosed,
}

impl From<ServerError> for AppError {
    fn from(error: ServerError) -> Self {
        AppError::Protocol {
            code: error.code,
            message: error.message,
        }
    }
}
