use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is not a valid number: {value}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("corrupted record: {0}")]
    Corrupted(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest_middleware::Error),
    #[error("failed to read response: {0}")]
    Body(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),
    #[error("telegram rejected the request: {0}")]
    Rejected(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("unknown callback prefix in {0:?}")]
    UnknownPrefix(String),
    #[error("malformed callback payload {0:?}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum DialogError {
    /// Событие без перехода из текущего состояния или устаревшая кнопка
    #[error("protocol violation: {0}")]
    Protocol(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
