use thiserror::Error;

/// Failure talking to an external model provider (embeddings, extraction, answers).
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{0} returned an empty response")]
    EmptyResponse(&'static str),

    #[error("malformed extraction JSON: {0}")]
    MalformedExtraction(#[from] serde_json::Error),

    #[error("cannot embed empty text")]
    EmptyInput,

    #[error("config error: {0}")]
    Config(String),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
