use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GenError>;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to call {provider} API: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API error: status {status}, response: {body}")]
    ProviderStatus {
        provider: &'static str,
        status: u16,
        body: String,
    },

    // 200 with an error payload or an unreadable body
    #[error("{provider} error: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    #[error("no choices in {provider} response")]
    EmptyResponse { provider: &'static str },

    #[error("unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("no candidates in response")]
    NoCandidates,

    #[error("no images generated")]
    NoImagesGenerated,

    #[error("failed to write image file: {0}")]
    Storage(#[from] std::io::Error),

    #[error("failed to enhance prompt: {0}")]
    Enhancement(#[source] Box<GenError>),

    #[error("failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<GenError>,
    },
}

impl GenError {
    pub fn is_transient(&self) -> bool {
        match self {
            GenError::Transport { .. } => true,
            GenError::ProviderStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl ResponseError for GenError {
    fn status_code(&self) -> StatusCode {
        match self {
            GenError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
