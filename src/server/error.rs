use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use crate::server::dtos::response_dto::ErrorResponse;

pub type AppResult<T> = Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    // bad id, bad url param, unknown content kind. Never reaches the provider
    #[error("{0}")]
    BadRequest(String),

    // connect, dns or timeout before any header came back. the context is for logs only since it
    // can describe the provider
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("upstream responded with {0}")]
    UpstreamServerError(StatusCode),

    // not really an error, the client went away before we had anything to send
    #[error("client disconnected")]
    ClientAborted,

    // no route matched
    #[error("not found")]
    NotFound,

    #[error("{0}")]
    InternalServerErrorWithContext(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// what the client gets to see, upstream details stay in the logs
    fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg) => msg.clone(),
            Self::UpstreamUnreachable(_) | Self::UpstreamServerError(_) => {
                "Failed to fetch stream from provider".to_string()
            }
            Self::NotFound => "Not found".to_string(),
            Self::ClientAborted => "Client disconnected".to_string(),
            Self::InternalServerErrorWithContext(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Self::BadRequest(_) | Self::NotFound | Self::ClientAborted => debug!("request rejected: {}", self),
            _ => error!("request failed: {}", self),
        }

        let body = ErrorResponse {
            success: false,
            error: self.public_message(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}
