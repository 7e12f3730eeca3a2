use actix_web::http::StatusCode;
use actix_web::{error::ResponseError, HttpResponse};
use serde::Serialize;

/// The §7 error taxonomy: one variant per documented `code`, plus the
/// catch-all that unhandled failures collapse into.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("map not found")]
    MapNotFound,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid authorization token")]
    InvalidToken,

    #[error("unknown authorization token")]
    UnknownToken,

    #[error("method not allowed")]
    InvalidMethod { allow: &'static str },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl GameError {
    fn code(&self) -> &'static str {
        match self {
            GameError::MapNotFound => "mapNotFound",
            GameError::InvalidArgument(_) => "invalidArgument",
            GameError::InvalidToken => "invalidToken",
            GameError::UnknownToken => "unknownToken",
            GameError::InvalidMethod { .. } => "invalidMethod",
            GameError::InvalidRequest(_) => "invalidRequest",
            GameError::Config(_) => "invalidArgument",
            GameError::Internal(_) => "internalError",
        }
    }
}

impl ResponseError for GameError {
    fn status_code(&self) -> StatusCode {
        match self {
            GameError::MapNotFound => StatusCode::NOT_FOUND,
            GameError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            GameError::InvalidToken | GameError::UnknownToken => StatusCode::UNAUTHORIZED,
            GameError::InvalidMethod { .. } => StatusCode::METHOD_NOT_ALLOWED,
            GameError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GameError::Config(_) => StatusCode::BAD_REQUEST,
            GameError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let GameError::Internal(message) = self {
            log::error!("internal error: {message}");
        }

        let mut builder = HttpResponse::build(self.status_code());
        if let GameError::InvalidMethod { allow } = self {
            builder.insert_header((actix_web::http::header::ALLOW, *allow));
        }

        builder
            .insert_header((actix_web::http::header::CACHE_CONTROL, "no-cache"))
            .json(ErrorBody {
                code: self.code(),
                message: self.to_string(),
            })
    }
}

impl From<serde_json::Error> for GameError {
    fn from(err: serde_json::Error) -> Self {
        GameError::InvalidArgument(format!("malformed JSON body: {err}"))
    }
}

impl From<std::io::Error> for GameError {
    fn from(err: std::io::Error) -> Self {
        GameError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
