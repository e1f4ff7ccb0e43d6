use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::database::StoreError;
use crate::services::identity_service::IdentityError;
use crate::services::mail_service::MailError;
use crate::utils::crypto::CryptoError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Status string used in the callable error envelope.
    pub fn callable_status(&self) -> &'static str {
        match self {
            AppError::InvalidArgument(_) => "INVALID_ARGUMENT",
            AppError::Identity(IdentityError::NotFound(_)) => "NOT_FOUND",
            AppError::Identity(IdentityError::Rejected { .. }) => "FAILED_PRECONDITION",
            AppError::Identity(_) | AppError::Mail(_) => "UNAVAILABLE",
            _ => "INTERNAL",
        }
    }
}

#[derive(Serialize)]
struct CallableErrorBody<'a> {
    status: &'a str,
    message: String,
}

#[derive(Serialize)]
struct CallableErrorEnvelope<'a> {
    error: CallableErrorBody<'a>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::Identity(IdentityError::Rejected { .. })
            | AppError::Identity(IdentityError::NotFound(_)) => StatusCode::BAD_REQUEST,
            AppError::Identity(_) | AppError::Mail(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(CallableErrorEnvelope {
            error: CallableErrorBody {
                status: self.callable_status(),
                message: self.to_string(),
            },
        })
    }
}
