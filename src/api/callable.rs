use actix_web::web;
use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;

/// Request body of a callable function: `{"data": ...}`.
#[derive(Debug, Deserialize)]
pub struct CallableRequest<T> {
    pub data: T,
}

/// Successful callable reply: `{"result": ...}`.
#[derive(Debug, Serialize)]
pub struct CallableResponse<T> {
    pub result: T,
}

impl<T> CallableResponse<T> {
    pub fn new(result: T) -> Self {
        Self { result }
    }
}

/// Rejects malformed payloads with the callable error envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| AppError::InvalidArgument(err.to_string()).into())
}
