use actix_web::{Error, HttpRequest, web};

use crate::utils::error::CustomError;

/// Malformed JSON bodies answer in the same shape as every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(10 * 1024 * 1024)
        .error_handler(|err, _req: &HttpRequest| -> Error {
            CustomError::BadRequestError(format!("Invalid request body: {}", err)).into()
        })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| -> Error {
        CustomError::BadRequestError(format!("Invalid query string: {}", err)).into()
    })
}
