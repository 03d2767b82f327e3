use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde_json::json;

use crate::utils::helpers::service_name;

/// Fallback for requests that match no route.
pub async fn not_found() -> HttpResponse {
    HttpResponse::build(StatusCode::NOT_FOUND).json(json!({
        "success": false,
        "error": "Route not found",
        "errorType": "NOT_FOUND_ERROR",
        "httpStatusCode": StatusCode::NOT_FOUND.as_u16(),
        "service": service_name(),
    }))
}
