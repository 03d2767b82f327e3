use actix_cors::Cors;
use actix_web::http::{Method, header};

use crate::config::AppConfig;

/// Configured origins only, or any origin in development.
pub fn cors(config: &AppConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allowed_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .supports_credentials();

    if config.is_development() {
        cors = cors.allowed_origin_fn(|_, _| true);
    } else {
        for origin in &config.cors_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}
