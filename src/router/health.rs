use actix_web::{HttpResponse, web};
use chrono::Utc;
use log::warn;
use serde_json::json;

use crate::state::HealthProbe;

/// GET /api/health
pub async fn health_check(probe: web::Data<HealthProbe>) -> HttpResponse {
    let timestamp = Utc::now().to_rfc3339();

    match probe.check().await {
        Ok(()) => HttpResponse::Ok().json(json!({
            "status": "OK",
            "message": "FPV blog backend is running",
            "storage": probe.backend(),
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": timestamp,
        })),
        Err(e) => {
            warn!("Health check failed: {}", e);
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "DEGRADED",
                "message": "Storage backend unreachable",
                "storage": probe.backend(),
                "version": env!("CARGO_PKG_VERSION"),
                "timestamp": timestamp,
            }))
        }
    }
}
