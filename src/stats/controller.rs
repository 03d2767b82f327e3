use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::stats::service::StatsService;
use crate::utils::error::CustomError;

/// GET /api/stats
pub async fn get_stats(
    stats_service: web::Data<StatsService>,
) -> Result<HttpResponse, CustomError> {
    let stats = stats_service.get_stats().await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "stats": stats,
    })))
}

/// GET /api/categories
pub async fn get_categories(
    stats_service: web::Data<StatsService>,
) -> Result<HttpResponse, CustomError> {
    let categories = stats_service.get_category_counts().await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "categories": categories,
    })))
}
