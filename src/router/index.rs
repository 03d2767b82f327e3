use super::health::health_check;
use crate::post::post_index::post_routes;
use crate::stats::index::stats_routes;
use crate::user::index::user_routes;
use actix_web::web;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health_check))
            .configure(user_routes)
            .configure(post_routes)
            .configure(stats_routes),
    );
}
