use super::controller::{get_me, sync_user, verify};
use actix_web::web;

pub fn user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/sync", web::post().to(sync_user))
            .route("/me", web::get().to(get_me))
            .route("/verify", web::get().to(verify)),
    );
}
