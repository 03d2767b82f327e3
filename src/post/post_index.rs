use super::post_controller::{
    create_post, delete_post, get_post, list_posts, my_posts, toggle_like, update_post,
};
use actix_web::web;

pub fn post_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/blogs")
            .route("", web::get().to(list_posts))
            .route("", web::post().to(create_post))
            .route("/user/my-posts", web::get().to(my_posts))
            .route("/{id}", web::get().to(get_post))
            .route("/{id}", web::put().to(update_post))
            .route("/{id}", web::delete().to(delete_post))
            .route("/{id}/like", web::post().to(toggle_like)),
    );
}
