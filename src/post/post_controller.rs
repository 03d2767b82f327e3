use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::middleware::auth::AuthenticatedUser;
use crate::post::post_model::{CreatePostRequest, ListPostsQuery, UpdatePostRequest};
use crate::post::post_service::PostService;
use crate::user::service::UserService;
use crate::utils::error::CustomError;

/// GET /api/blogs
pub async fn list_posts(
    post_service: web::Data<PostService>,
    query: web::Query<ListPostsQuery>,
) -> Result<HttpResponse, CustomError> {
    let blogs = post_service.list_posts(query.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "total": blogs.len(),
        "blogs": blogs,
    })))
}

/// GET /api/blogs/{id}
pub async fn get_post(
    post_id: web::Path<String>,
    post_service: web::Data<PostService>,
) -> Result<HttpResponse, CustomError> {
    let blog = post_service.get_post(&post_id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "blog": blog,
    })))
}

/// POST /api/blogs
pub async fn create_post(
    post_service: web::Data<PostService>,
    user_service: web::Data<UserService>,
    AuthenticatedUser(identity): AuthenticatedUser,
    body: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, CustomError> {
    let request = body.into_inner();
    // Input problems are reported before the sync check.
    let author = match user_service.resolve_user(&identity).await {
        Ok(author) => author,
        Err(not_synced) => {
            request.check()?;
            return Err(not_synced);
        }
    };

    let blog = post_service.create_post(author.id, request).await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Blog post created successfully",
        "blog": blog,
    })))
}

/// PUT /api/blogs/{id}
pub async fn update_post(
    post_id: web::Path<String>,
    post_service: web::Data<PostService>,
    user_service: web::Data<UserService>,
    AuthenticatedUser(identity): AuthenticatedUser,
    body: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse, CustomError> {
    let requester = user_service.resolve_user(&identity).await?;
    let blog = post_service
        .update_post(&post_id.into_inner(), requester.id, body.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Blog post updated successfully",
        "blog": blog,
    })))
}

/// DELETE /api/blogs/{id}
pub async fn delete_post(
    post_id: web::Path<String>,
    post_service: web::Data<PostService>,
    user_service: web::Data<UserService>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let requester = user_service.resolve_user(&identity).await?;
    post_service
        .delete_post(&post_id.into_inner(), requester.id)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Blog post deleted successfully",
    })))
}

/// GET /api/blogs/user/my-posts
pub async fn my_posts(
    post_service: web::Data<PostService>,
    user_service: web::Data<UserService>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let author = user_service.resolve_user(&identity).await?;
    let mine = post_service.my_posts(author.id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "blogs": mine.blogs,
        "stats": mine.stats,
    })))
}

/// POST /api/blogs/{id}/like
pub async fn toggle_like(
    post_id: web::Path<String>,
    post_service: web::Data<PostService>,
    user_service: web::Data<UserService>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let user = user_service.resolve_user(&identity).await?;
    let outcome = post_service
        .toggle_like(&post_id.into_inner(), user.id)
        .await?;

    let message = if outcome.liked {
        "Blog post liked"
    } else {
        "Blog post unliked"
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": message,
        "liked": outcome.liked,
        "likeCount": outcome.like_count,
    })))
}
