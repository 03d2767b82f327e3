use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::middleware::auth::AuthenticatedUser;
use crate::user::model::UserView;
use crate::user::service::UserService;
use crate::utils::error::CustomError;

/// POST /api/auth/sync
pub async fn sync_user(
    user_service: web::Data<UserService>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let user = user_service.sync_user(&identity).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "User synced successfully",
        "user": UserView::from(&user),
    })))
}

/// GET /api/auth/me
pub async fn get_me(
    user_service: web::Data<UserService>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let user = user_service
        .get_user_by_external_id(&identity.external_id)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "user": UserView::from(&user),
    })))
}

/// GET /api/auth/verify
pub async fn verify(AuthenticatedUser(identity): AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Token is valid",
        "user": identity,
    }))
}
