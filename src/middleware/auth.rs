use actix_web::dev::Payload;
use actix_web::http::header::Header;
use actix_web::{FromRequest, HttpMessage, HttpRequest, web};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use async_trait::async_trait;
use futures_util::future::LocalBoxFuture;
use log::warn;

use crate::user::model::VerifiedIdentity;
use crate::utils::error::CustomError;

/// Validates bearer credentials against the external identity provider.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, CustomError>;
}

/// The caller's verified identity. Extracting it makes a handler protected.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub VerifiedIdentity);

fn bearer_token(req: &HttpRequest) -> Result<String, CustomError> {
    Authorization::<Bearer>::parse(req)
        .map(|auth| auth.into_scheme().token().to_string())
        .ok()
        .filter(|token| !token.is_empty())
        .ok_or_else(|| CustomError::AuthenticationError("Access token required".to_string()))
}

impl FromRequest for AuthenticatedUser {
    type Error = CustomError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        if let Some(identity) = req.extensions().get::<VerifiedIdentity>().cloned() {
            return Box::pin(async move { Ok(AuthenticatedUser(identity)) });
        }

        let token = bearer_token(req);
        let verifier = req.app_data::<web::Data<dyn IdentityVerifier>>().cloned();
        let req = req.clone();

        Box::pin(async move {
            let token = token?;
            let verifier = verifier.ok_or_else(|| {
                CustomError::InternalServerError("Identity verifier not configured".to_string())
            })?;

            let identity = verifier.verify(&token).await.inspect_err(|e| {
                warn!("Token verification failed: {}", e);
            })?;

            req.extensions_mut().insert(identity.clone());
            Ok(AuthenticatedUser(identity))
        })
    }
}
