use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use fpv_blog_backend::middleware::auth::IdentityVerifier;
use fpv_blog_backend::state::AppState;
use fpv_blog_backend::user::model::VerifiedIdentity;
use fpv_blog_backend::utils::error::CustomError;

/// Accepts a fixed set of tokens, one per test pilot.
pub struct StaticVerifier {
    identities: HashMap<String, VerifiedIdentity>,
}

impl StaticVerifier {
    pub fn new(pilots: &[&str]) -> Self {
        let identities = pilots
            .iter()
            .map(|name| (token(name), pilot(name)))
            .collect();
        StaticVerifier { identities }
    }
}

#[async_trait]
impl IdentityVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, CustomError> {
        self.identities
            .get(token)
            .cloned()
            .ok_or_else(|| CustomError::InvalidTokenError("Invalid or expired token".into()))
    }
}

pub fn token(name: &str) -> String {
    format!("token-{}", name)
}

pub fn bearer(name: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token(name)))
}

pub fn pilot(name: &str) -> VerifiedIdentity {
    VerifiedIdentity {
        external_id: format!("uid-{}", name),
        email: format!("{}@fpv.test", name),
        display_name: name.to_string(),
        avatar_url: Some(format!("https://img.fpv.test/{}.png", name)),
        provider: Some("google.com".into()),
    }
}

/// In-memory state that knows the pilots `alice`, `bob` and `carol`.
#[allow(dead_code)]
pub fn test_state() -> AppState {
    AppState::in_memory(Arc::new(StaticVerifier::new(&["alice", "bob", "carol"])))
}

/// Initializes the full `/api` service over `$state`.
#[macro_export]
macro_rules! test_app {
    ($state:expr) => {{
        let state: fpv_blog_backend::state::AppState = $state;
        actix_web::test::init_service(
            actix_web::App::new()
                .configure(|cfg| state.configure(cfg))
                .configure(fpv_blog_backend::router::index::routes)
                .default_service(actix_web::web::to(
                    fpv_blog_backend::middleware::not_found::not_found,
                )),
        )
        .await
    }};
}

#[allow(dead_code)]
pub fn post_body(title: &str, category: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "excerpt": format!("{} in short", title),
        "content": "Props on, battery strapped, punch out over the field.",
        "category": category,
        "tags": ["fpv"],
    })
}
