//! Services and handles shared by every worker.

use std::sync::Arc;

use actix_web::web;
use log::{info, warn};

use crate::config::{AppConfig, StorageBackend};
use crate::database::{
    Database, InMemoryPostStore, InMemoryUserStore, MongoPostStore, MongoUserStore, PostStore,
    StoreError, UserStore,
};
use crate::middleware::auth::IdentityVerifier;
use crate::middleware::error_handler::{json_config, query_config};
use crate::middleware::firebase::FirebaseVerifier;
use crate::post::post_service::PostService;
use crate::stats::service::StatsService;
use crate::user::service::UserService;
use crate::utils::error::CustomError;

/// Probes the storage backend for `/api/health`.
pub struct HealthProbe {
    users: Arc<dyn UserStore>,
    backend: &'static str,
}

impl HealthProbe {
    pub async fn check(&self) -> Result<(), StoreError> {
        self.users.ping().await
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }
}

#[derive(Clone)]
pub struct AppState {
    pub users: web::Data<UserService>,
    pub posts: web::Data<PostService>,
    pub stats: web::Data<StatsService>,
    pub verifier: web::Data<dyn IdentityVerifier>,
    pub health: web::Data<HealthProbe>,
}

impl AppState {
    /// Connects the configured backend and the Firebase verifier.
    pub async fn build(config: &AppConfig) -> Result<Self, CustomError> {
        let (users, posts, backend): (Arc<dyn UserStore>, Arc<dyn PostStore>, &'static str) =
            match (config.storage, config.mongo.as_ref()) {
                (StorageBackend::MongoDb, Some(mongo)) => {
                    let database = Database::init(mongo).await?;
                    database.ensure_indexes().await?;
                    (
                        Arc::new(MongoUserStore::new(&database)) as Arc<dyn UserStore>,
                        Arc::new(MongoPostStore::new(&database)) as Arc<dyn PostStore>,
                        "mongodb",
                    )
                }
                (StorageBackend::MongoDb, None) => {
                    return Err(CustomError::InternalServerError(
                        "MongoDB storage selected without connection settings".to_string(),
                    ));
                }
                (StorageBackend::Memory, _) => {
                    warn!("Using in-memory storage; data is lost on restart");
                    (
                        Arc::new(InMemoryUserStore::new()) as Arc<dyn UserStore>,
                        Arc::new(InMemoryPostStore::new()) as Arc<dyn PostStore>,
                        "memory",
                    )
                }
            };

        let verifier: Arc<dyn IdentityVerifier> =
            Arc::new(FirebaseVerifier::new(&config.firebase_project_id)?);

        info!("Application state initialized with {} storage", backend);
        Ok(Self::with_parts(users, posts, verifier, backend))
    }

    /// Assembles state from ready-made stores and verifier.
    pub fn with_parts(
        users: Arc<dyn UserStore>,
        posts: Arc<dyn PostStore>,
        verifier: Arc<dyn IdentityVerifier>,
        backend: &'static str,
    ) -> Self {
        AppState {
            users: web::Data::new(UserService::new(users.clone())),
            posts: web::Data::new(PostService::new(posts.clone(), users.clone())),
            stats: web::Data::new(StatsService::new(posts, users.clone())),
            verifier: web::Data::from(verifier),
            health: web::Data::new(HealthProbe { users, backend }),
        }
    }

    /// In-memory stores behind the given verifier.
    pub fn in_memory(verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self::with_parts(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryPostStore::new()),
            verifier,
            "memory",
        )
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.users.clone())
            .app_data(self.posts.clone())
            .app_data(self.stats.clone())
            .app_data(self.verifier.clone())
            .app_data(self.health.clone())
            .app_data(json_config())
            .app_data(query_config());
    }
}
