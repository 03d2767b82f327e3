use log::info;
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, IndexModel};

use crate::config::MongoConfig;
use crate::database::mongo::{POSTS_COLLECTION, USERS_COLLECTION};
use crate::database::store::StoreError;
use crate::post::post_model::Post;
use crate::user::model::User;

/// Connection handle shared by the MongoDB stores.
///
/// The driver pools connections internally; cloning is cheap.
#[derive(Clone)]
pub struct Database {
    pub client: Client,
    pub db: mongodb::Database,
}

impl Database {
    pub async fn init(config: &MongoConfig) -> Result<Self, StoreError> {
        let mut client_options = ClientOptions::parse(&config.uri).await?;
        client_options.app_name = Some("fpv_blog_backend".to_string());
        client_options.max_pool_size = Some(config.max_pool_size);
        client_options.server_selection_timeout = Some(config.server_selection_timeout);

        let client = Client::with_options(client_options)?;
        let database = Self {
            db: client.database(&config.database),
            client,
        };

        database.ping().await?;
        info!("Connected successfully to MongoDB database {}", config.database);

        Ok(database)
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    /// Unique identity indexes on users, lookup indexes on posts.
    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let unique = IndexOptions::builder().unique(true).build();

        let users = self.db.collection::<User>(USERS_COLLECTION);
        users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "firebaseUid": 1 })
                    .options(unique.clone())
                    .build(),
            )
            .await?;
        users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique)
                    .build(),
            )
            .await?;

        let posts = self.db.collection::<Post>(POSTS_COLLECTION);
        posts
            .create_index(IndexModel::builder().keys(doc! { "authorId": 1 }).build())
            .await?;
        posts
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "status": 1, "createdAt": -1 })
                    .build(),
            )
            .await?;

        info!("MongoDB indexes ensured");
        Ok(())
    }
}
