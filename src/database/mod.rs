pub mod db;
pub mod memory;
pub mod mongo;
pub mod store;

pub use db::Database;
pub use memory::{InMemoryPostStore, InMemoryUserStore};
pub use mongo::{MongoPostStore, MongoUserStore};
pub use store::{CategoryCount, PostStore, StoreError, UserStore};
