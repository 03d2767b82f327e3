pub mod config;
pub mod database;
pub mod middleware;
pub mod post;
pub mod router;
pub mod state;
pub mod stats;
pub mod user;
pub mod utils;
