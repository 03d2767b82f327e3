pub mod auth;
pub mod cors;
pub mod error_handler;
pub mod firebase;
pub mod not_found;
