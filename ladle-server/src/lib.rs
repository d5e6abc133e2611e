pub mod auth;
pub mod cache;
pub mod database;
pub mod errors;
pub mod models;
