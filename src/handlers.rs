pub mod auth;
pub mod feed;
pub mod health;
pub mod posts;
pub mod profile;
