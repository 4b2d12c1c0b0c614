pub mod application;
pub mod auth;
pub mod cover_letter;
pub mod filter;
pub mod health;
pub mod log;
pub mod openapi;
pub mod user;
pub mod vacancy;
