pub mod api_token;
pub mod application;
pub mod filter_settings;
pub mod log;
pub mod user;
pub mod vacancy;
