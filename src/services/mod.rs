pub mod application_service;
pub mod gigachat_service;
pub mod hh_oauth;
pub mod hh_service;
pub mod token_manager;
pub mod upstream;
