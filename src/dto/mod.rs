pub mod application_dto;
pub mod auth_dto;
pub mod cover_letter_dto;
pub mod filter_dto;
pub mod log_dto;
pub mod user_dto;
pub mod vacancy_dto;
