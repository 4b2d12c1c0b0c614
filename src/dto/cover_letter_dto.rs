use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CoverLetterRequest {
    #[validate(length(min = 1))]
    pub vacancy_description: String,
    #[validate(length(min = 1))]
    pub resume_text: String,
    /// `formal` (default) or anything else for a friendly tone.
    pub tone: Option<String>,
    /// Upper bound on generated tokens.
    #[validate(range(min = 1, max = 4096))]
    pub max_length: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CoverLetterResponse {
    pub cover_letter: String,
}
