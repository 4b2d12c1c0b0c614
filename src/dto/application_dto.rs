use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::application::Application;

fn default_send_now() -> bool {
    true
}

fn validate_vacancy_id(value: &str) -> Result<(), ValidationError> {
    if value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("vacancy_id_digits"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateApplicationPayload {
    /// Job-board vacancy id, digits only.
    #[validate(length(min = 1, max = 50), custom(function = "validate_vacancy_id"))]
    pub vacancy_id: String,
    /// Falls back to `HH_DEFAULT_RESUME_ID` when absent.
    pub resume_id: Option<String>,
    /// Needed only when `cover_letter` is absent.
    pub resume_text: Option<String>,
    pub cover_letter: Option<String>,
    pub tone: Option<String>,
    #[serde(default = "default_send_now")]
    pub send_now: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplicationResponse {
    pub application_id: Uuid,
    pub status: String,
    #[schema(value_type = Object)]
    pub upstream_response: Option<JsonValue>,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplicationDetail {
    pub id: Uuid,
    pub vacancy_id: Option<Uuid>,
    pub status: String,
    pub cover_letter: Option<String>,
    pub applied_at: DateTime<Utc>,
}

impl From<Application> for ApplicationDetail {
    fn from(value: Application) -> Self {
        Self {
            id: value.id,
            vacancy_id: value.vacancy_id,
            status: value.status,
            cover_letter: value.cover_letter,
            applied_at: value.applied_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplicationListResponse {
    pub items: Vec<ApplicationDetail>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ApplicationListQuery {
    /// Stored vacancy id.
    pub vacancy_id: Option<Uuid>,
    /// `pending`, `sent` or `error`.
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn send_now_defaults_to_true() {
        let payload: CreateApplicationPayload =
            serde_json::from_value(json!({"vacancy_id": "123"})).unwrap();
        assert!(payload.send_now);
        assert!(payload.cover_letter.is_none());
    }

    #[test]
    fn vacancy_id_must_be_numeric() {
        for id in ["../negotiations", "12 3", "abc"] {
            let payload: CreateApplicationPayload =
                serde_json::from_value(json!({"vacancy_id": id})).unwrap();
            assert!(payload.validate().is_err(), "{} should be rejected", id);
        }
        let payload: CreateApplicationPayload =
            serde_json::from_value(json!({"vacancy_id": "93353083"})).unwrap();
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn empty_vacancy_id_fails_validation() {
        let payload: CreateApplicationPayload =
            serde_json::from_value(json!({"vacancy_id": "", "send_now": false})).unwrap();
        assert!(payload.validate().is_err());
    }
}
