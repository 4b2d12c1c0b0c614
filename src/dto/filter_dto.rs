use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::filter_settings::{FilterSettings, NewFilterSettings};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_salary_range"))]
pub struct SaveFilterPayload {
    #[validate(length(max = 128))]
    pub city: Option<String>,
    #[validate(range(min = 0))]
    pub salary_min: Option<i32>,
    #[validate(range(min = 0))]
    pub salary_max: Option<i32>,
    #[validate(length(max = 64))]
    pub work_format: Option<String>,
    pub keywords: Option<String>,
}

fn validate_salary_range(payload: &SaveFilterPayload) -> Result<(), ValidationError> {
    match (payload.salary_min, payload.salary_max) {
        (Some(min), Some(max)) if min > max => Err(ValidationError::new("salary_range")),
        _ => Ok(()),
    }
}

impl From<SaveFilterPayload> for NewFilterSettings {
    fn from(value: SaveFilterPayload) -> Self {
        Self {
            city: value.city,
            salary_min: value.salary_min,
            salary_max: value.salary_max,
            work_format: value.work_format,
            keywords: value.keywords,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FilterResponse {
    pub id: Uuid,
    pub city: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub work_format: Option<String>,
    pub keywords: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<FilterSettings> for FilterResponse {
    fn from(value: FilterSettings) -> Self {
        Self {
            id: value.id,
            city: value.city,
            salary_min: value.salary_min,
            salary_max: value.salary_max,
            work_format: value.work_format,
            keywords: value.keywords,
            created_at: value.created_at,
        }
    }
}
