use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::vacancy::{NewVacancy, Vacancy};

/// Search filters forwarded to the job board. Absent fields are omitted from
/// the outgoing query entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct VacancySearchQuery {
    pub text: Option<String>,
    pub area: Option<String>,
    #[validate(range(min = 0))]
    pub salary: Option<i64>,
    #[validate(range(min = 0))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u32>,
}

impl VacancySearchQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(text) = &self.text {
            params.push(("text", text.clone()));
        }
        if let Some(area) = &self.area {
            params.push(("area", area.clone()));
        }
        if let Some(salary) = self.salary {
            params.push(("salary", salary.to_string()));
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            params.push(("per_page", per_page.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SaveVacancyPayload {
    #[validate(length(min = 1, max = 50))]
    pub external_id: String,
    #[validate(length(max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 255))]
    pub company: Option<String>,
    pub description: Option<String>,
    #[validate(url)]
    pub url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<SaveVacancyPayload> for NewVacancy {
    fn from(value: SaveVacancyPayload) -> Self {
        Self {
            external_id: value.external_id,
            title: value.title,
            company: value.company,
            description: value.description,
            url: value.url,
            published_at: value.published_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VacancyResponse {
    pub id: Uuid,
    pub external_id: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
}

impl From<Vacancy> for VacancyResponse {
    fn from(value: Vacancy) -> Self {
        Self {
            id: value.id,
            external_id: value.external_id,
            title: value.title,
            company: value.company,
            description: value.description,
            url: value.url,
            published_at: value.published_at,
            fetched_at: value.fetched_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VacancyListResponse {
    pub items: Vec<VacancyResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, IntoParams)]
#[serde(default)]
#[into_params(parameter_in = Query)]
pub struct VacancyListQuery {
    pub limit: Option<i64>,
}

impl VacancyListQuery {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 200;

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}
