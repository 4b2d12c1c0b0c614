use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FilterSettings {
    pub id: Uuid,
    pub user_id: Uuid,
    pub city: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub work_format: Option<String>,
    pub keywords: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewFilterSettings {
    pub city: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub work_format: Option<String>,
    pub keywords: Option<String>,
}
