use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::log::Log;

pub const DEFAULT_LOG_LIMIT: i64 = 50;
pub const MAX_LOG_LIMIT: i64 = 200;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogListQuery {
    pub limit: Option<i64>,
}

impl LogListQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogResponse {
    pub id: Uuid,
    pub action: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Log> for LogResponse {
    fn from(value: Log) -> Self {
        Self {
            id: value.id,
            action: value.action,
            description: value.description,
            created_at: value.created_at,
        }
    }
}
