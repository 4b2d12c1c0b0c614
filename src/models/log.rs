use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const ACTION_APPLICATION_SENT: &str = "application_sent";
pub const ACTION_APPLICATION_ERROR: &str = "application_error";
pub const ACTION_TOKEN_AUTHORIZED: &str = "token_authorized";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Log {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
