use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Sent,
    Error,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Sent => "sent",
            ApplicationStatus::Error => "error",
        }
    }

    /// `pending` is the only non-terminal state.
    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        matches!(
            (self, next),
            (ApplicationStatus::Pending, ApplicationStatus::Sent)
                | (ApplicationStatus::Pending, ApplicationStatus::Error)
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "sent" => Ok(ApplicationStatus::Sent),
            "error" => Ok(ApplicationStatus::Error),
            other => Err(format!("Unknown application status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vacancy_id: Option<Uuid>,
    pub status: String,
    pub cover_letter: Option<String>,
    pub applied_at: DateTime<Utc>,
}

impl Application {
    pub fn status(&self) -> Option<ApplicationStatus> {
        self.status.parse().ok()
    }
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub user_id: Uuid,
    pub vacancy_id: Option<Uuid>,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub vacancy_id: Option<Uuid>,
    pub status: Option<ApplicationStatus>,
}
