use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vacancy {
    pub id: Uuid,
    pub user_id: Uuid,
    pub external_id: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewVacancy {
    pub external_id: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Vacancy {
    /// Text handed to the cover-letter generator.
    pub fn prompt_text(&self) -> String {
        let mut parts = Vec::new();
        if let Some(title) = &self.title {
            parts.push(title.clone());
        }
        if let Some(company) = &self.company {
            parts.push(format!("Company: {}", company));
        }
        if let Some(description) = &self.description {
            parts.push(description.clone());
        }
        if parts.is_empty() {
            format!("Vacancy {}", self.external_id)
        } else {
            parts.join("\n\n")
        }
    }
}
