//! In-process store with the same semantics as [`PgStore`](super::postgres::PgStore).
//! Used by the test suites and for running handlers without a database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::database::store::{
    ApplicationStore, FilterStore, LogStore, TokenStore, UserStore, VacancyStore,
};
use crate::error::{Error, Result};
use crate::models::{
    api_token::{ApiToken, TokenUpdate},
    application::{Application, ApplicationFilter, ApplicationStatus, NewApplication},
    filter_settings::{FilterSettings, NewFilterSettings},
    log::Log,
    user::{placeholder_email, User},
    vacancy::{NewVacancy, Vacancy},
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    filters: Vec<FilterSettings>,
    vacancies: Vec<Vacancy>,
    applications: Vec<Application>,
    logs: Vec<Log>,
    tokens: HashMap<(Uuid, String), ApiToken>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> Result<T> {
        let mut guard = self
            .tables
            .lock()
            .map_err(|_| Error::Internal("memory store mutex poisoned".to_string()))?;
        Ok(f(&mut guard))
    }

    pub fn token_count(&self) -> usize {
        self.with(|t| t.tokens.len()).unwrap_or_default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: Option<String>,
    ) -> Result<User> {
        self.with(|t| {
            if t.users.iter().any(|u| u.email == email) {
                return Err(Error::Conflict(format!("Email {} is already registered", email)));
            }
            let user = User {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
                created_at: Utc::now(),
                updated_at: None,
            };
            t.users.push(user.clone());
            Ok(user)
        })?
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.with(|t| t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.with(|t| t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn ensure_user(&self, id: Uuid) -> Result<()> {
        self.with(|t| {
            if !t.users.iter().any(|u| u.id == id) {
                t.users.push(User {
                    id,
                    name: "Unknown".to_string(),
                    email: placeholder_email(id),
                    password_hash: None,
                    created_at: Utc::now(),
                    updated_at: None,
                });
            }
        })
    }
}

#[async_trait]
impl FilterStore for MemoryStore {
    async fn list_filters(&self, user_id: Uuid) -> Result<Vec<FilterSettings>> {
        self.with(|t| {
            let mut items: Vec<_> = t
                .filters
                .iter()
                .filter(|f| f.user_id == user_id)
                .cloned()
                .collect();
            items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            items
        })
    }

    async fn save_filter(&self, user_id: Uuid, filter: NewFilterSettings) -> Result<FilterSettings> {
        self.with(|t| {
            let item = FilterSettings {
                id: Uuid::new_v4(),
                user_id,
                city: filter.city,
                salary_min: filter.salary_min,
                salary_max: filter.salary_max,
                work_format: filter.work_format,
                keywords: filter.keywords,
                created_at: Utc::now(),
                updated_at: None,
            };
            t.filters.push(item.clone());
            item
        })
    }
}

#[async_trait]
impl VacancyStore for MemoryStore {
    async fn save_vacancy(&self, user_id: Uuid, vacancy: NewVacancy) -> Result<Vacancy> {
        self.with(|t| {
            if let Some(existing) = t
                .vacancies
                .iter_mut()
                .find(|v| v.user_id == user_id && v.external_id == vacancy.external_id)
            {
                existing.title = vacancy.title.or(existing.title.take());
                existing.company = vacancy.company.or(existing.company.take());
                existing.description = vacancy.description.or(existing.description.take());
                existing.url = vacancy.url.or(existing.url.take());
                existing.published_at = vacancy.published_at.or(existing.published_at);
                existing.fetched_at = Utc::now();
                return existing.clone();
            }
            let item = Vacancy {
                id: Uuid::new_v4(),
                user_id,
                external_id: vacancy.external_id,
                title: vacancy.title,
                company: vacancy.company,
                description: vacancy.description,
                url: vacancy.url,
                published_at: vacancy.published_at,
                fetched_at: Utc::now(),
            };
            t.vacancies.push(item.clone());
            item
        })
    }

    async fn find_vacancy_by_external_id(
        &self,
        user_id: Uuid,
        external_id: &str,
    ) -> Result<Option<Vacancy>> {
        self.with(|t| {
            t.vacancies
                .iter()
                .find(|v| v.user_id == user_id && v.external_id == external_id)
                .cloned()
        })
    }

    async fn list_vacancies(&self, user_id: Uuid, limit: i64) -> Result<Vec<Vacancy>> {
        self.with(|t| {
            let mut items: Vec<_> = t
                .vacancies
                .iter()
                .filter(|v| v.user_id == user_id)
                .cloned()
                .collect();
            items.sort_by(|a, b| b.fetched_at.cmp(&a.fetched_at));
            items.truncate(limit.max(0) as usize);
            items
        })
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn create_application(&self, application: NewApplication) -> Result<Application> {
        self.with(|t| {
            let item = Application {
                id: Uuid::new_v4(),
                user_id: application.user_id,
                vacancy_id: application.vacancy_id,
                status: ApplicationStatus::Pending.as_str().to_string(),
                cover_letter: application.cover_letter,
                applied_at: Utc::now(),
            };
            t.applications.push(item.clone());
            item
        })
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>> {
        self.with(|t| t.applications.iter().find(|a| a.id == id).cloned())
    }

    async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application> {
        self.with(|t| {
            let item = t
                .applications
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or_else(|| Error::NotFound(format!("Application {} not found", id)))?;
            let allowed = item
                .status()
                .map(|current| current.can_transition_to(status))
                .unwrap_or(false);
            if !allowed {
                return Err(Error::Conflict(format!(
                    "Application {} cannot move from {} to {}",
                    id, item.status, status
                )));
            }
            item.status = status.as_str().to_string();
            Ok(item.clone())
        })?
    }

    async fn list_applications(
        &self,
        user_id: Uuid,
        filter: ApplicationFilter,
    ) -> Result<Vec<Application>> {
        self.with(|t| {
            let mut items: Vec<_> = t
                .applications
                .iter()
                .filter(|a| a.user_id == user_id)
                .filter(|a| filter.vacancy_id.map_or(true, |v| a.vacancy_id == Some(v)))
                .filter(|a| filter.status.map_or(true, |s| a.status == s.as_str()))
                .cloned()
                .collect();
            items.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
            items
        })
    }
}

#[async_trait]
impl LogStore for MemoryStore {
    async fn add_log(&self, user_id: Uuid, action: &str, description: &str) -> Result<Log> {
        self.with(|t| {
            let item = Log {
                id: Uuid::new_v4(),
                user_id,
                action: action.to_string(),
                description: Some(description.to_string()),
                created_at: Utc::now(),
            };
            t.logs.push(item.clone());
            item
        })
    }

    async fn list_logs(&self, user_id: Uuid, limit: i64) -> Result<Vec<Log>> {
        self.with(|t| {
            let mut items: Vec<_> = t
                .logs
                .iter()
                .filter(|l| l.user_id == user_id)
                .cloned()
                .collect();
            items.reverse();
            items.truncate(limit.max(0) as usize);
            items
        })
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn get_token(&self, user_id: Uuid, service_name: &str) -> Result<Option<ApiToken>> {
        self.with(|t| t.tokens.get(&(user_id, service_name.to_string())).cloned())
    }

    async fn upsert_token(
        &self,
        user_id: Uuid,
        service_name: &str,
        update: TokenUpdate,
    ) -> Result<ApiToken> {
        self.with(|t| {
            let now = Utc::now();
            let entry = t
                .tokens
                .entry((user_id, service_name.to_string()))
                .and_modify(|existing| {
                    existing.access_token = update.access_token.clone();
                    existing.refresh_token = update.refresh_token.clone();
                    existing.expires_at = update.expires_at;
                    existing.updated_at = Some(now);
                })
                .or_insert_with(|| ApiToken {
                    id: Uuid::new_v4(),
                    user_id,
                    service_name: service_name.to_string(),
                    access_token: update.access_token.clone(),
                    refresh_token: update.refresh_token.clone(),
                    expires_at: update.expires_at,
                    created_at: now,
                    updated_at: None,
                });
            entry.clone()
        })
    }
}
