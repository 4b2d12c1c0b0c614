use async_trait::async_trait;
use sqlx::PgPool;
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

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";
const FILTER_COLUMNS: &str =
    "id, user_id, city, salary_min, salary_max, work_format, keywords, created_at, updated_at";
const VACANCY_COLUMNS: &str =
    "id, user_id, external_id, title, company, description, url, published_at, fetched_at";
const APPLICATION_COLUMNS: &str = "id, user_id, vacancy_id, status, cover_letter, applied_at";
const LOG_COLUMNS: &str = "id, user_id, action, description, created_at";
const TOKEN_COLUMNS: &str =
    "id, user_id, service_name, access_token, refresh_token, expires_at, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: Option<String>,
    ) -> Result<User> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(name)
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn ensure_user(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email)
            VALUES ($1, 'Unknown', $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(placeholder_email(id))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl FilterStore for PgStore {
    async fn list_filters(&self, user_id: Uuid) -> Result<Vec<FilterSettings>> {
        let query = format!(
            "SELECT {} FROM filter_settings WHERE user_id = $1 ORDER BY created_at DESC",
            FILTER_COLUMNS
        );
        let items = sqlx::query_as::<_, FilterSettings>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn save_filter(&self, user_id: Uuid, filter: NewFilterSettings) -> Result<FilterSettings> {
        let query = format!(
            r#"
            INSERT INTO filter_settings (user_id, city, salary_min, salary_max, work_format, keywords)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            FILTER_COLUMNS
        );
        let item = sqlx::query_as::<_, FilterSettings>(&query)
            .bind(user_id)
            .bind(filter.city)
            .bind(filter.salary_min)
            .bind(filter.salary_max)
            .bind(filter.work_format)
            .bind(filter.keywords)
            .fetch_one(&self.pool)
            .await?;
        Ok(item)
    }
}

#[async_trait]
impl VacancyStore for PgStore {
    async fn save_vacancy(&self, user_id: Uuid, vacancy: NewVacancy) -> Result<Vacancy> {
        let query = format!(
            r#"
            INSERT INTO vacancies (user_id, external_id, title, company, description, url, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, external_id) DO UPDATE SET
                title = COALESCE(EXCLUDED.title, vacancies.title),
                company = COALESCE(EXCLUDED.company, vacancies.company),
                description = COALESCE(EXCLUDED.description, vacancies.description),
                url = COALESCE(EXCLUDED.url, vacancies.url),
                published_at = COALESCE(EXCLUDED.published_at, vacancies.published_at),
                fetched_at = NOW()
            RETURNING {}
            "#,
            VACANCY_COLUMNS
        );
        let item = sqlx::query_as::<_, Vacancy>(&query)
            .bind(user_id)
            .bind(vacancy.external_id)
            .bind(vacancy.title)
            .bind(vacancy.company)
            .bind(vacancy.description)
            .bind(vacancy.url)
            .bind(vacancy.published_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(item)
    }

    async fn find_vacancy_by_external_id(
        &self,
        user_id: Uuid,
        external_id: &str,
    ) -> Result<Option<Vacancy>> {
        let query = format!(
            "SELECT {} FROM vacancies WHERE user_id = $1 AND external_id = $2",
            VACANCY_COLUMNS
        );
        let item = sqlx::query_as::<_, Vacancy>(&query)
            .bind(user_id)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn list_vacancies(&self, user_id: Uuid, limit: i64) -> Result<Vec<Vacancy>> {
        let query = format!(
            "SELECT {} FROM vacancies WHERE user_id = $1 ORDER BY fetched_at DESC LIMIT $2",
            VACANCY_COLUMNS
        );
        let items = sqlx::query_as::<_, Vacancy>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }
}

#[async_trait]
impl ApplicationStore for PgStore {
    async fn create_application(&self, application: NewApplication) -> Result<Application> {
        let query = format!(
            r#"
            INSERT INTO applications (user_id, vacancy_id, status, cover_letter)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        );
        let item = sqlx::query_as::<_, Application>(&query)
            .bind(application.user_id)
            .bind(application.vacancy_id)
            .bind(ApplicationStatus::Pending.as_str())
            .bind(application.cover_letter)
            .fetch_one(&self.pool)
            .await?;
        Ok(item)
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>> {
        let query = format!("SELECT {} FROM applications WHERE id = $1", APPLICATION_COLUMNS);
        let item = sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application> {
        let query = format!(
            "UPDATE applications SET status = $2 WHERE id = $1 AND status = $3 RETURNING {}",
            APPLICATION_COLUMNS
        );
        let updated = sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(ApplicationStatus::Pending.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(item) => Ok(item),
            None => match self.get_application(id).await? {
                Some(current) => Err(Error::Conflict(format!(
                    "Application {} cannot move from {} to {}",
                    id, current.status, status
                ))),
                None => Err(Error::NotFound(format!("Application {} not found", id))),
            },
        }
    }

    async fn list_applications(
        &self,
        user_id: Uuid,
        filter: ApplicationFilter,
    ) -> Result<Vec<Application>> {
        let query = format!(
            r#"
            SELECT {}
            FROM applications
            WHERE user_id = $1
              AND ($2::uuid IS NULL OR vacancy_id = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY applied_at DESC
            "#,
            APPLICATION_COLUMNS
        );
        let items = sqlx::query_as::<_, Application>(&query)
            .bind(user_id)
            .bind(filter.vacancy_id)
            .bind(filter.status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }
}

#[async_trait]
impl LogStore for PgStore {
    async fn add_log(&self, user_id: Uuid, action: &str, description: &str) -> Result<Log> {
        let query = format!(
            "INSERT INTO logs (user_id, action, description) VALUES ($1, $2, $3) RETURNING {}",
            LOG_COLUMNS
        );
        let item = sqlx::query_as::<_, Log>(&query)
            .bind(user_id)
            .bind(action)
            .bind(description)
            .fetch_one(&self.pool)
            .await?;
        Ok(item)
    }

    async fn list_logs(&self, user_id: Uuid, limit: i64) -> Result<Vec<Log>> {
        let query = format!(
            "SELECT {} FROM logs WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
            LOG_COLUMNS
        );
        let items = sqlx::query_as::<_, Log>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }
}

#[async_trait]
impl TokenStore for PgStore {
    async fn get_token(&self, user_id: Uuid, service_name: &str) -> Result<Option<ApiToken>> {
        let query = format!(
            "SELECT {} FROM api_tokens WHERE user_id = $1 AND service_name = $2",
            TOKEN_COLUMNS
        );
        let item = sqlx::query_as::<_, ApiToken>(&query)
            .bind(user_id)
            .bind(service_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn upsert_token(
        &self,
        user_id: Uuid,
        service_name: &str,
        update: TokenUpdate,
    ) -> Result<ApiToken> {
        let query = format!(
            r#"
            INSERT INTO api_tokens (user_id, service_name, access_token, refresh_token, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, service_name) DO UPDATE SET
                access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                expires_at = EXCLUDED.expires_at,
                updated_at = NOW()
            RETURNING {}
            "#,
            TOKEN_COLUMNS
        );
        let item = sqlx::query_as::<_, ApiToken>(&query)
            .bind(user_id)
            .bind(service_name)
            .bind(update.access_token)
            .bind(update.refresh_token)
            .bind(update.expires_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use dotenvy::dotenv;
    use sqlx::postgres::PgPoolOptions;
    use std::env;

    async fn setup_test_db() -> PgStore {
        dotenv().ok();
        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .expect("Failed to create test pool");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        PgStore::new(pool)
    }

    #[tokio::test]
    #[ignore = "needs a PostgreSQL instance in DATABASE_URL"]
    async fn test_token_upsert_keeps_one_row_per_service() {
        let store = setup_test_db().await;
        let user_id = Uuid::new_v4();
        store.ensure_user(user_id).await.unwrap();

        store
            .upsert_token(
                user_id,
                "hh.ru",
                TokenUpdate {
                    access_token: "first".into(),
                    refresh_token: Some("r1".into()),
                    expires_at: Some(Utc::now() + Duration::hours(1)),
                },
            )
            .await
            .unwrap();
        let second = store
            .upsert_token(
                user_id,
                "hh.ru",
                TokenUpdate {
                    access_token: "second".into(),
                    refresh_token: Some("r2".into()),
                    expires_at: None,
                },
            )
            .await
            .unwrap();

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM api_tokens WHERE user_id = $1 AND service_name = $2",
        )
        .bind(user_id)
        .bind("hh.ru")
        .fetch_one(store.pool())
        .await
        .unwrap();

        assert_eq!(count, 1);
        assert_eq!(second.access_token, "second");
        assert_eq!(second.refresh_token.as_deref(), Some("r2"));
        assert!(second.expires_at.is_none());
        assert!(second.updated_at.is_some());
    }

    #[tokio::test]
    #[ignore = "needs a PostgreSQL instance in DATABASE_URL"]
    async fn test_application_status_is_one_way() {
        let store = setup_test_db().await;
        let user_id = Uuid::new_v4();
        store.ensure_user(user_id).await.unwrap();

        let application = store
            .create_application(NewApplication {
                user_id,
                vacancy_id: None,
                cover_letter: Some("Hello".into()),
            })
            .await
            .unwrap();
        assert_eq!(application.status, "pending");

        let sent = store
            .update_application_status(application.id, ApplicationStatus::Sent)
            .await
            .unwrap();
        assert_eq!(sent.status, "sent");

        let err = store
            .update_application_status(application.id, ApplicationStatus::Error)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let missing = store
            .update_application_status(Uuid::new_v4(), ApplicationStatus::Sent)
            .await
            .unwrap_err();
        assert!(matches!(missing, Error::NotFound(_)));
    }

    #[tokio::test]
    #[ignore = "needs a PostgreSQL instance in DATABASE_URL"]
    async fn test_vacancy_save_is_keyed_on_external_id() {
        let store = setup_test_db().await;
        let user_id = Uuid::new_v4();
        store.ensure_user(user_id).await.unwrap();

        let first = store
            .save_vacancy(
                user_id,
                NewVacancy {
                    external_id: "93353083".into(),
                    title: Some("Rust developer".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let second = store
            .save_vacancy(
                user_id,
                NewVacancy {
                    external_id: "93353083".into(),
                    company: Some("Acme".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.title.as_deref(), Some("Rust developer"));
        assert_eq!(second.company.as_deref(), Some("Acme"));
        assert_eq!(store.list_vacancies(user_id, 10).await.unwrap().len(), 1);
    }
}
