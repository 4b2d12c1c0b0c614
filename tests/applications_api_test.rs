mod common;

use applier_backend::database::store::{ApplicationStore, LogStore, VacancyStore};
use applier_backend::models::application::{ApplicationFilter, ApplicationStatus};
use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{bearer_token, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{spawn_app, test_config};

async fn mount_vacancy(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/vacancies/123"))
        .and(bearer_token("hh-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "123",
            "name": "Rust developer",
            "employer": {"name": "Acme"},
            "description": "Build services in Rust",
            "alternate_url": "https://hh.ru/vacancy/123"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn rejected_submission_is_recorded_and_surfaced() {
    let hh = MockServer::start().await;
    mount_vacancy(&hh).await;
    Mock::given(method("POST"))
        .and(path("/negotiations"))
        .and(body_partial_json(json!({"vacancy_id": "123", "resume_id": "r-1"})))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({"errors": [{"type": "negotiations", "value": "limit_exceeded"}]})),
        )
        .expect(1)
        .mount(&hh)
        .await;

    let app = spawn_app(test_config(&hh.uri(), &hh.uri()));
    app.seed_hh_token().await;

    let (status, body) = app
        .post_json(
            "/applications",
            &json!({
                "vacancy_id": "123",
                "resume_id": "r-1",
                "cover_letter": "Hello",
                "send_now": true
            }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("limit_exceeded"));

    let applications = app
        .store
        .list_applications(app.user_id, ApplicationFilter::default())
        .await
        .unwrap();
    assert_eq!(applications.len(), 1);
    assert_eq!(applications[0].status(), Some(ApplicationStatus::Error));

    let logs = app.store.list_logs(app.user_id, 10).await.unwrap();
    assert_eq!(logs[0].action, "application_error");
}

#[tokio::test]
async fn accepted_submission_is_marked_sent() {
    let hh = MockServer::start().await;
    mount_vacancy(&hh).await;
    Mock::given(method("POST"))
        .and(path("/negotiations"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&hh)
        .await;

    let app = spawn_app(test_config(&hh.uri(), &hh.uri()));
    app.seed_hh_token().await;

    let (status, body) = app
        .post_json(
            "/applications",
            &json!({"vacancy_id": "123", "resume_id": "r-1", "cover_letter": "Hello"}),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "sent");
    assert_eq!(body["upstream_response"], json!(null));
    assert_eq!(body["cover_letter"], "Hello");

    let vacancy = app
        .store
        .find_vacancy_by_external_id(app.user_id, "123")
        .await
        .unwrap()
        .expect("vacancy stored on submission");
    assert_eq!(vacancy.company.as_deref(), Some("Acme"));

    let logs = app.store.list_logs(app.user_id, 10).await.unwrap();
    assert_eq!(logs[0].action, "application_sent");

    let id = body["application_id"].as_str().unwrap();
    let (status, fetched) = app.get(&format!("/applications/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["status"], "sent");
}

#[tokio::test]
async fn deferred_submission_stays_pending() {
    let hh = MockServer::start().await;
    mount_vacancy(&hh).await;
    Mock::given(method("POST"))
        .and(path("/negotiations"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&hh)
        .await;

    let app = spawn_app(test_config(&hh.uri(), &hh.uri()));
    app.seed_hh_token().await;

    let (status, body) = app
        .post_json(
            "/applications",
            &json!({"vacancy_id": "123", "cover_letter": "Hello", "send_now": false}),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");

    let (status, list) = app.get("/applications?status=pending").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn sending_without_resume_fails_before_any_write() {
    let hh = MockServer::start().await;
    let app = spawn_app(test_config(&hh.uri(), &hh.uri()));
    app.seed_hh_token().await;

    let (status, _) = app
        .post_json(
            "/applications",
            &json!({"vacancy_id": "123", "cover_letter": "Hello"}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let applications = app
        .store
        .list_applications(app.user_id, ApplicationFilter::default())
        .await
        .unwrap();
    assert!(applications.is_empty());
}

#[tokio::test]
async fn missing_cover_letter_is_generated() {
    let server = MockServer::start().await;
    mount_vacancy(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/oauth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "giga"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .and(bearer_token("giga"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Dear Acme team"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = spawn_app(test_config(&server.uri(), &server.uri()));
    app.seed_hh_token().await;

    let (status, body) = app
        .post_json(
            "/applications",
            &json!({"vacancy_id": "123", "resume_text": "Rust, Tokio", "send_now": false}),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["cover_letter"], "Dear Acme team");
}

#[tokio::test]
async fn other_users_applications_are_not_visible() {
    let hh = MockServer::start().await;
    mount_vacancy(&hh).await;
    let app = spawn_app(test_config(&hh.uri(), &hh.uri()));
    app.seed_hh_token().await;

    let (_, body) = app
        .post_json(
            "/applications",
            &json!({"vacancy_id": "123", "cover_letter": "Hello", "send_now": false}),
        )
        .await;
    let id = body["application_id"].as_str().unwrap().to_string();

    let request = axum::http::Request::builder()
        .uri(format!("/applications/{}", id))
        .header("x-user-id", uuid::Uuid::new_v4().to_string())
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
