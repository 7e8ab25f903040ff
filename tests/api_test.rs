use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use placement_portal::{
    middleware::auth::{AuthKeys, Claims},
    models::student::StudentProfile,
    repository::{InMemoryPipelineRepository, InMemoryStudentDirectory},
    routes, AppState,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test_secret_key";

fn app(directory: InMemoryStudentDirectory) -> Router {
    let state = AppState::new(
        Arc::new(InMemoryPipelineRepository::new()),
        Arc::new(directory),
        50,
    );
    routes::router(state, AuthKeys::from_secret(SECRET))
}

fn token(id: Uuid, role: &str) -> String {
    let claims = Claims {
        sub: id.to_string(),
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        role: Some(role.to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("encode token")
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}

fn offer_payload(stages: &[&str]) -> JsonValue {
    json!({
        "title": "Backend Intern",
        "role": "Backend",
        "description": "APIs and queues",
        "location": "Remote",
        "ctc_total": "600000",
        "recruitment_process": stages
            .iter()
            .map(|name| json!({ "stage_name": name }))
            .collect::<Vec<_>>(),
        "application_deadline": (Utc::now() + Duration::days(3)).to_rfc3339(),
    })
}

#[tokio::test]
async fn health_is_public() {
    let app = app(InMemoryStudentDirectory::new());
    let (status, body) = call(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn roles_are_enforced() {
    let app = app(InMemoryStudentDirectory::new());
    let student = token(Uuid::new_v4(), "student");

    let (status, _) = call(&app, "POST", "/api/job-offers", None, Some(offer_payload(&["HR"]))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(
        &app,
        "POST",
        "/api/job-offers",
        Some(&student),
        Some(offer_payload(&["HR"])),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn hiring_flow_over_http() {
    let directory = InMemoryStudentDirectory::new();
    let company = token(Uuid::new_v4(), "company");
    let students: Vec<(Uuid, String)> = ["Anita", "Bharat"]
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let id = Uuid::new_v4();
            directory
                .insert(StudentProfile {
                    id,
                    name: name.to_string(),
                    email: format!("s{}@campus.test", i),
                    department: Some("CSE".into()),
                    cgpa: Some(8.0 + i as f64),
                })
                .expect("seed profile");
            (id, token(id, "student"))
        })
        .collect();
    let app = app(directory);

    let (status, offer) = call(
        &app,
        "POST",
        "/api/job-offers",
        Some(&company),
        Some(offer_payload(&["Coding test", "Interview"])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(offer["total_rounds"], 2);
    let offer_id = offer["id"].as_str().expect("offer id").to_string();

    let (status, listing) = call(&app, "GET", "/api/job-offers", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["total"], 1);

    let mut application_ids = Vec::new();
    for (_, student_token) in &students {
        let (status, application) = call(
            &app,
            "POST",
            &format!("/api/applications/apply/{}", offer_id),
            Some(student_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        application_ids.push(application["id"].as_str().expect("app id").to_string());
    }

    let (status, _) = call(
        &app,
        "POST",
        &format!("/api/applications/apply/{}", offer_id),
        Some(&students[0].1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, check) = call(
        &app,
        "GET",
        &format!("/api/applications/check/{}", offer_id),
        Some(&students[1].1),
        None,
    )
    .await;
    assert_eq!(check["is_applied"], true);

    let (status, view) = call(
        &app,
        "GET",
        &format!(
            "/api/applications/job/{}/round/1?sort_by=cgpa",
            offer_id
        ),
        Some(&company),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["applications"][0]["student"]["name"], "Bharat");
    assert_eq!(view["round_stats"]["in_progress"], 2);

    let (status, _) = call(
        &app,
        "POST",
        &format!("/api/applications/job/{}/advance-round", offer_id),
        Some(&company),
        Some(json!({ "current_round": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, pushed) = call(
        &app,
        "POST",
        &format!("/api/applications/job/{}/push-to-next-round", offer_id),
        Some(&company),
        Some(json!({ "application_ids": [application_ids[0]], "current_round": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pushed["pushed_count"], 1);
    assert_eq!(pushed["is_final_round"], true);

    let (status, advanced) = call(
        &app,
        "POST",
        &format!("/api/applications/job/{}/advance-round", offer_id),
        Some(&company),
        Some(json!({ "current_round": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(advanced["new_round"], 2);
    assert_eq!(advanced["auto_rejected"], 1);

    let (status, done) = call(
        &app,
        "POST",
        &format!("/api/applications/job/{}/complete-hiring", offer_id),
        Some(&company),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["job_offer"]["job_status"], "completed");
    assert_eq!(done["final_stats"]["accepted"], 1);
    assert_eq!(done["final_stats"]["rejected"], 1);

    let (status, mine) = call(
        &app,
        "GET",
        "/api/applications/my-applications",
        Some(&students[0].1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine[0]["application_status"], "accepted");
}

#[tokio::test]
async fn foreign_company_gets_not_found() {
    let app = app(InMemoryStudentDirectory::new());
    let owner = token(Uuid::new_v4(), "company");
    let intruder = token(Uuid::new_v4(), "company");

    let (_, offer) = call(
        &app,
        "POST",
        "/api/job-offers",
        Some(&owner),
        Some(offer_payload(&["Interview"])),
    )
    .await;
    let offer_id = offer["id"].as_str().expect("offer id").to_string();

    let (status, body) = call(
        &app,
        "GET",
        &format!("/api/applications/job/{}/round/1", offer_id),
        Some(&intruder),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn empty_push_is_a_validation_error() {
    let app = app(InMemoryStudentDirectory::new());
    let company = token(Uuid::new_v4(), "company");
    let (_, offer) = call(
        &app,
        "POST",
        "/api/job-offers",
        Some(&company),
        Some(offer_payload(&["Aptitude", "Interview"])),
    )
    .await;
    let offer_id = offer["id"].as_str().expect("offer id").to_string();

    let (status, _) = call(
        &app,
        "POST",
        &format!("/api/applications/job/{}/push-to-next-round", offer_id),
        Some(&company),
        Some(json!({ "application_ids": [], "current_round": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
