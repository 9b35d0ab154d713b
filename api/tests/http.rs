use axum::body::Body;
use axum::body::to_bytes;
use axum::http::Request;
use axum::http::StatusCode;
use serenity_api::AppState;
use serenity_core::UserId;
use serenity_ledger::Ledger;
use serenity_queue::FakeQueue;
use serenity_store::RequestStore;
use serenity_submission::SubmissionService;
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceExt;

async fn seed_user(pool: &PgPool, user_id: UserId, balance: i64) {
    sqlx::query("INSERT INTO users (id, credits_balance, role) VALUES ($1, $2, 'user')")
        .bind(user_id.0)
        .bind(balance)
        .execute(pool)
        .await
        .expect("seed user");
}

fn build_state(pool: PgPool) -> AppState {
    let ledger = Ledger::new(pool.clone());
    let store = RequestStore::new(pool.clone());
    let queue = Arc::new(FakeQueue::new());
    let submission = Arc::new(SubmissionService::new(pool, ledger, store.clone(), queue));
    AppState::new(submission, store)
}

fn bearer(user_id: UserId) -> String {
    format!("Bearer {}", user_id.0)
}

#[sqlx::test(migrations = "./migrations")]
async fn submit_without_auth_is_unauthorized(pool: PgPool) {
    let app = serenity_api::router(build_state(pool));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/generations")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "visualPrompt": "A calm lake",
                        "scriptType": "ai_generated",
                        "durationSeconds": 60
                    })
                    .to_string(),
                ))
                .expect("build request"),
        )
        .await
        .expect("call router");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn submit_happy_path_returns_201_with_charged_credits(pool: PgPool) {
    let user_id = UserId::new();
    seed_user(&pool, user_id, 100).await;
    let app = serenity_api::router(build_state(pool));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/generations")
                .header("content-type", "application/json")
                .header("authorization", bearer(user_id))
                .body(Body::from(
                    serde_json::json!({
                        "visualPrompt": "A peaceful mountain scene",
                        "scriptType": "ai_generated",
                        "durationSeconds": 60
                    })
                    .to_string(),
                ))
                .expect("build request"),
        )
        .await
        .expect("call router");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(json["creditsCharged"], 5);
    assert_eq!(json["status"], "pending");
}

#[sqlx::test(migrations = "./migrations")]
async fn submit_with_insufficient_credits_returns_402(pool: PgPool) {
    let user_id = UserId::new();
    seed_user(&pool, user_id, 0).await;
    let app = serenity_api::router(build_state(pool));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/generations")
                .header("content-type", "application/json")
                .header("authorization", bearer(user_id))
                .body(Body::from(
                    serde_json::json!({
                        "visualPrompt": "A peaceful mountain scene",
                        "scriptType": "ai_generated",
                        "durationSeconds": 60
                    })
                    .to_string(),
                ))
                .expect("build request"),
        )
        .await
        .expect("call router");

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(json["required"], 5);
}

#[sqlx::test(migrations = "./migrations")]
async fn submit_with_invalid_duration_returns_400(pool: PgPool) {
    let user_id = UserId::new();
    seed_user(&pool, user_id, 100).await;
    let app = serenity_api::router(build_state(pool));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/generations")
                .header("content-type", "application/json")
                .header("authorization", bearer(user_id))
                .body(Body::from(
                    serde_json::json!({
                        "visualPrompt": "A peaceful mountain scene",
                        "scriptType": "ai_generated",
                        "durationSeconds": 90
                    })
                    .to_string(),
                ))
                .expect("build request"),
        )
        .await
        .expect("call router");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn progress_for_another_users_request_is_404(pool: PgPool) {
    let owner = UserId::new();
    let stranger = UserId::new();
    seed_user(&pool, owner, 100).await;
    seed_user(&pool, stranger, 100).await;
    let state = build_state(pool);
    let created = state
        .submission
        .submit(serenity_submission::SubmissionRequest {
            user_id: owner,
            visual_prompt: "A peaceful mountain scene".to_string(),
            script_type: serenity_core::ScriptType::AiGenerated,
            script_content: None,
            duration_seconds: serenity_core::DurationSeconds::Sixty,
            ambient_sound_id: None,
            music_track_id: None,
            visibility: serenity_core::Visibility::Public,
        })
        .await
        .expect("submit");

    let app = serenity_api::router(state);
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/generations/{}/progress", created.id))
                .header("authorization", bearer(stranger))
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("call router");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn healthz_is_ok(pool: PgPool) {
    let app = serenity_api::router(build_state(pool));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("call router");
    assert_eq!(response.status(), StatusCode::OK);
}
