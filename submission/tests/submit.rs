use serenity_core::DurationSeconds;
use serenity_core::GenerationStatus;
use serenity_core::ScriptType;
use serenity_core::UserId;
use serenity_core::Visibility;
use serenity_ledger::Ledger;
use serenity_queue::FakeQueue;
use serenity_store::RequestStore;
use serenity_submission::SubmissionError;
use serenity_submission::SubmissionRequest;
use serenity_submission::SubmissionService;
use sqlx::PgPool;
use std::sync::Arc;

async fn seed_user(pool: &PgPool, user_id: UserId, balance: i64) {
    sqlx::query("INSERT INTO users (id, credits_balance, role) VALUES ($1, $2, 'user')")
        .bind(user_id.0)
        .bind(balance)
        .execute(pool)
        .await
        .expect("seed user");
}

fn base_request(user_id: UserId) -> SubmissionRequest {
    SubmissionRequest {
        user_id,
        visual_prompt: "A peaceful mountain scene".to_string(),
        script_type: ScriptType::AiGenerated,
        script_content: None,
        duration_seconds: DurationSeconds::Sixty,
        ambient_sound_id: None,
        music_track_id: None,
        visibility: Visibility::Public,
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn happy_path_reserves_persists_and_enqueues(pool: PgPool) {
    let user_id = UserId::new();
    seed_user(&pool, user_id, 100).await;

    let ledger = Ledger::new(pool.clone());
    let store = RequestStore::new(pool.clone());
    let queue = Arc::new(FakeQueue::new());
    let service = SubmissionService::new(pool.clone(), ledger.clone(), store.clone(), queue.clone());

    let created = service
        .submit(base_request(user_id))
        .await
        .expect("submit should succeed");

    assert_eq!(created.credits_charged, 5);
    assert_eq!(created.status, GenerationStatus::Pending);
    assert_eq!(created.progress, 0);
    assert_eq!(ledger.balance(user_id).await.expect("balance"), 95);

    let job = queue.dequeue().await.expect("dequeue").expect("a job");
    assert_eq!(job.request_id, created.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn private_visibility_adds_surcharge(pool: PgPool) {
    let user_id = UserId::new();
    seed_user(&pool, user_id, 100).await;

    let ledger = Ledger::new(pool.clone());
    let store = RequestStore::new(pool.clone());
    let queue = Arc::new(FakeQueue::new());
    let service = SubmissionService::new(pool.clone(), ledger.clone(), store.clone(), queue.clone());

    let mut request = base_request(user_id);
    request.visibility = Visibility::Private;

    let created = service.submit(request).await.expect("submit should succeed");

    assert_eq!(created.credits_charged, 8);
    assert_eq!(ledger.balance(user_id).await.expect("balance"), 92);
}

#[sqlx::test(migrations = "./migrations")]
async fn insufficient_credits_leaves_no_trace(pool: PgPool) {
    let user_id = UserId::new();
    seed_user(&pool, user_id, 2).await;

    let ledger = Ledger::new(pool.clone());
    let store = RequestStore::new(pool.clone());
    let queue = Arc::new(FakeQueue::new());
    let service = SubmissionService::new(pool.clone(), ledger.clone(), store.clone(), queue.clone());

    let err = service
        .submit(base_request(user_id))
        .await
        .expect_err("should fail");

    assert!(matches!(
        err,
        SubmissionError::InsufficientCredits { required: 5 }
    ));
    assert_eq!(ledger.balance(user_id).await.expect("balance"), 2);
    assert!(queue.dequeue().await.expect("dequeue").is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn validation_failure_does_not_touch_the_ledger(pool: PgPool) {
    let user_id = UserId::new();
    seed_user(&pool, user_id, 100).await;

    let ledger = Ledger::new(pool.clone());
    let store = RequestStore::new(pool.clone());
    let queue = Arc::new(FakeQueue::new());
    let service = SubmissionService::new(pool.clone(), ledger.clone(), store.clone(), queue.clone());

    let mut request = base_request(user_id);
    request.script_type = ScriptType::UserProvided;
    request.script_content = None;

    let err = service.submit(request).await.expect_err("should fail");

    assert!(matches!(err, SubmissionError::Validation(_)));
    assert_eq!(ledger.balance(user_id).await.expect("balance"), 100);
}
