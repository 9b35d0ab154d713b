use serenity_core::DurationSeconds;
use serenity_core::GenerationStatus;
use serenity_core::NewGenerationRequest;
use serenity_core::ScriptType;
use serenity_core::UserId;
use serenity_core::Visibility;
use serenity_store::RequestStore;
use sqlx::PgPool;

fn sample(user_id: UserId) -> NewGenerationRequest {
    NewGenerationRequest {
        user_id,
        visual_prompt: "A peaceful mountain scene".to_string(),
        script_type: ScriptType::AiGenerated,
        script_content: None,
        duration_seconds: DurationSeconds::Sixty,
        ambient_sound_id: None,
        music_track_id: None,
        visibility: Visibility::Public,
        credits_charged: 5,
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn create_then_get_round_trips(pool: PgPool) {
    let store = RequestStore::new(pool);
    let user_id = UserId::new();
    let created = store.create(sample(user_id)).await.expect("create");

    assert_eq!(created.status, GenerationStatus::Pending);
    assert_eq!(created.progress, 0);
    assert_eq!(created.credits_charged, 5);

    let fetched = store
        .get(created.id)
        .await
        .expect("get")
        .expect("request exists");
    assert_eq!(fetched, created);
}

#[sqlx::test(migrations = "./migrations")]
async fn get_owned_hides_other_users_requests(pool: PgPool) {
    let store = RequestStore::new(pool);
    let owner = UserId::new();
    let stranger = UserId::new();
    let created = store.create(sample(owner)).await.expect("create");

    assert!(store
        .get_owned(created.id, stranger)
        .await
        .expect("query")
        .is_none());
    assert!(store
        .get_owned(created.id, owner)
        .await
        .expect("query")
        .is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn progress_update_never_regresses(pool: PgPool) {
    let store = RequestStore::new(pool);
    let user_id = UserId::new();
    let created = store.create(sample(user_id)).await.expect("create");

    store
        .update_progress(created.id, GenerationStatus::GeneratingVoice, 35)
        .await
        .expect("advance progress");
    store
        .update_progress(created.id, GenerationStatus::GeneratingScript, 10)
        .await
        .expect("regressing update is a no-op, not an error");

    let fetched = store.get(created.id).await.expect("get").expect("exists");
    assert_eq!(fetched.progress, 35);
    assert_eq!(fetched.status, GenerationStatus::GeneratingVoice);
}

#[sqlx::test(migrations = "./migrations")]
async fn list_for_user_paginates(pool: PgPool) {
    let store = RequestStore::new(pool);
    let user_id = UserId::new();
    for _ in 0..3 {
        store.create(sample(user_id)).await.expect("create");
    }

    let page = store.list_for_user(user_id, 1, 2).await.expect("list");
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 3);

    let page2 = store.list_for_user(user_id, 2, 2).await.expect("list");
    assert_eq!(page2.items.len(), 1);
}
