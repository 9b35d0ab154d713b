use serenity_compose::FakeComposer;
use serenity_core::DurationSeconds;
use serenity_core::GenerationStatus;
use serenity_core::NewGenerationRequest;
use serenity_core::ScriptType;
use serenity_core::UserId;
use serenity_core::Visibility;
use serenity_providers::FakeScriptProvider;
use serenity_providers::FakeVideoProvider;
use serenity_providers::FakeVoiceProvider;
use serenity_providers::ProviderError;
use serenity_providers::VideoPoll;
use serenity_storage::FakeStore;
use serenity_store::RequestStore;
use serenity_worker::PipelineWorker;
use serenity_worker::WorkerError;
use sqlx::PgPool;
use std::sync::Arc;

fn new_request(user_id: UserId) -> NewGenerationRequest {
    NewGenerationRequest {
        user_id,
        visual_prompt: "a calm tide pool at dawn".to_string(),
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
async fn happy_path_completes_and_publishes_a_video(pool: PgPool) {
    let store = RequestStore::new(pool);
    let user_id = UserId::new();
    let request = store.create(new_request(user_id)).await.expect("create");

    let object_store = Arc::new(FakeStore::new());
    let worker = PipelineWorker::new(
        store.clone(),
        Arc::new(FakeScriptProvider::succeeding("breathe in, breathe out")),
        Arc::new(FakeVoiceProvider::succeeding(b"voice-bytes".to_vec())),
        Arc::new(FakeVideoProvider::new(
            vec![VideoPoll::Completed {
                download_uri: "https://example.test/video.mp4".to_string(),
            }],
            b"video-bytes".to_vec(),
        )),
        object_store.clone(),
        Arc::new(FakeComposer::new()),
    );

    worker.run_once(request.id).await.expect("run_once");

    let completed = store.get(request.id).await.expect("get").expect("present");
    assert_eq!(completed.status, GenerationStatus::Completed);
    assert_eq!(completed.progress, 100);
    assert!(completed.video_id.is_some());
    assert!(completed.script_content.is_some());

    let final_key = serenity_storage::keys::final_video(&request.id.to_string());
    assert!(object_store.get_bytes(&final_key).await.is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn rerunning_a_completed_request_is_a_no_op(pool: PgPool) {
    let store = RequestStore::new(pool);
    let user_id = UserId::new();
    let request = store.create(new_request(user_id)).await.expect("create");

    let worker = PipelineWorker::new(
        store.clone(),
        Arc::new(FakeScriptProvider::succeeding("script")),
        Arc::new(FakeVoiceProvider::succeeding(b"voice".to_vec())),
        Arc::new(FakeVideoProvider::new(
            vec![VideoPoll::Completed {
                download_uri: "https://example.test/video.mp4".to_string(),
            }],
            b"video".to_vec(),
        )),
        Arc::new(FakeStore::new()),
        Arc::new(FakeComposer::new()),
    );
    worker.run_once(request.id).await.expect("first run");

    // A retried delivery after the job already finished must be idempotent.
    worker.run_once(request.id).await.expect("second run is a no-op");
}

#[sqlx::test(migrations = "./migrations")]
async fn video_polling_times_out_after_max_polls(pool: PgPool) {
    let store = RequestStore::new(pool);
    let user_id = UserId::new();
    let request = store.create(new_request(user_id)).await.expect("create");

    let worker = PipelineWorker::new(
        store.clone(),
        Arc::new(FakeScriptProvider::succeeding("script")),
        Arc::new(FakeVoiceProvider::succeeding(b"voice".to_vec())),
        Arc::new(FakeVideoProvider::always_processing()),
        Arc::new(FakeStore::new()),
        Arc::new(FakeComposer::new()),
    );

    let err = worker.run_once(request.id).await.expect_err("should time out");
    assert!(matches!(err, WorkerError::Timeout(_)));

    let after = store.get(request.id).await.expect("get").expect("present");
    assert_eq!(after.status, GenerationStatus::GeneratingVideo);
    assert_ne!(after.status, GenerationStatus::Completed);
}

#[sqlx::test(migrations = "./migrations")]
async fn permanent_video_failure_surfaces_as_a_provider_error(pool: PgPool) {
    let store = RequestStore::new(pool);
    let user_id = UserId::new();
    let request = store.create(new_request(user_id)).await.expect("create");

    let worker = PipelineWorker::new(
        store.clone(),
        Arc::new(FakeScriptProvider::succeeding("script")),
        Arc::new(FakeVoiceProvider::succeeding(b"voice".to_vec())),
        Arc::new(FakeVideoProvider::new(
            vec![VideoPoll::Failed {
                error: "content policy violation".to_string(),
            }],
            Vec::new(),
        )),
        Arc::new(FakeStore::new()),
        Arc::new(FakeComposer::new()),
    );

    let err = worker.run_once(request.id).await.expect_err("should fail");
    match err {
        WorkerError::Provider(provider_err) => assert!(!provider_err.is_transient()),
        other => panic!("expected a provider error, got {other:?}"),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn script_provider_failure_leaves_request_non_terminal(pool: PgPool) {
    let store = RequestStore::new(pool);
    let user_id = UserId::new();
    let request = store.create(new_request(user_id)).await.expect("create");

    let worker = PipelineWorker::new(
        store.clone(),
        Arc::new(FakeScriptProvider::failing(ProviderError::transient(
            "upstream 503",
        ))),
        Arc::new(FakeVoiceProvider::succeeding(b"voice".to_vec())),
        Arc::new(FakeVideoProvider::new(
            vec![VideoPoll::Completed {
                download_uri: "https://example.test/video.mp4".to_string(),
            }],
            b"video".to_vec(),
        )),
        Arc::new(FakeStore::new()),
        Arc::new(FakeComposer::new()),
    );

    let err = worker.run_once(request.id).await.expect_err("should fail");
    assert!(err.is_transient());

    let after = store.get(request.id).await.expect("get").expect("present");
    assert!(!after.status.is_terminal());
    assert_eq!(after.progress, 5);
}

#[sqlx::test(migrations = "./migrations")]
async fn progress_never_regresses_across_the_run(pool: PgPool) {
    let store = RequestStore::new(pool);
    let user_id = UserId::new();
    let request = store.create(new_request(user_id)).await.expect("create");

    let worker = PipelineWorker::new(
        store.clone(),
        Arc::new(FakeScriptProvider::succeeding("script")),
        Arc::new(FakeVoiceProvider::succeeding(b"voice".to_vec())),
        Arc::new(FakeVideoProvider::new(
            vec![
                VideoPoll::Processing,
                VideoPoll::Completed {
                    download_uri: "https://example.test/video.mp4".to_string(),
                },
            ],
            b"video".to_vec(),
        )),
        Arc::new(FakeStore::new()),
        Arc::new(FakeComposer::new()),
    );

    worker.run_once(request.id).await.expect("run_once");
    let completed = store.get(request.id).await.expect("get").expect("present");
    assert_eq!(completed.progress, 100);
}
