//! Wires concrete adapters (Postgres, Redis, S3, the three HTTP providers,
//! ffmpeg) behind the ports each crate defines, the way a teacher's binary
//! crate composes library crates at `main` rather than each library reaching
//! for a global singleton (SPEC_FULL §A "Global singletons → constructor-
//! wired collaborators").

use serenity_compose::FfmpegComposer;
use serenity_compose::MediaComposer;
use serenity_config::Config;
use serenity_ledger::Ledger;
use serenity_providers::HttpScriptProvider;
use serenity_providers::HttpVideoProvider;
use serenity_providers::HttpVoiceProvider;
use serenity_providers::ScriptPort;
use serenity_providers::VideoPort;
use serenity_providers::VoicePort;
use serenity_queue::JobQueue;
use serenity_queue::RedisQueue;
use serenity_storage::ObjectStore;
use serenity_storage::S3Store;
use serenity_store::RequestStore;
use serenity_submission::SubmissionService;
use serenity_worker::PipelineWorker;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

pub struct Bootstrap {
    pub config: Config,
    pool: sqlx::PgPool,
    ledger: Ledger,
    pub store: RequestStore,
    pub queue: Arc<dyn JobQueue>,
    object_store: Arc<dyn ObjectStore>,
    script: Arc<dyn ScriptPort>,
    voice: Arc<dyn VoicePort>,
    video: Arc<dyn VideoPort>,
    composer: Arc<dyn MediaComposer>,
}

impl Bootstrap {
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        let queue: Arc<dyn JobQueue> = Arc::new(RedisQueue::connect(&config.redis_url).await?);
        let object_store: Arc<dyn ObjectStore> =
            Arc::new(S3Store::connect(&config.s3_bucket, config.s3_endpoint.as_deref()).await);

        let script: Arc<dyn ScriptPort> = Arc::new(HttpScriptProvider::new(
            config.script_provider_base_url.clone(),
            config.script_provider_api_key.clone(),
        )?);
        let voice: Arc<dyn VoicePort> = Arc::new(HttpVoiceProvider::new(
            config.voice_provider_base_url.clone(),
            config.voice_provider_api_key.clone(),
        )?);
        let video: Arc<dyn VideoPort> = Arc::new(HttpVideoProvider::new(
            config.video_provider_base_url.clone(),
            config.video_provider_api_key.clone(),
        )?);

        Ok(Self {
            config: config.clone(),
            ledger: Ledger::new(pool.clone()),
            store: RequestStore::new(pool.clone()),
            pool,
            queue,
            object_store,
            script,
            voice,
            video,
            composer: Arc::new(FfmpegComposer::default()),
        })
    }

    pub fn submission(&self) -> Arc<SubmissionService> {
        Arc::new(SubmissionService::new(
            self.pool.clone(),
            self.ledger.clone(),
            self.store.clone(),
            self.queue.clone(),
        ))
    }

    pub fn pipeline_worker(&self) -> PipelineWorker {
        PipelineWorker::new(
            self.store.clone(),
            self.script.clone(),
            self.voice.clone(),
            self.video.clone(),
            self.object_store.clone(),
            self.composer.clone(),
        )
    }
}
