//! Application state and shared resources.

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use std::sync::Arc;

use crate::auth::TokenMinter;
use crate::cache::RedisCodeCache;
use crate::challenge::{EmailCodeIssuer, PictureChallenger};
use crate::config::AppConfig;
use crate::identity::IdentityService;
use crate::ids::SnowflakeGenerator;
use crate::judge::JudgeQueue;
use crate::mailer::LogMailer;
use crate::problems::ProblemService;
use crate::store::{CredentialStore, MemoryStore, ProblemStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Redis connection manager (auto-reconnecting)
    pub redis: ConnectionManager,

    /// Registration / login / account maintenance
    pub identity: Arc<IdentityService>,

    /// Emailed verification codes
    pub email_codes: Arc<EmailCodeIssuer>,

    /// Picture challenges
    pub pictures: Arc<PictureChallenger>,

    /// Problem intake
    pub problems: Arc<ProblemService>,

    /// Judging pipeline, when one is wired in. The registrar ships
    /// without an execution engine.
    pub judge: Option<Arc<dyn JudgeQueue>>,
}

impl AppState {
    /// Create new application state, connecting to Redis
    pub async fn new(config: AppConfig) -> Result<Self> {
        // Connect to Redis with connection manager (handles reconnection)
        let client = redis::Client::open(config.redis_url.as_str())
            .context("Failed to create Redis client")?;

        let redis = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;

        // The relational backend is an external collaborator; the
        // in-memory adapter stands in behind the same contract.
        let store = Arc::new(MemoryStore::new());
        let credentials: Arc<dyn CredentialStore> = store.clone();
        let problems_store: Arc<dyn ProblemStore> = store;

        let email_cache = Arc::new(RedisCodeCache::new(
            redis.clone(),
            config.challenges.email_code_ttl_secs,
        ));
        let picture_cache = Arc::new(RedisCodeCache::new(
            redis.clone(),
            config.challenges.picture_code_ttl_secs,
        ));

        let ids = Arc::new(SnowflakeGenerator::new(config.node_id)?);
        let tokens = Arc::new(TokenMinter::new(
            &config.auth.token_secret,
            config.auth.token_ttl_secs,
        ));

        let identity = Arc::new(IdentityService::new(
            credentials,
            email_cache.clone(),
            ids,
            tokens,
            config.auth.bcrypt_cost,
        ));
        let email_codes = Arc::new(EmailCodeIssuer::new(email_cache, Arc::new(LogMailer)));
        let pictures = Arc::new(PictureChallenger::new(picture_cache));
        let problems = Arc::new(ProblemService::new(problems_store));

        Ok(Self {
            config,
            redis,
            identity,
            email_codes,
            pictures,
            problems,
            judge: None,
        })
    }
}
