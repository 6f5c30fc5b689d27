//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by the REST API and the
//! WebSocket endpoint. Services are generic over persistence, verifier, and
//! answer-engine traits, but AppState pins them to the concrete infra
//! implementations.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use lawhelp_core::chat::service::ChatService;
use lawhelp_core::connection::dispatcher::MessageDispatcher;
use lawhelp_core::connection::lifecycle::ConnectionManager;
use lawhelp_core::connection::registry::ConnectionRegistry;
use lawhelp_infra::answer::LegalAnswerEngine;
use lawhelp_infra::answer::corpus::LegalCorpus;
use lawhelp_infra::auth::jwt::JwtVerifier;
use lawhelp_infra::config::{require_answer_api_key, require_jwt_secret};
use lawhelp_infra::sqlite::chat::SqliteChatRepository;
use lawhelp_infra::sqlite::pool::{DatabasePool, database_url_in};
use lawhelp_types::config::ServerConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteChatService = ChatService<SqliteChatRepository>;

pub type ConcreteDispatcher =
    MessageDispatcher<SqliteChatRepository, SqliteChatRepository, Arc<LegalAnswerEngine>>;

pub type ConcreteConnectionManager = ConnectionManager<
    JwtVerifier,
    SqliteChatRepository,
    SqliteChatRepository,
    Arc<LegalAnswerEngine>,
>;

/// Shared application state for the HTTP and WebSocket handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub connections: ConcreteConnectionManager,
    pub answer_engine: Arc<LegalAnswerEngine>,
    pub answer_timeout: Duration,
    pub verifier: Arc<JwtVerifier>,
    pub registry: Arc<ConnectionRegistry>,
}

impl AppState {
    /// Initialize the server state: check secrets, connect to the DB, load the
    /// corpus, wire services.
    ///
    /// Fails when the JWT secret or the answer engine API key is not configured.
    pub async fn init(config: &ServerConfig, data_dir: &Path) -> anyhow::Result<Self> {
        let jwt_secret = require_jwt_secret(config)?;
        let api_key = require_answer_api_key(config)?;
        let verifier = JwtVerifier::new(jwt_secret.clone(), config.auth.leeway_secs)?;

        let db_pool = open_database(config, data_dir).await?;

        let corpus = LegalCorpus::load(
            config.answer.corpus_path.as_deref(),
            &config.answer.corpus_title,
            config.answer.max_corpus_chars,
        )
        .await?;
        let engine = LegalAnswerEngine::new(&config.answer, api_key, corpus);

        Ok(Self::from_parts(config, db_pool, verifier, engine))
    }

    /// Wire services around an already-open pool and constructed collaborators.
    pub fn from_parts(
        config: &ServerConfig,
        db_pool: DatabasePool,
        verifier: JwtVerifier,
        engine: LegalAnswerEngine,
    ) -> Self {
        let repo = SqliteChatRepository::new(db_pool);
        let answer_engine = Arc::new(engine);
        let answer_timeout = Duration::from_secs(config.answer.timeout_secs);
        let verifier = Arc::new(verifier);
        let registry = Arc::new(ConnectionRegistry::new());

        let dispatcher: ConcreteDispatcher =
            MessageDispatcher::new(repo.clone(), repo.clone(), answer_engine.clone())
                .with_answer_timeout(answer_timeout);

        let connections = ConnectionManager::new(
            verifier.clone(),
            Arc::new(dispatcher),
            registry.clone(),
        )
        .with_handshake_timeout(Duration::from_secs(config.auth.handshake_timeout_secs));

        Self {
            chat_service: Arc::new(ChatService::new(repo)),
            connections,
            answer_engine,
            answer_timeout,
            verifier,
            registry,
        }
    }
}

/// Open the configured database, or `{data_dir}/lawhelp.db` when none is set.
pub async fn open_database(config: &ServerConfig, data_dir: &Path) -> anyhow::Result<DatabasePool> {
    let url = config
        .database_url
        .clone()
        .unwrap_or_else(|| database_url_in(data_dir));
    Ok(DatabasePool::new(&url).await?)
}

/// Chat service over the configured database, for CLI commands that need no
/// secrets.
pub async fn open_chat_service(
    config: &ServerConfig,
    data_dir: &Path,
) -> anyhow::Result<ConcreteChatService> {
    let db_pool = open_database(config, data_dir).await?;
    Ok(ChatService::new(SqliteChatRepository::new(db_pool)))
}
