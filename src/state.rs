use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::{JwtError, JwtTokenService, TokenVerifier};
use crate::config::AppConfig;
use crate::database::{DatabaseManager, MemoryStore, NoteStore, PgStore, UserStore};
use crate::services::{NoteService, ProfileService};

/// Shared, immutable per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub notes: NoteService,
    pub profiles: ProfileService,
    pub verifier: Arc<dyn TokenVerifier>,
    pub backend: Backend,
}

/// Which storage engine the services are talking to
#[derive(Clone, Debug)]
pub enum Backend {
    Memory,
    Postgres(PgPool),
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Memory => "memory",
            Backend::Postgres(_) => "postgres",
        }
    }

    pub async fn health_check(&self) -> Result<(), String> {
        match self {
            Backend::Memory => Ok(()),
            Backend::Postgres(pool) => DatabaseManager::health_check(pool)
                .await
                .map_err(|e| e.to_string()),
        }
    }
}

impl AppState {
    pub fn new<S>(
        config: &AppConfig,
        store: Arc<S>,
        verifier: Arc<dyn TokenVerifier>,
        backend: Backend,
    ) -> Self
    where
        S: NoteStore + UserStore + 'static,
    {
        let notes = NoteService::new(store.clone())
            .conceal_foreign_notes(config.security.conceal_foreign_notes);
        let profiles = ProfileService::new(store);
        Self {
            notes,
            profiles,
            verifier,
            backend,
        }
    }

    /// State over an in-memory store, used when no database is configured
    pub fn in_memory(config: &AppConfig, store: MemoryStore) -> Result<Self, JwtError> {
        let verifier = Arc::new(JwtTokenService::from_config(&config.security)?);
        Ok(Self::new(config, Arc::new(store), verifier, Backend::Memory))
    }

    pub fn postgres(config: &AppConfig, store: PgStore) -> Result<Self, JwtError> {
        let verifier = Arc::new(JwtTokenService::from_config(&config.security)?);
        let backend = Backend::Postgres(store.pool().clone());
        Ok(Self::new(config, Arc::new(store), verifier, backend))
    }
}
