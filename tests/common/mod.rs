#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

use notes_api::auth::JwtTokenService;
use notes_api::config::AppConfig;
use notes_api::database::models::User;
use notes_api::database::MemoryStore;
use notes_api::state::{AppState, Backend};

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: MemoryStore,
    pub tokens: JwtTokenService,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Insert a user directly into the store and mint a token for them
    pub async fn user(&self, email: &str) -> Result<(User, String)> {
        let user = self.store.insert_user(email, "not-a-real-hash").await;
        let token = self.tokens.issue(user.id)?;
        Ok((user, token))
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.jwt_secret = TEST_SECRET.to_string();
    config.api.enable_request_logging = false;
    config
}

/// Start the router in-process on an unused port, backed by a fresh in-memory store
pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_with(test_config()).await
}

pub async fn spawn_server_with(config: AppConfig) -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let store = MemoryStore::new();
    let tokens = JwtTokenService::from_config(&config.security)?;
    let state = AppState::new(
        &config,
        Arc::new(store.clone()),
        Arc::new(tokens.clone()),
        Backend::Memory,
    );
    let app = notes_api::app(&config, state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let server = TestServer {
        port,
        base_url,
        store,
        tokens,
        client: reqwest::Client::new(),
    };
    server.wait_ready(Duration::from_secs(5)).await?;
    Ok(server)
}
