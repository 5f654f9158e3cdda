use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use rand::Rng;
use reqwest::{Client, Response};
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

use zexpander_quota_ledger::{
    create_router, ApiState, LedgerConfig, StorageBackend, USER_ID_HEADER,
};

struct RunningService {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Serves the ledger API on an ephemeral port over a SQLite store in a
/// temporary directory.
pub struct TestHarness {
    temp_dir: TempDir,
    base_url: String,
    http_client: Client,
    service: Option<RunningService>,
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        init_tracing();
        let temp_dir = TempDir::new().context("creating harness tempdir")?;
        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("building reqwest client")?;

        let mut harness = Self {
            temp_dir,
            base_url: String::new(),
            http_client,
            service: None,
        };
        harness.start().await?;
        Ok(harness)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.temp_dir.path().join("ledger")
    }

    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn start(&mut self) -> Result<()> {
        if self.service.is_some() {
            return Ok(());
        }

        let config = LedgerConfig {
            server_port: 0,
            data_dir: self.data_dir(),
            storage_backend: StorageBackend::Sqlite,
            ..LedgerConfig::default()
        };
        config.validate()?;

        let state = Arc::new(ApiState::from_config(config)?);
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("binding ledger listener")?;
        let addr = listener.local_addr()?;
        self.base_url = format!("http://{addr}");

        let (shutdown, shutdown_rx) = oneshot::channel();
        let router = create_router(state);
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
        });
        self.service = Some(RunningService { shutdown, task });

        self.wait_for_service_health(Duration::from_secs(10)).await
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(service) = self.service.take() {
            let _ = service.shutdown.send(());
            service
                .task
                .await
                .map_err(|err| anyhow!("ledger server task failed: {err}"))?;
        }
        Ok(())
    }

    pub async fn restart(&mut self) -> Result<()> {
        self.stop().await?;
        self.start().await
    }

    pub async fn wait_for_service_health(&self, timeout: Duration) -> Result<()> {
        let url = self.url("/health");
        let start = Instant::now();
        while start.elapsed() < timeout {
            match self.http_client.get(&url).send().await {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) => {
                    debug!("health check for {url} returned {}", response.status());
                }
                Err(err) => {
                    debug!("health check for {url} failed: {err}");
                }
            }
            sleep(Duration::from_millis(50)).await;
        }
        Err(anyhow!("ledger service did not become healthy at {url}"))
    }

    pub async fn get(&self, user_id: &str, path: &str) -> Result<Response> {
        Ok(self
            .http_client
            .get(self.url(path))
            .header(USER_ID_HEADER, user_id)
            .send()
            .await?)
    }

    pub async fn post(&self, user_id: &str, path: &str, body: &Value) -> Result<Response> {
        Ok(self
            .http_client
            .post(self.url(path))
            .header(USER_ID_HEADER, user_id)
            .json(body)
            .send()
            .await?)
    }

    pub async fn delete(&self, user_id: &str, path: &str) -> Result<Response> {
        Ok(self
            .http_client
            .delete(self.url(path))
            .header(USER_ID_HEADER, user_id)
            .send()
            .await?)
    }

    pub async fn get_json(&self, user_id: &str, path: &str) -> Result<Value> {
        let response = self.get(user_id, path).await?;
        Ok(response.error_for_status()?.json().await?)
    }

    pub async fn post_json(&self, user_id: &str, path: &str, body: &Value) -> Result<Value> {
        let response = self.post(user_id, path, body).await?;
        Ok(response.error_for_status()?.json().await?)
    }
}

pub fn random_user_id(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    format!("{}-{}", prefix, rng.gen::<u32>())
}

pub fn history_entry(original: &str) -> Value {
    serde_json::json!({
        "original": original,
        "expanded": format!("{original}, expanded with more detail."),
        "model": "googleai/gemini-2.0-flash",
        "type": "text-toolkit"
    })
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
