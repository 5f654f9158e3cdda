use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::history::{DEFAULT_HISTORY_KEY_PREFIX, DEFAULT_HISTORY_LIMIT};
use crate::ledger::DEFAULT_PLAN_KEY_PREFIX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("unsupported storage backend: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub server_host: String,
    pub server_port: u16,
    pub data_dir: PathBuf,
    pub storage_backend: StorageBackend,
    pub plan_key_prefix: String,
    pub history_key_prefix: String,
    pub history_limit: usize,
    pub log_level: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 8190,
            data_dir: PathBuf::from("data/ledger"),
            storage_backend: StorageBackend::Sqlite,
            plan_key_prefix: DEFAULT_PLAN_KEY_PREFIX.to_string(),
            history_key_prefix: DEFAULT_HISTORY_KEY_PREFIX.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            log_level: "info".to_string(),
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        if let Ok(host) = env::var("LEDGER_HOST") {
            cfg.server_host = host;
        }
        if let Ok(port) = env::var("LEDGER_PORT") {
            cfg.server_port = port.parse().context("LEDGER_PORT must be a valid u16")?;
        }
        if let Ok(dir) = env::var("LEDGER_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Ok(backend) = env::var("LEDGER_STORAGE") {
            cfg.storage_backend = backend
                .parse()
                .with_context(|| format!("LEDGER_STORAGE is invalid: {backend}"))?;
        }
        if let Ok(prefix) = env::var("LEDGER_KEY_PREFIX") {
            cfg.plan_key_prefix = prefix;
        }
        if let Ok(prefix) = env::var("HISTORY_KEY_PREFIX") {
            cfg.history_key_prefix = prefix;
        }
        if let Ok(limit) = env::var("HISTORY_LIMIT") {
            cfg.history_limit = limit
                .parse()
                .context("HISTORY_LIMIT must be a positive integer")?;
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            cfg.log_level = level;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_backend == StorageBackend::Sqlite {
            ensure_directory(&self.data_dir)?;
        }

        if self.history_limit == 0 {
            anyhow::bail!("HISTORY_LIMIT must be greater than zero");
        }
        if self.plan_key_prefix.is_empty() || self.history_key_prefix.is_empty() {
            anyhow::bail!("storage key prefixes cannot be empty");
        }
        if self.plan_key_prefix == self.history_key_prefix {
            anyhow::bail!("LEDGER_KEY_PREFIX and HISTORY_KEY_PREFIX must differ");
        }

        Ok(())
    }
}

fn ensure_directory(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            anyhow::bail!("{} exists but is not a directory", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("unable to create data directory {}", path.display()))?;
    }
    Ok(())
}
