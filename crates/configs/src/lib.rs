use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    #[serde(default)]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            worker_threads: Some(4),
            cors_origin: default_cors_origin(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StorageConfig {
    /// Path of the JSON document file holding all user collections.
    #[serde(default)]
    pub path: String,
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

pub fn default_store_path() -> String {
    "data/quiz-coins.json".to_string()
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        // Storage path may come from the environment when the file omits it.
        self.storage.normalize_from_env();
        self.storage.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 {
                self.worker_threads = Some(4);
            }
        } else {
            self.worker_threads = Some(4);
        }
        if self.cors_origin.trim().is_empty() {
            self.cors_origin = std::env::var("CORS_ORIGIN").unwrap_or_else(|_| default_cors_origin());
        }
        Ok(())
    }
}

impl StorageConfig {
    pub fn normalize_from_env(&mut self) {
        // TOML wins; otherwise COIN_STORE_URL, otherwise the fixed default.
        if self.path.trim().is_empty() {
            if let Ok(url) = std::env::var("COIN_STORE_URL") {
                self.path = url;
            }
        }
        if self.path.trim().is_empty() {
            self.path = default_store_path();
        }
    }

    pub fn validate(&self) -> Result<()> {
        let trimmed = self.path.trim();
        if trimmed.is_empty() {
            return Err(anyhow!(
                "storage.path is empty; provide it in config.toml or via COIN_STORE_URL"
            ));
        }
        if trimmed.ends_with('/') || trimmed.ends_with('\\') {
            return Err(anyhow!("storage.path must name a file, not a directory"));
        }
        Ok(())
    }
}
