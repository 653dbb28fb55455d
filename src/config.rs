//! Configuration types for seedfind.
//!
//! [`AppConfig`] is a TOML document. Every section is optional and falls
//! back to its defaults, so an empty file is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use seedfind_search::{SearchConfig, SourceDescriptor, builtin_sources};

use crate::error::{Result, ServiceError};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Retrieval and ranking settings.
    pub search: SearchConfig,
    /// Result cache and history database.
    pub cache: CacheConfig,
    /// Query expansion provider.
    pub ai: AiConfig,
    /// Replaces the built-in source catalog when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceDescriptor>>,
}

/// Cache lifetime, bound and location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a cached result list stays valid.
    pub ttl_seconds: u64,
    /// Live-entry bound; the oldest entries are evicted beyond it.
    pub max_entries: usize,
    /// SQLite database path. Defaults to the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: seedfind_search::cache::DEFAULT_TTL_SECONDS,
            max_entries: seedfind_search::cache::DEFAULT_MAX_ENTRIES,
            db_path: None,
        }
    }
}

impl CacheConfig {
    /// The configured path, or `<data dir>/seedfind/cache.db`.
    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(default_db_path)
    }
}

/// Default database location under the platform data directory.
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("seedfind")
        .join("cache.db")
}

/// OpenAI-compatible chat-completions provider used for query expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Master switch. Even when on, expansion needs the API key variable set.
    pub enabled: bool,
    /// Provider base URL, without the `/v1/...` path.
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the bearer token.
    pub api_key_env: String,
    pub timeout_seconds: u64,
    /// Maximum number of query variants, original included.
    pub max_variants: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.openai.com".into(),
            model: "gpt-4o-mini".into(),
            api_key_env: "OPENAI_API_KEY".into(),
            timeout_seconds: 30,
            max_variants: 3,
        }
    }
}

impl AiConfig {
    /// The API key from the configured environment variable, if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ServiceError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ServiceError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The configured catalog, or the built-in one.
    pub fn sources(&self) -> Vec<SourceDescriptor> {
        self.sources.clone().unwrap_or_else(builtin_sources)
    }

    /// Checks every section for invalid values.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.search
            .validate()
            .map_err(|e| ServiceError::Config(e.to_string()))?;

        if self.cache.ttl_seconds == 0 {
            return Err(ServiceError::Config("cache.ttl_seconds must be greater than 0".into()));
        }
        if self.cache.max_entries == 0 {
            return Err(ServiceError::Config("cache.max_entries must be greater than 0".into()));
        }
        if self.ai.max_variants == 0 {
            return Err(ServiceError::Config("ai.max_variants must be greater than 0".into()));
        }
        if self.ai.enabled {
            url::Url::parse(&self.ai.base_url)
                .map_err(|e| ServiceError::Config(format!("ai.base_url is invalid: {e}")))?;
        }

        let sources = self.sources();
        for source in &sources {
            source
                .validate()
                .map_err(|e| ServiceError::Config(e.to_string()))?;
        }
        let mut ids: Vec<&str> = sources.iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        if ids.windows(2).any(|w| w[0] == w[1]) {
            return Err(ServiceError::Config("source ids must be unique".into()));
        }
        Ok(())
    }
}
