//! Configuration loading, validation, and management for kgrag.
//!
//! Loads configuration from `~/.kgrag/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.kgrag/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default generation provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model, also used to pick the token-estimation profile
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per generation response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Deadline applied to every outbound generation call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Query pipeline settings
    #[serde(default)]
    pub query: QueryConfig,

    /// Token budget settings
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Knowledge graph source settings
    #[serde(default)]
    pub graph: GraphConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo-0125".into()
}
fn default_temperature() -> f32 {
    0.0
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_request_timeout_secs() -> u64 {
    120
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("query", &self.query)
            .field("budget", &self.budget)
            .field("graph", &self.graph)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Which evidence-shaping strategy answers a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// Seed → 1-hop cross-set edges → materialized relations → tiered truncation.
    #[default]
    CrossSet,
    /// Seed → paths + neighbours → rerank → normalize → reasoning step.
    PathRerank,
}

/// How seed entities are derived from the query text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedMode {
    /// Grow a similarity lookup until `top_k_entity` distinct entities are found.
    #[default]
    Similarity,
    /// Ask the generator for entity mentions, then link each to the graph.
    Extracted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub mode: QueryMode,

    #[serde(default)]
    pub seed_mode: SeedMode,

    /// Target number of seed entities
    #[serde(default = "default_top_k_entity")]
    pub top_k_entity: usize,

    /// Path cutoff (hops) for the path-rerank strategy
    #[serde(default = "default_k_hop")]
    pub k_hop: usize,

    /// Upper bound on similarity lookup rounds while seeding
    #[serde(default = "default_max_seed_rounds")]
    pub max_seed_rounds: usize,
}

fn default_top_k_entity() -> usize {
    5
}
fn default_k_hop() -> usize {
    2
}
fn default_max_seed_rounds() -> usize {
    8
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            mode: QueryMode::default(),
            seed_mode: SeedMode::default(),
            top_k_entity: default_top_k_entity(),
            k_hop: default_k_hop(),
            max_seed_rounds: default_max_seed_rounds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Hard upper bound on the estimated tokens of any prompt context
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,

    /// Candidates kept before a rerank prompt is budgeted
    #[serde(default = "default_rerank_candidate_cap")]
    pub rerank_candidate_cap: usize,

    /// Fraction of text kept by each ratio-shrink step
    #[serde(default = "default_shrink_ratio")]
    pub shrink_ratio: f64,

    /// Separator between relation labels packed into one field
    #[serde(default = "default_relation_separator")]
    pub relation_separator: String,
}

fn default_max_context_tokens() -> usize {
    30_000
}
fn default_rerank_candidate_cap() -> usize {
    300
}
fn default_shrink_ratio() -> f64 {
    0.9
}
fn default_relation_separator() -> String {
    "<SEP>".into()
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_context_tokens: default_max_context_tokens(),
            rerank_candidate_cap: default_rerank_candidate_cap(),
            shrink_ratio: default_shrink_ratio(),
            relation_separator: default_relation_separator(),
        }
    }
}

/// Which entity index backs seed lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityIndexKind {
    /// Token-overlap scoring over entity names; needs no embedding endpoint.
    #[default]
    Keyword,
    /// Cosine similarity over provider embeddings.
    Vector,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Triple file (`source\trelation\target[\tdate]` per line)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triples_path: Option<PathBuf>,

    #[serde(default)]
    pub entity_index: EntityIndexKind,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Upper bound on paths enumerated per query
    #[serde(default = "default_path_limit")]
    pub path_limit: usize,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_path_limit() -> usize {
    10_000
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            triples_path: None,
            entity_index: EntityIndexKind::default(),
            embedding_model: default_embedding_model(),
            path_limit: default_path_limit(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.kgrag/config.toml).
    ///
    /// Also checks environment variables:
    /// - `KGRAG_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `KGRAG_PROVIDER`, `KGRAG_MODEL`, `KGRAG_GRAPH`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var("KGRAG_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("KGRAG_PROVIDER") {
            self.default_provider = provider;
        }

        if let Ok(model) = std::env::var("KGRAG_MODEL") {
            self.default_model = model;
        }

        if let Ok(graph) = std::env::var("KGRAG_GRAPH") {
            self.graph.triples_path = Some(PathBuf::from(graph));
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".kgrag")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.query.top_k_entity == 0 {
            return Err(ConfigError::ValidationError(
                "query.top_k_entity must be > 0".into(),
            ));
        }

        if self.query.max_seed_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "query.max_seed_rounds must be > 0".into(),
            ));
        }

        if self.budget.max_context_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "budget.max_context_tokens must be > 0".into(),
            ));
        }

        if !(self.budget.shrink_ratio > 0.0 && self.budget.shrink_ratio < 1.0) {
            return Err(ConfigError::ValidationError(
                "budget.shrink_ratio must be in (0.0, 1.0)".into(),
            ));
        }

        if self.budget.relation_separator.is_empty() {
            return Err(ConfigError::ValidationError(
                "budget.relation_separator must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some() || self.providers.values().any(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for the `config init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            query: QueryConfig::default(),
            budget: BudgetConfig::default(),
            graph: GraphConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.default_model, "gpt-3.5-turbo-0125");
        assert_eq!(config.budget.max_context_tokens, 30_000);
        assert_eq!(config.budget.rerank_candidate_cap, 300);
        assert_eq!(config.budget.relation_separator, "<SEP>");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.query.mode, config.query.mode);
        assert_eq!(parsed.budget.max_context_tokens, config.budget.max_context_tokens);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn shrink_ratio_must_be_fractional() {
        let mut config = AppConfig::default();
        config.budget.shrink_ratio = 1.0;
        assert!(config.validate().is_err());
        config.budget.shrink_ratio = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_seed_target_rejected() {
        let mut config = AppConfig::default();
        config.query.top_k_entity = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("top_k_entity"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().default_provider, "openai");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default_model = "gpt-4o"

[query]
mode = "path_rerank"
seed_mode = "extracted"
k_hop = 3

[graph]
triples_path = "/data/train.txt"
entity_index = "vector"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.query.mode, QueryMode::PathRerank);
        assert_eq!(config.query.seed_mode, SeedMode::Extracted);
        assert_eq!(config.query.k_hop, 3);
        assert_eq!(config.query.top_k_entity, 5);
        assert_eq!(config.graph.entity_index, EntityIndexKind::Vector);
        assert_eq!(
            config.graph.triples_path.as_deref(),
            Some(Path::new("/data/train.txt"))
        );
        assert_eq!(config.budget.shrink_ratio, 0.9);
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "query = [").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-3.5-turbo-0125"));
        assert!(toml_str.contains("cross_set"));
    }
}
