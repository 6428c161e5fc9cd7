//! LegalEase configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Base URL of Groq's OpenAI-compatible endpoint
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai";

/// Default OpenAI base URL
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Anthropic Messages API base URL
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Main LegalEase configuration
///
/// Passed explicitly into the pipeline at construction; nothing below
/// `main` reads process-wide state for model selection or credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Pipeline defaults
    pub pipeline: PipelineConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Concurrency limits
    pub concurrency: ConcurrencyConfig,

    /// Default log level (CLI --log-level wins)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.llm.max_tokens == 0 {
            return Err(eyre::eyre!("llm.max-tokens must be greater than zero"));
        }
        if self.llm.timeout_ms == 0 {
            return Err(eyre::eyre!("llm.timeout-ms must be greater than zero"));
        }
        if self.concurrency.max_cases == 0 {
            return Err(eyre::eyre!("concurrency.max-cases must be greater than zero"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .legalease.yml
        let local_config = PathBuf::from(".legalease.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/legalease/legalease.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("legalease").join("legalease.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed: a broken config file is reported properly by the
    /// full `load` once logging exists.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => {
                let mut paths = vec![PathBuf::from(".legalease.yml")];
                if let Some(dir) = dirs::config_dir() {
                    paths.push(dir.join("legalease").join("legalease.yml"));
                }
                paths
            }
        };

        candidates
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "openai", "groq", "anthropic" or "offline"
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response (caps every request)
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Per-call timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Force the deterministic offline stand-in
    pub offline: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            max_tokens: 1024,
            timeout_ms: 60_000,
            offline: false,
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            Ok(_) => Err(eyre::eyre!("Environment variable {} is empty", self.api_key_env)),
            Err(_) => Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.api_key_env
            )),
        }
    }

    /// Base URL with the provider's own endpoint substituted when the URL
    /// was left at the OpenAI default
    pub fn effective_base_url(&self) -> String {
        match self.provider.as_str() {
            "groq" if self.base_url == OPENAI_BASE_URL => GROQ_BASE_URL.to_string(),
            "anthropic" if self.base_url == OPENAI_BASE_URL => ANTHROPIC_BASE_URL.to_string(),
            _ => self.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Whether the offline stand-in must be used regardless of credentials
    pub fn wants_offline(&self) -> bool {
        self.offline || self.provider == "offline"
    }
}

/// How the retry loop repairs facts after a failed validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepairStrategy {
    /// Append the fixed `[MISSING_INFO_PLACEHOLDER]` marker
    #[default]
    Marker,

    /// Append the marker plus the validator's missing facts
    MissingFacts,
}

/// Pipeline defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Jurisdiction used when the caller gives none
    pub jurisdiction: String,

    /// Goal used when the caller gives none
    pub goal: String,

    /// Fact repair strategy between retries
    pub repair: RepairStrategy,

    /// Mark cases that exhaust the retry ceiling as needs_review
    #[serde(rename = "flag-exhausted")]
    pub flag_exhausted: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            jurisdiction: "Unknown".to_string(),
            goal: "Request compliance".to_string(),
            repair: RepairStrategy::Marker,
            flag_exhausted: false,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Case journal document
    #[serde(rename = "case-store")]
    pub case_store: PathBuf,

    /// Directory receiving exported case documents
    #[serde(rename = "export-dir")]
    pub export_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/legalease on Linux)
        let case_store = dirs::data_dir()
            .map(|d| d.join("legalease"))
            .unwrap_or_else(|| PathBuf::from(".legalease"))
            .join(casestore::DEFAULT_FILE_NAME);

        Self {
            case_store,
            export_dir: PathBuf::from("outputs"),
        }
    }
}

/// Concurrency limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    /// Maximum cases processed at once in batch mode
    #[serde(rename = "max-cases")]
    pub max_cases: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self { max_cases: 4 }
    }
}
