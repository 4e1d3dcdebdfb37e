//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/springshift/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/springshift/` (~/.config/springshift/)
//! - State/Logs: `$XDG_STATE_HOME/springshift/` (~/.local/state/springshift/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// LLM configuration for analysis and conversion (required to run)
    #[serde(default)]
    pub llm: Option<LlmConfig>,

    /// Pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// LLM provider configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// Provider type
    pub provider: LlmProvider,
    /// Model to use
    pub model: String,
    /// API endpoint (optional, uses default for provider)
    pub endpoint: Option<String>,
    /// API key (can also use env var)
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    /// Upper bound on completion length
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

/// Supported LLM providers
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Ollama,
    Claude,
    OpenAI,
}

impl LlmProvider {
    /// Returns the default endpoint for this provider
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            LlmProvider::Ollama => "http://localhost:11434",
            LlmProvider::Claude => "https://api.anthropic.com",
            LlmProvider::OpenAI => "https://api.openai.com",
        }
    }

    /// Environment variable consulted when no `api_key` is configured
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            LlmProvider::Ollama => None,
            LlmProvider::Claude => Some("ANTHROPIC_API_KEY"),
            LlmProvider::OpenAI => Some("OPENAI_API_KEY"),
        }
    }
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_max_tokens() -> u32 {
    4096
}

/// Discovery, conversion and report settings
#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Suffix a file name must end with to be picked up
    #[serde(default = "default_source_extension")]
    pub source_extension: String,

    /// Extension given to converted artifacts (without the dot)
    #[serde(default = "default_target_extension")]
    pub target_extension: String,

    /// Where artifacts and the report are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Report file name inside `output_dir`
    #[serde(default = "default_report_file")]
    pub report_file: String,

    /// Source text beyond this many characters is cut before prompting
    #[serde(default = "default_max_source_chars")]
    pub max_source_chars: usize,

    /// Glob patterns (relative to the source root) to skip
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_extension: default_source_extension(),
            target_extension: default_target_extension(),
            output_dir: default_output_dir(),
            report_file: default_report_file(),
            max_source_chars: default_max_source_chars(),
            exclude: vec![],
        }
    }
}

impl PipelineConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.source_extension.is_empty() {
            return Err(Error::Config(
                "pipeline.source_extension must not be empty".to_string(),
            ));
        }
        if self.target_extension.is_empty() || self.target_extension.contains('/') {
            return Err(Error::Config(
                "pipeline.target_extension must be a bare extension like \"js\"".to_string(),
            ));
        }
        if self.report_file.is_empty() || Path::new(&self.report_file).components().count() != 1
        {
            return Err(Error::Config(
                "pipeline.report_file must be a plain file name".to_string(),
            ));
        }
        if self.max_source_chars == 0 {
            return Err(Error::Config(
                "pipeline.max_source_chars must be positive".to_string(),
            ));
        }
        for pattern in &self.exclude {
            glob::Pattern::new(pattern).map_err(|e| {
                Error::Config(format!("invalid exclude pattern {:?}: {}", pattern, e))
            })?;
        }
        Ok(())
    }

    /// Full path of the report file
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.report_file)
    }
}

fn default_source_extension() -> String {
    ".java".to_string()
}

fn default_target_extension() -> String {
    "js".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_report_file() -> String {
    "metadata.json".to_string()
}

fn default_max_source_chars() -> usize {
    24_000
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// The `[llm]` section, which a full run cannot do without
    pub fn require_llm(&self) -> Result<&LlmConfig> {
        self.llm.as_ref().ok_or_else(|| {
            Error::Config(format!(
                "an [llm] section is required (looked in {:?})",
                Self::config_path()
            ))
        })
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/springshift/config.toml` (~/.config/springshift/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("springshift").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/springshift/` (~/.local/state/springshift/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("springshift")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/springshift/springshift.log` (~/.local/state/springshift/springshift.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join(crate::logging::LOG_FILE_NAME)
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
