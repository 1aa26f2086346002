use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub rules: RuleStoreConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
    pub pipeline: PipelineConfig,
}

/// Text-completion service configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Rule snapshot configuration
#[derive(Debug, Clone)]
pub struct RuleStoreConfig {
    pub backend: RuleBackend,
    pub path: PathBuf,
    pub max_connections: u32,
}

/// Where learned rules are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleBackend {
    /// Pretty-printed JSON array of rule objects.
    Json,
    /// SQLite table, replaced wholesale on every persist.
    Sqlite,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

/// Reasoning pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Upper bound on perspective calls in flight at once (1 = sequential).
    pub perspective_concurrency: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let llm = LlmConfig {
            api_key: env::var("OPENAI_API_KEY").map_err(|_| AppError::Config {
                message: "OPENAI_API_KEY is required".to_string(),
            })?,
            base_url: env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-5".to_string()),
        };

        let backend = match env::var("RULES_BACKEND")
            .unwrap_or_else(|_| "json".to_string())
            .to_lowercase()
            .as_str()
        {
            "json" => RuleBackend::Json,
            "sqlite" => RuleBackend::Sqlite,
            other => {
                return Err(AppError::Config {
                    message: format!("Unknown RULES_BACKEND '{}' (expected json or sqlite)", other),
                })
            }
        };

        let rules = RuleStoreConfig {
            backend,
            path: env::var("RULES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| backend.default_path()),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60000),
            max_retries: env::var("MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            retry_delay_ms: env::var("RETRY_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
        };

        let pipeline = PipelineConfig {
            perspective_concurrency: env::var("PERSPECTIVE_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .map(|n| n.max(1))
                .unwrap_or(5),
        };

        Ok(Config {
            llm,
            rules,
            logging,
            request,
            pipeline,
        })
    }
}

impl RuleBackend {
    /// Snapshot location used when `RULES_PATH` is not set.
    pub fn default_path(&self) -> PathBuf {
        match self {
            RuleBackend::Json => PathBuf::from("learned_rules.json"),
            RuleBackend::Sqlite => PathBuf::from("./data/learned_rules.db"),
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60000,
            max_retries: 2,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            perspective_concurrency: 5,
        }
    }
}
