use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_MODEL: &str = "llama3-8b-8192";
const DEFAULT_GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const HISTORY_FILE: &str = "history.json";

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// A required variable is not set (or is empty).
    Missing(&'static str),
    /// A variable is set but cannot be parsed.
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(var) => write!(f, "missing required environment variable {var}"),
            Self::Invalid { var, value, reason } => {
                write!(f, "invalid value '{value}' for {var}: {reason}")
            }
            Self::Validation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    pub telegram_token: String,
    pub groq_api_key: String,
    /// Public base URL, without the `/webhook` suffix.
    pub webhook_url: String,
    /// Telegram user allowed to run statistics/history commands.
    pub admin_id: i64,
    pub host: String,
    pub port: u16,
    /// Directory for state files (history, logs).
    pub data_dir: PathBuf,
    pub groq_model: String,
    pub groq_url: String,
    pub completion_timeout: Duration,
    /// Shared secret Telegram echoes back in every webhook request.
    pub webhook_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the config through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let telegram_token = get("TELEGRAM_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_TOKEN"))?;
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = telegram_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "TELEGRAM_TOKEN appears invalid (expected format: 123456789:ABCdefGHI...)".into(),
            ));
        }

        let groq_api_key = get("GROQ_API_KEY").ok_or(ConfigError::Missing("GROQ_API_KEY"))?;

        let webhook_url = get("WEBHOOK_URL").ok_or(ConfigError::Missing("WEBHOOK_URL"))?;
        let parsed = reqwest::Url::parse(&webhook_url).map_err(|e| ConfigError::Invalid {
            var: "WEBHOOK_URL",
            value: webhook_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                var: "WEBHOOK_URL",
                value: webhook_url,
                reason: "scheme must be http or https".into(),
            });
        }
        let webhook_url = webhook_url.trim_end_matches('/').to_string();

        let admin_id = match get("ADMIN_ID") {
            Some(v) => v.parse::<i64>().map_err(|e| ConfigError::Invalid {
                var: "ADMIN_ID",
                value: v.clone(),
                reason: e.to_string(),
            })?,
            None => 0,
        };

        let port = match get("PORT") {
            Some(v) => v.parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                value: v.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let timeout_secs = match get("COMPLETION_TIMEOUT_SECS") {
            Some(v) => v.parse::<u64>().map_err(|e| ConfigError::Invalid {
                var: "COMPLETION_TIMEOUT_SECS",
                value: v.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(ConfigError::Validation("COMPLETION_TIMEOUT_SECS must be greater than zero".into()));
        }

        Ok(Self {
            telegram_token,
            groq_api_key,
            webhook_url,
            admin_id,
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            data_dir: get("DATA_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".")),
            groq_model: get("GROQ_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            groq_url: get("GROQ_URL").unwrap_or_else(|| DEFAULT_GROQ_URL.to_string()),
            completion_timeout: Duration::from_secs(timeout_secs),
            webhook_secret: get("WEBHOOK_SECRET"),
        })
    }

    /// Full URL Telegram should deliver updates to.
    pub fn webhook_endpoint(&self) -> String {
        format!("{}/webhook", self.webhook_url)
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(HISTORY_FILE)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
