//! Process configuration, read once at startup.
//!
//! Nothing outside `AppConfig::from_env` looks at environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use pantry_ai::GeminiConfig;
use pantry_infra::PreprocessMethod;
use pantry_observability::LogFormat;
use pantry_receipts::UploadPolicy;

pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub database_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub llm_model: Option<String>,
    pub llm_max_tokens: Option<u32>,
    pub llm_temperature: Option<f32>,
    pub llm_timeout: Duration,
    pub max_file_size_mb: u64,
    pub allowed_extensions: Vec<String>,
    pub upload_dir: PathBuf,
    pub ocr_preprocess: PreprocessMethod,
    pub log_format: LogFormat,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"[REDACTED]")
            .field("access_token_minutes", &self.access_token_minutes)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("llm_model", &self.llm_model)
            .field("llm_max_tokens", &self.llm_max_tokens)
            .field("llm_temperature", &self.llm_temperature)
            .field("llm_timeout", &self.llm_timeout)
            .field("max_file_size_mb", &self.max_file_size_mb)
            .field("allowed_extensions", &self.allowed_extensions)
            .field("upload_dir", &self.upload_dir)
            .field("ocr_preprocess", &self.ocr_preprocess)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            access_token_minutes: 60,
            database_url: None,
            gemini_api_key: None,
            llm_model: None,
            llm_max_tokens: None,
            llm_temperature: None,
            llm_timeout: Duration::from_secs(30),
            max_file_size_mb: 10,
            allowed_extensions: ["jpg", "jpeg", "png", "pdf"].map(String::from).to_vec(),
            upload_dir: PathBuf::from("./uploads"),
            ocr_preprocess: PreprocessMethod::Thresh,
            log_format: LogFormat::Json,
        }
    }
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset and blank values take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        if let Some(v) = get("BIND_ADDR") {
            config.bind_addr = parse("BIND_ADDR", &v)?;
        }
        if let Some(v) = get("JWT_SECRET") {
            config.jwt_secret = v;
        }
        if let Some(v) = get("ACCESS_TOKEN_EXPIRE_MINUTES") {
            config.access_token_minutes = parse("ACCESS_TOKEN_EXPIRE_MINUTES", &v)?;
        }
        config.database_url = get("DATABASE_URL");
        config.gemini_api_key = get("GEMINI_API_KEY");
        config.llm_model = get("LLM_MODEL");
        config.llm_max_tokens = get("LLM_MAX_TOKENS")
            .map(|v| parse("LLM_MAX_TOKENS", &v))
            .transpose()?;
        config.llm_temperature = get("LLM_TEMPERATURE")
            .map(|v| parse("LLM_TEMPERATURE", &v))
            .transpose()?;
        if let Some(v) = get("LLM_TIMEOUT_SECS") {
            config.llm_timeout = Duration::from_secs(parse("LLM_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = get("MAX_FILE_SIZE_MB") {
            config.max_file_size_mb = parse("MAX_FILE_SIZE_MB", &v)?;
        }
        if let Some(v) = get("ALLOWED_EXTENSIONS") {
            config.allowed_extensions = v
                .split(',')
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect();
        }
        if let Some(v) = get("UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(v);
        }
        if let Some(v) = get("OCR_PREPROCESS_METHOD") {
            config.ocr_preprocess = parse("OCR_PREPROCESS_METHOD", &v)?;
        }
        if let Some(v) = get("LOG_FORMAT") {
            config.log_format = parse("LOG_FORMAT", &v)?;
        }

        Ok(config)
    }

    /// Every problem that should stop the server from starting.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.jwt_secret.trim().is_empty() {
            problems.push("JWT_SECRET cannot be empty".to_string());
        }
        if self.access_token_minutes <= 0 {
            problems.push("ACCESS_TOKEN_EXPIRE_MINUTES must be positive".to_string());
        }
        if self.max_file_size_mb == 0 {
            problems.push("MAX_FILE_SIZE_MB must be positive".to_string());
        }
        if self.allowed_extensions.is_empty() {
            problems.push("ALLOWED_EXTENSIONS must list at least one extension".to_string());
        }

        // LLM settings are all-or-nothing, keyed on the API key.
        if self.gemini_api_key.is_some() {
            if self.llm_model.is_none() {
                problems.push("LLM_MODEL is required when GEMINI_API_KEY is set".to_string());
            }
            match self.llm_max_tokens {
                None => problems.push("LLM_MAX_TOKENS is required when GEMINI_API_KEY is set".to_string()),
                Some(0) => problems.push("LLM_MAX_TOKENS must be positive".to_string()),
                Some(_) => {}
            }
            match self.llm_temperature {
                None => problems.push("LLM_TEMPERATURE is required when GEMINI_API_KEY is set".to_string()),
                Some(t) if !(0.0..=2.0).contains(&t) => {
                    problems.push("LLM_TEMPERATURE must be between 0 and 2".to_string())
                }
                Some(_) => {}
            }
        }

        problems
    }

    pub fn uses_dev_jwt_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.access_token_minutes)
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::new(&self.allowed_extensions, self.max_file_size_mb)
    }

    /// Model settings, when the LLM is fully configured.
    pub fn llm(&self) -> Option<GeminiConfig> {
        let api_key = self.gemini_api_key.as_ref()?;
        let model = self.llm_model.as_ref()?;
        Some(
            GeminiConfig::new(api_key, model)
                .with_max_output_tokens(self.llm_max_tokens?)
                .with_temperature(self.llm_temperature?)
                .with_timeout(self.llm_timeout),
        )
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
