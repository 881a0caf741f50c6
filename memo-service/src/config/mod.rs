use secrecy::Secret;
use service_core::config::{self as core_config, get_env, get_env_parsed, is_production};
use service_core::error::AppError;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MemoConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub auth: AuthConfig,
    /// Empty disables the CORS layer.
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProviderKind {
    OpenAi,
    Mock,
}

impl std::str::FromStr for LlmProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(LlmProviderKind::OpenAi),
            "mock" => Ok(LlmProviderKind::Mock),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "LLM_PROVIDER must be 'openai' or 'mock', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    pub api_key: Secret<String>,
    pub base_url: String,
    pub model: String,
    pub request_timeout: Duration,
    pub tags_timeout: Duration,
    pub title_timeout: Duration,
    pub suggestions_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
    pub audience: String,
}

impl MemoConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = is_production();

        let provider: LlmProviderKind = get_env("LLM_PROVIDER", Some("openai"), is_prod)?.parse()?;
        let api_key = match provider {
            LlmProviderKind::OpenAi => get_env("OPENAI_API_KEY", None, is_prod)?,
            LlmProviderKind::Mock => std::env::var("OPENAI_API_KEY").unwrap_or_default(),
        };

        let otlp_endpoint = std::env::var("OTLP_ENDPOINT")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Ok(MemoConfig {
            common,
            service_name: get_env("SERVICE_NAME", Some("memo-service"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint,
            database: DatabaseConfig {
                url: Secret::new(get_env("DATABASE_URL", None, is_prod)?),
                max_connections: get_env_parsed("DATABASE_MAX_CONNECTIONS", "10", is_prod)?,
                min_connections: get_env_parsed("DATABASE_MIN_CONNECTIONS", "1", is_prod)?,
            },
            llm: LlmConfig {
                provider,
                api_key: Secret::new(api_key),
                base_url: get_env("OPENAI_BASE_URL", Some("https://api.openai.com/v1"), is_prod)?,
                model: get_env("LLM_MODEL", Some("gpt-4o-mini"), is_prod)?,
                request_timeout: secs("LLM_REQUEST_TIMEOUT_SECS", "20", is_prod)?,
                tags_timeout: secs("TAGS_TIMEOUT_SECS", "25", is_prod)?,
                title_timeout: secs("TITLE_TIMEOUT_SECS", "25", is_prod)?,
                suggestions_timeout: secs("SUGGESTIONS_TIMEOUT_SECS", "30", is_prod)?,
            },
            auth: AuthConfig {
                jwt_secret: Secret::new(get_env("AUTH_JWT_SECRET", None, is_prod)?),
                audience: get_env("AUTH_JWT_AUDIENCE", Some("authenticated"), is_prod)?,
            },
            cors_allowed_origins: parse_origins(
                &std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default(),
            ),
        })
    }
}

fn secs(key: &str, default: &str, is_prod: bool) -> Result<Duration, AppError> {
    get_env_parsed::<u64>(key, default, is_prod).map(Duration::from_secs)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_parses_case_insensitively() {
        assert_eq!("OpenAI".parse::<LlmProviderKind>().unwrap(), LlmProviderKind::OpenAi);
        assert_eq!("mock".parse::<LlmProviderKind>().unwrap(), LlmProviderKind::Mock);
        assert!("gemini".parse::<LlmProviderKind>().is_err());
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        assert_eq!(
            parse_origins(" https://a.example , ,https://b.example"),
            vec!["https://a.example", "https://b.example"]
        );
        assert!(parse_origins("").is_empty());
    }
}
