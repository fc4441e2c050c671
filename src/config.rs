use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GEMINI_IMAGE_MODEL: &str = "gemini-2.0-flash-preview-image-generation";
const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4-turbo";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub gemini: GeminiConfig,
    pub openai: OpenAiConfig,
    pub output_dir: PathBuf,
    pub file_prefix: String,
    pub image_concurrency: usize,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub http_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
}

// Missing key only fails the enhancement call
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("GOOGLE_API_KEY").ok_or_else(|| anyhow!("GOOGLE_API_KEY not set"))?;

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&get, "PORT", 8080)?,
            gemini: GeminiConfig {
                api_key,
                api_base: get("GEMINI_API_BASE")
                    .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
                model: get("GEMINI_IMAGE_MODEL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_IMAGE_MODEL.to_string()),
            },
            openai: OpenAiConfig {
                api_key: get("OPENAI_API_KEY"),
                api_base: get("OPENAI_API_BASE")
                    .unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_string()),
                model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            },
            output_dir: get("IMAGE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("generated")),
            file_prefix: get("IMAGE_FILE_PREFIX")
                .unwrap_or_else(|| "gemini_generated_image".to_string()),
            image_concurrency: parse_or(&get, "IMAGE_CONCURRENCY", 1usize)?.max(1),
            max_retries: parse_or(&get, "MAX_RETRIES", 3u32)?.max(1),
            retry_base_delay: Duration::from_millis(parse_or(&get, "RETRY_BASE_DELAY_MS", 1000)?),
            http_timeout: Duration::from_secs(parse_or(&get, "HTTP_TIMEOUT_SECS", 120)?),
        })
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parse_or<T, F>(get: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_the_google_key_is_set() {
        let config = config_from(&[("GOOGLE_API_KEY", "g-key")]).unwrap();

        assert_eq!(config.bind_addr(), ("127.0.0.1".to_string(), 8080));
        assert_eq!(config.gemini.api_key, "g-key");
        assert_eq!(config.gemini.api_base, DEFAULT_GEMINI_API_BASE);
        assert_eq!(config.openai.model, "gpt-4-turbo");
        assert!(config.openai.api_key.is_none());
        assert_eq!(config.output_dir, PathBuf::from("generated"));
        assert_eq!(config.file_prefix, "gemini_generated_image");
        assert_eq!(config.image_concurrency, 1);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_base_delay, Duration::from_secs(1));
        assert_eq!(config.http_timeout, Duration::from_secs(120));
    }

    #[test]
    fn missing_google_key_fails_fast() {
        let err = config_from(&[("OPENAI_API_KEY", "o-key")]).unwrap_err();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));

        assert!(config_from(&[("GOOGLE_API_KEY", "  ")]).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("GOOGLE_API_KEY", "g-key"),
            ("OPENAI_API_KEY", "o-key"),
            ("PORT", "9090"),
            ("IMAGE_CONCURRENCY", "4"),
            ("MAX_RETRIES", "0"),
            ("RETRY_BASE_DELAY_MS", "250"),
        ])
        .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.openai.api_key.as_deref(), Some("o-key"));
        assert_eq!(config.image_concurrency, 4);
        // At least one attempt is always made
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.retry_base_delay, Duration::from_millis(250));
    }

    #[test]
    fn unparsable_numbers_are_rejected() {
        let err = config_from(&[("GOOGLE_API_KEY", "g-key"), ("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
