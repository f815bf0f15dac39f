//! Server configuration read from the environment.

use std::path::PathBuf;

use axum::http::HeaderValue;
use tracing::warn;

use diary_core::defaults::*;

/// Telegram bot settings; present only when a bot token is configured.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub api_base_url: String,
    /// Expected value of `X-Telegram-Bot-Api-Secret-Token`.
    pub webhook_secret: Option<String>,
}

/// Everything `main` needs to start the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub storage_path: PathBuf,
    pub max_upload_bytes: usize,
    pub run_migrations: bool,
    pub telegram: Option<TelegramConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allowed_origins: split_origins(DEFAULT_ALLOWED_ORIGINS),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            run_migrations: true,
            telegram: None,
        }
    }
}

impl ServerConfig {
    /// Read configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match var(ENV_PORT) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(
                    subsystem = "api",
                    component = "config",
                    value = %raw,
                    "Invalid PORT, using default"
                );
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let telegram = var(ENV_TELEGRAM_BOT_TOKEN).map(|bot_token| TelegramConfig {
            bot_token,
            api_base_url: var(ENV_TELEGRAM_API_BASE_URL)
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE_URL.to_string()),
            webhook_secret: var(ENV_TELEGRAM_WEBHOOK_SECRET),
        });

        Self {
            database_url: var(ENV_DATABASE_URL).unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            host: var(ENV_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            allowed_origins: split_origins(
                &var(ENV_ALLOWED_ORIGINS).unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string()),
            ),
            storage_path: var(ENV_STORAGE_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH)),
            max_upload_bytes: var(ENV_MAX_UPLOAD_BYTES)
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            run_migrations: var(ENV_RUN_MIGRATIONS)
                .map(|v| !(v == "0" || v.eq_ignore_ascii_case("false")))
                .unwrap_or(true),
            telegram,
        }
    }

    /// Allowed CORS origins as header values; invalid entries are skipped.
    pub fn cors_origins(&self) -> Vec<HeaderValue> {
        self.allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Invalid CORS origin '{}': {}", origin, e);
                    None
                }
            })
            .collect()
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_without_env() {
        let config = config_from(&[]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.host, DEFAULT_HOST);
        assert!(config.run_migrations);
        assert!(config.telegram.is_none());
        assert_eq!(config.allowed_origins.len(), 2);
    }

    #[test]
    fn test_telegram_enabled_by_token() {
        let config = config_from(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_WEBHOOK_SECRET", "s3cret"),
        ]);
        let telegram = config.telegram.unwrap();
        assert_eq!(telegram.bot_token, "123:abc");
        assert_eq!(telegram.api_base_url, DEFAULT_TELEGRAM_API_BASE_URL);
        assert_eq!(telegram.webhook_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_blank_token_disables_telegram() {
        let config = config_from(&[("TELEGRAM_BOT_TOKEN", "  ")]);
        assert!(config.telegram.is_none());
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let config = config_from(&[("PORT", "not-a-port"), ("RUN_MIGRATIONS", "false")]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(!config.run_migrations);
    }

    #[test]
    fn test_origins_are_trimmed() {
        let config = config_from(&[("ALLOWED_ORIGINS", " https://a.example , ,https://b.example")]);
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert_eq!(config.cors_origins().len(), 2);
    }
}
