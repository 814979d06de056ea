use std::net::SocketAddr;
use std::time::Duration;

use teloxide::types::ChatId;
use thiserror::Error;
use tracing::Level;
use url::Url;

use crate::broadcast::BroadcastSettings;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} should be set.")]
    Missing(&'static str),

    #[error("{name} can't be parsed: '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    pub url: Url,
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub teloxide_token: String,
    pub database_url: String,
    pub log_level: Level,
    pub admin_ids: Vec<i64>,
    pub webhook: Option<WebhookConfig>,
    pub broadcast: BroadcastSettings,
}

impl Config {
    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let log_level = parse_or("LOG_LEVEL", lookup("LOG_LEVEL"), Level::INFO)?;

        let admin_ids = lookup("ADMIN_IDS")
            .map(|ids| parse_admin_ids(&ids))
            .transpose()?
            .unwrap_or_default();

        let webhook = match (lookup("WEBHOOK_URL"), lookup("WEBHOOK_ADDR")) {
            (Some(url), Some(addr)) => Some(WebhookConfig {
                url: parse("WEBHOOK_URL", &url)?,
                addr: parse("WEBHOOK_ADDR", &addr)?,
            }),
            (Some(_), None) => return Err(ConfigError::Missing("WEBHOOK_ADDR")),
            (None, Some(_)) => return Err(ConfigError::Missing("WEBHOOK_URL")),
            (None, None) => None,
        };

        let defaults = BroadcastSettings::default();
        let chunk_size = parse_or(
            "BROADCAST_CHUNK_SIZE",
            lookup("BROADCAST_CHUNK_SIZE"),
            defaults.chunk_size,
        )?;
        let pause_ms = parse_or(
            "BROADCAST_PAUSE_MS",
            lookup("BROADCAST_PAUSE_MS"),
            defaults.pause.as_millis() as u64,
        )?;

        Ok(Self {
            teloxide_token: required("TELOXIDE_TOKEN")?,
            database_url: required("DATABASE_URL")?,
            log_level,
            admin_ids,
            webhook,
            broadcast: BroadcastSettings {
                chunk_size: chunk_size.max(1),
                pause: Duration::from_millis(pause_ms),
            },
        })
    }

    pub fn is_admin(&self, chat_id: ChatId) -> bool {
        self.admin_ids.contains(&chat_id.0)
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_owned(),
    })
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(value) => parse(name, &value),
        None => Ok(default),
    }
}

fn parse_admin_ids(ids: &str) -> Result<Vec<i64>, ConfigError> {
    ids.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| parse("ADMIN_IDS", id))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("TELOXIDE_TOKEN", "123:abc"),
            ("DATABASE_URL", "postgres://localhost/bot"),
        ]))
        .unwrap();

        assert_eq!(config.log_level, Level::INFO);
        assert!(config.admin_ids.is_empty());
        assert!(config.webhook.is_none());
        assert_eq!(config.broadcast, BroadcastSettings::default());
    }

    #[test]
    fn admin_ids_are_comma_separated() {
        let config = Config::from_lookup(lookup(&[
            ("TELOXIDE_TOKEN", "123:abc"),
            ("DATABASE_URL", "postgres://localhost/bot"),
            ("ADMIN_IDS", "100, 200,,-300"),
        ]))
        .unwrap();

        assert_eq!(config.admin_ids, vec![100, 200, -300]);
        assert!(config.is_admin(ChatId(200)));
        assert!(!config.is_admin(ChatId(201)));
    }

    #[test]
    fn missing_token_is_reported() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/bot")]))
            .unwrap_err();

        assert_eq!(err, ConfigError::Missing("TELOXIDE_TOKEN"));
    }

    #[test]
    fn webhook_needs_both_parts() {
        let err = Config::from_lookup(lookup(&[
            ("TELOXIDE_TOKEN", "123:abc"),
            ("DATABASE_URL", "postgres://localhost/bot"),
            ("WEBHOOK_URL", "https://example.org/bot"),
        ]))
        .unwrap_err();

        assert_eq!(err, ConfigError::Missing("WEBHOOK_ADDR"));
    }

    #[test]
    fn broadcast_settings_are_read() {
        let config = Config::from_lookup(lookup(&[
            ("TELOXIDE_TOKEN", "123:abc"),
            ("DATABASE_URL", "postgres://localhost/bot"),
            ("BROADCAST_CHUNK_SIZE", "0"),
            ("BROADCAST_PAUSE_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.broadcast.chunk_size, 1);
        assert_eq!(config.broadcast.pause, Duration::from_millis(250));
    }

    #[test]
    fn bad_level_is_invalid() {
        let err = Config::from_lookup(lookup(&[
            ("TELOXIDE_TOKEN", "123:abc"),
            ("DATABASE_URL", "postgres://localhost/bot"),
            ("LOG_LEVEL", "loud"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { name: "LOG_LEVEL", .. }));
    }
}
