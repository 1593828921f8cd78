use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;

use scantally_core::db::DatabaseLocation;
use scantally_core::protocol::MAX_RECENT_SCANS;
use scantally_core::util::{is_http_url, normalize_text_option};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database: DatabaseLocation,
    /// Default page size of `GET /api/scans`
    pub recent_limit: usize,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let database = match &self.database {
            DatabaseLocation::Local(path) => format!("local:{}", path.display()),
            DatabaseLocation::Remote { url, auth_token } if auth_token.is_empty() => {
                format!("remote:{url}")
            }
            DatabaseLocation::Remote { url, .. } => format!("remote:{url} (token [REDACTED])"),
        };
        formatter
            .debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database", &database)
            .field("recent_limit", &self.recent_limit)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = match optional_trimmed(&lookup, "SCANTALLY_BIND_ADDR") {
            Some(bind_addr) => bind_addr,
            None => {
                let port = value_or_default(&lookup, "PORT", "5000")
                    .parse::<u16>()
                    .map_err(|_| {
                        ConfigError::Invalid("PORT must be an integer in [0, 65535]".to_string())
                    })?;
                format!("0.0.0.0:{port}")
            }
        };

        let database = match optional_trimmed(&lookup, "DATABASE_URL") {
            Some(url) => {
                if !(url.starts_with("libsql://") || is_http_url(&url)) {
                    return Err(ConfigError::Invalid(
                        "DATABASE_URL must start with libsql://, http:// or https://".to_string(),
                    ));
                }
                let auth_token = optional_trimmed(&lookup, "DATABASE_AUTH_TOKEN").unwrap_or_default();
                DatabaseLocation::Remote { url, auth_token }
            }
            None => DatabaseLocation::Local(PathBuf::from(value_or_default(
                &lookup,
                "SCANTALLY_DB_PATH",
                "scantally.db",
            ))),
        };

        let recent_limit = value_or_default(&lookup, "SCANTALLY_RECENT_LIMIT", "500")
            .parse::<usize>()
            .map_err(|_| {
                ConfigError::Invalid(format!(
                    "SCANTALLY_RECENT_LIMIT must be an integer in [1, {MAX_RECENT_SCANS}]"
                ))
            })?;
        if !(1..=MAX_RECENT_SCANS).contains(&recent_limit) {
            return Err(ConfigError::Invalid(format!(
                "SCANTALLY_RECENT_LIMIT must be in [1, {MAX_RECENT_SCANS}]"
            )));
        }

        Ok(Self {
            bind_addr,
            database,
            recent_limit,
        })
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    normalize_text_option(lookup(name))
}

#[cfg(test)]
pub(crate) fn test_config(database: DatabaseLocation) -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        database,
        recent_limit: MAX_RECENT_SCANS,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn config_from(map: &HashMap<&str, &str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn config_defaults_to_embedded_store_on_port_5000() {
        let config = config_from(&HashMap::new()).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert_eq!(
            config.database,
            DatabaseLocation::Local(PathBuf::from("scantally.db"))
        );
        assert_eq!(config.recent_limit, 500);
    }

    #[test]
    fn config_bind_addr_overrides_port() {
        let mut map = HashMap::new();
        map.insert("PORT", "8080");
        assert_eq!(config_from(&map).unwrap().bind_addr, "0.0.0.0:8080");

        map.insert("SCANTALLY_BIND_ADDR", "127.0.0.1:9000");
        assert_eq!(config_from(&map).unwrap().bind_addr, "127.0.0.1:9000");
    }

    #[test]
    fn config_rejects_invalid_values() {
        let mut map = HashMap::new();
        map.insert("PORT", "not-a-port");
        assert!(config_from(&map).is_err());

        let mut map = HashMap::new();
        map.insert("SCANTALLY_RECENT_LIMIT", "501");
        assert!(config_from(&map).is_err());

        let mut map = HashMap::new();
        map.insert("DATABASE_URL", "postgres://db");
        let err = config_from(&map).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn config_redacts_database_token() {
        let mut map = HashMap::new();
        map.insert("DATABASE_URL", "libsql://scans.turso.io");
        map.insert("DATABASE_AUTH_TOKEN", "sensitive-db-token");

        let config = config_from(&map).unwrap();
        assert!(matches!(config.database, DatabaseLocation::Remote { .. }));

        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("sensitive-db-token"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
