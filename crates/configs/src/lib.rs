//! # Settings
//!
//! Layered configuration for the alumni hub binaries:
//!
//! 1. built-in defaults
//! 2. `config/alumni-hub.{toml,yaml,json}` (optional)
//! 3. environment variables `ALUMNI__<SECTION>__<KEY>`, e.g. `ALUMNI__SERVER__PORT=9000`
//!
//! A `.env` file, when present, is loaded into the environment first.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "config/alumni-hub";
pub const ENV_PREFIX: &str = "ALUMNI";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub media: MediaSettings,
    pub auth: AuthSettings,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn addr(&self) -> Result<SocketAddr, SettingsError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| SettingsError::Invalid {
                key: "server.host",
                reason: format!("{e}"),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    pub backend: StorageBackend,
    /// Only read by the sqlite backend.
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct MediaSettings {
    /// Uploads land here and are served under `/uploads`.
    pub root: PathBuf,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: SecretString,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive; `RUST_LOG` wins when set.
    pub filter: String,
    pub format: LogFormat,
}

impl Settings {
    /// Loads `.env`, the default config file and the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_sources(DEFAULT_CONFIG_FILE, None)
    }

    /// `env` replaces the process environment when given.
    pub fn from_sources(file: &str, env: Option<HashMap<String, String>>) -> Result<Self, SettingsError> {
        let settings: Settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.backend", "memory")?
            .set_default("database.url", "sqlite://alumni-hub.db")?
            .set_default("media.root", "./data/uploads")?
            .set_default("media.max_upload_bytes", 5 * 1024 * 1024)?
            .set_default("auth.token_ttl_hours", 24)?
            .set_default("log.filter", "info,tower_http=debug")?
            .set_default("log.format", "pretty")?
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.auth.jwt_secret.expose_secret().trim().is_empty() {
            return Err(SettingsError::Invalid {
                key: "auth.jwt_secret",
                reason: "must not be empty".into(),
            });
        }
        if self.auth.token_ttl_hours <= 0 {
            return Err(SettingsError::Invalid {
                key: "auth.token_ttl_hours",
                reason: "must be positive".into(),
            });
        }
        if self.media.max_upload_bytes == 0 {
            return Err(SettingsError::Invalid {
                key: "media.max_upload_bytes",
                reason: "must be positive".into(),
            });
        }
        #[cfg(not(feature = "db-sqlite"))]
        if self.database.backend == StorageBackend::Sqlite {
            return Err(SettingsError::Invalid {
                key: "database.backend",
                reason: "this build does not include the db-sqlite feature".into(),
            });
        }
        self.server.addr()?;
        Ok(())
    }
}
