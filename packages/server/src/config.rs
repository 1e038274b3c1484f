use std::path::PathBuf;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

/// Origins the web and mobile front ends are served from.
const DEFAULT_ALLOW_ORIGINS: &[&str] = &[
    "https://reconnect-navy.vercel.app",
    "http://localhost:4200",
    "http://localhost:8100",
    "http://localhost:3000",
];

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Directory uploaded images are written to.
    pub dir: String,
    /// Largest accepted image, in bytes.
    pub max_size: u64,
}

impl UploadConfig {
    pub fn base_path(&self) -> PathBuf {
        PathBuf::from(&self.dir)
    }

    /// Prefix of the relative paths returned to clients, e.g. `/uploads`.
    pub fn public_prefix(&self) -> String {
        let dir = self.dir.trim_start_matches("./").trim_matches('/');
        format!("/{dir}")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub upload: UploadConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Self::defaults()?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., RECONNECT__AUTH__JWT_SECRET)
            .add_source(
                Environment::with_prefix("RECONNECT")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.cors.allow_origins", DEFAULT_ALLOW_ORIGINS.to_vec())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.max_connections", 20)?
            .set_default("auth.token_ttl_hours", 24)?
            .set_default("upload.dir", "uploads/")?
            .set_default("upload.max_size", 10 * 1024 * 1024)
    }
}
