use std::{env, fs, io, path::Path};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "configs/config.toml";
pub const DEFAULT_JWT_SECRET: &str = "default_secret_key";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// AppConfig
///
/// Holds the application's entire configuration state. Built once in `main`
/// from the TOML file plus environment overrides, then kept read-only in
/// `AppState`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub env: Env,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub upload: UploadConfig,
    pub redis: RedisConfig,
    pub views: ViewsConfig,
    pub seed: SeedConfig,
}

/// Env
///
/// Runtime context. Production hardens secret handling and switches log output
/// to JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Env {
    #[default]
    #[serde(alias = "development")]
    Local,
    #[serde(alias = "release")]
    Production,
}

impl Env {
    fn parse(value: &str) -> Self {
        match value {
            "production" | "release" => Env::Production,
            _ => Env::Local,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub mode: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            mode: "development".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Full connection string. Takes precedence over the individual fields.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub dbname: String,
    pub max_idle_conns: u32,
    pub max_open_conns: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            username: "postgres".to_string(),
            password: "postgres".to_string(),
            dbname: "chitchat".to_string(),
            max_idle_conns: 10,
            max_open_conns: 100,
        }
    }
}

impl DatabaseConfig {
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.username, self.password, self.host, self.port, self.dbname
            ),
        }
    }

    /// Idle connections kept warm; never more than the pool maximum.
    pub fn min_connections(&self) -> u32 {
        self.max_idle_conns.min(self.max_open_conns)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,
    /// Duration string such as `24h`, `90m` or `1h30m`.
    pub expire: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_JWT_SECRET.to_string(),
            expire: "24h".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Megabytes.
    pub max_size: u64,
    pub allowed_types: Vec<String>,
    pub storage_path: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size: 5,
            allowed_types: vec!["jpeg".into(), "png".into(), "gif".into()],
            storage_path: "./uploads".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub password: String,
    pub db: u8,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "localhost".to_string(),
            port: 6379,
            password: String::new(),
            db: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewsConfig {
    pub queue_capacity: usize,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub enabled: bool,
    pub admin_username: String,
    pub admin_email: String,
    pub admin_password: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            admin_username: "admin".to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_password: "admin123".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the file named by `CONFIG_PATH` (default `configs/config.toml`),
    /// applies environment overrides and validates the result. A missing file
    /// is not an error; the built-in defaults are used instead.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// from_file
    ///
    /// Parses a TOML file. Sections and keys left out of the file keep their
    /// defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(raw) => Self::from_toml(&raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = env::var("APP_ENV") {
            self.env = Env::parse(&value);
        }
        if let Ok(value) = env::var("SERVER_PORT") {
            self.server.port = value.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "SERVER_PORT",
                value,
            })?;
        }
        if let Ok(value) = env::var("SERVER_MODE") {
            // release mode implies production unless APP_ENV says otherwise
            if env::var("APP_ENV").is_err() {
                self.env = Env::parse(&value);
            }
            self.server.mode = value;
        }
        if let Ok(value) = env::var("DATABASE_URL") {
            self.database.url = Some(value);
        }
        if let Ok(value) = env::var("JWT_SECRET") {
            self.jwt.secret = value;
        }
        if let Ok(value) = env::var("JWT_EXPIRE") {
            self.jwt.expire = value;
        }
        if let Ok(value) = env::var("ADMIN_PASSWORD") {
            self.seed.admin_password = value;
        }
        Ok(())
    }

    /// validate
    ///
    /// Fails fast on settings the server must not start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.is_empty() {
            return Err(ConfigError::Invalid("jwt.secret must not be empty".into()));
        }
        if self.env == Env::Production && self.jwt.secret == DEFAULT_JWT_SECRET {
            return Err(ConfigError::Invalid(
                "the default jwt.secret cannot be used in production".into(),
            ));
        }
        if self.database.max_open_conns == 0 {
            return Err(ConfigError::Invalid(
                "database.max_open_conns must be at least 1".into(),
            ));
        }
        if self.views.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "views.queue_capacity must be at least 1".into(),
            ));
        }
        if self.upload.max_size == 0 {
            return Err(ConfigError::Invalid("upload.max_size must be at least 1".into()));
        }
        Ok(())
    }
}
