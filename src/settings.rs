use std::{env, fmt, str::FromStr};

use config::{Config, ConfigError, Environment, File};
use dotenv::dotenv;
use jsonwebtoken::{DecodingKey, EncodingKey};
use serde::Deserialize;
use strum::{Display, EnumString};
use zeroize::Zeroizing;

/// Selects `config/{env}.toml`; parsed from `APP_ENV` case-insensitively.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default)]
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default)]
    pub run_migrations: bool,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_minutes: i64,

    #[serde(default)]
    pub refresh_token_secret: String,

    #[serde(default = "default_refresh_expiration")]
    pub refresh_token_exp_days: i64,

    #[serde(default)]
    pub log_json: bool,
}

const MIN_SECRET_LENGTH: usize = 32;

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Community-Hub".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_max_connections() -> u32 {
    20
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_jwt_expiration() -> i64 {
    15
}
fn default_refresh_expiration() -> i64 {
    7
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(raw_env.trim())
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(Environment::with_prefix("APP").prefix_separator("_").ignore_empty(true));

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        // Secrets may only be present in the raw environment
        config.database_url = fill_or_env(config.database_url, "APP_DATABASE_URL")?;
        config.jwt_secret = fill_or_env(config.jwt_secret, "APP_JWT_SECRET")?;
        config.refresh_token_secret = fill_or_env(config.refresh_token_secret, "APP_REFRESH_TOKEN_SECRET")?;

        config.validate()?;
        Ok(config)
    }

    /// Configuration for the console binary, which only talks to the database.
    pub fn for_console() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = env::var("APP_DATABASE_URL")
            .map_err(|_| ConfigError::Message("APP_DATABASE_URL must be set".into()))?;

        Ok(AppConfig {
            database_url,
            database_max_connections: 2,
            ..AppConfig::testing()
        })
    }

    /// In-process defaults with throwaway secrets, used by tests and the console.
    pub fn testing() -> Self {
        AppConfig {
            env: AppEnvironment::Testing,
            name: default_name(),
            port: 0,
            host: default_host(),
            worker_count: 1,
            database_url: String::new(),
            database_max_connections: default_max_connections(),
            run_migrations: false,
            cors_allowed_origins: default_cors_origins(),
            jwt_secret: "testing_jwt_secret_that_is_long_enough_0123456789".into(),
            jwt_expiration_minutes: default_jwt_expiration(),
            refresh_token_secret: "testing_refresh_secret_that_is_long_enough_012345".into(),
            refresh_token_exp_days: default_refresh_expiration(),
            log_json: false,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database_url.trim().is_empty() {
            errors.push("DATABASE_URL cannot be empty");
        }
        if self.jwt_secret.len() < MIN_SECRET_LENGTH {
            errors.push("JWT_SECRET must be at least 32 characters");
        }
        if self.refresh_token_secret.len() < MIN_SECRET_LENGTH {
            errors.push("REFRESH_TOKEN_SECRET must be at least 32 characters");
        }
        if self.database_max_connections == 0 {
            errors.push("DATABASE_MAX_CONNECTIONS must be positive");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn fill_or_env(current: String, env_key: &str) -> Result<String, ConfigError> {
    if current.trim().is_empty() {
        env::var(env_key).map_err(|_| ConfigError::Message(format!("{env_key} must be set")))
    } else {
        Ok(current)
    }
}

/// Placeholder shown instead of a secret in debug output.
fn redact(secret: &str) -> &'static str {
    match secret.len() {
        0 => "[MISSING]",
        1..MIN_SECRET_LENGTH => "[TOO_SHORT]",
        _ => "[REDACTED]",
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("database_url", &redact(&self.database_url))
            .field("database_max_connections", &self.database_max_connections)
            .field("run_migrations", &self.run_migrations)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("jwt_secret", &redact(&self.jwt_secret))
            .field("jwt_expiration_minutes", &self.jwt_expiration_minutes)
            .field("refresh_token_secret", &redact(&self.refresh_token_secret))
            .field("refresh_token_exp_days", &self.refresh_token_exp_days)
            .field("log_json", &self.log_json)
            .finish()
    }
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub refresh_encoding: EncodingKey,
    pub refresh_decoding: DecodingKey,
}

impl From<&AppConfig> for JwtKeys {
    fn from(config: &AppConfig) -> Self {
        let jwt_secret = Zeroizing::new(config.jwt_secret.clone());
        let refresh_secret = Zeroizing::new(config.refresh_token_secret.clone());

        JwtKeys {
            encoding: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(jwt_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
        }
    }
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("encoding", &"[REDACTED]")
            .field("decoding", &"[REDACTED]")
            .field("refresh_encoding", &"[REDACTED]")
            .field("refresh_decoding", &"[REDACTED]")
            .finish()
    }
}
