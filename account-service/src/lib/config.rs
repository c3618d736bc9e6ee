use std::env;

use auth::WorkFactor;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::authorization::errors::PolicyError;
use crate::domain::authorization::policy::PolicyTable;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub password: PasswordConfig,
    #[serde(default)]
    pub reset: ResetConfig,
    pub kafka: KafkaConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
    pub grpc_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_access_ttl_minutes")]
    pub access_ttl_minutes: i64,
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_ttl_days: i64,
}

/// Argon2id work factor. Omitted fields fall back to the argon2 defaults.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PasswordConfig {
    pub memory_kib: Option<u32>,
    pub iterations: Option<u32>,
    pub parallelism: Option<u32>,
}

impl PasswordConfig {
    pub fn work_factor(&self) -> WorkFactor {
        let defaults = WorkFactor::default();
        WorkFactor {
            memory_kib: self.memory_kib.unwrap_or(defaults.memory_kib),
            iterations: self.iterations.unwrap_or(defaults.iterations),
            parallelism: self.parallelism.unwrap_or(defaults.parallelism),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResetConfig {
    pub ttl_minutes: i64,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: crate::domain::account::service::DEFAULT_RESET_TOKEN_TTL_MINUTES,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    pub topic: String,
}

/// One `[[policy.rules]]` entry.
#[derive(Debug, Deserialize, Clone)]
pub struct PolicyRuleConfig {
    pub role: String,
    pub resource: String,
    pub action: String,
    #[serde(default = "default_effect")]
    pub effect: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PolicyConfig {
    #[serde(default)]
    pub rules: Vec<PolicyRuleConfig>,
}

impl PolicyConfig {
    /// Build the policy table. An empty rule list selects the built-in rules.
    ///
    /// # Errors
    /// Fails on the first configured rule that does not parse.
    pub fn table(&self) -> Result<PolicyTable, PolicyError> {
        if self.rules.is_empty() {
            return Ok(PolicyTable::default());
        }

        PolicyTable::from_rules(self.rules.iter().map(|rule| {
            (
                rule.role.as_str(),
                rule.resource.as_str(),
                rule.action.as_str(),
                rule.effect.as_str(),
            )
        }))
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_issuer() -> String {
    "account-service".to_string()
}

fn default_access_ttl_minutes() -> i64 {
    auth::jwt::DEFAULT_ACCESS_TTL_MINUTES
}

fn default_refresh_ttl_days() -> i64 {
    auth::jwt::DEFAULT_REFRESH_TTL_DAYS
}

fn default_effect() -> String {
    "allow".to_string()
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        if config.jwt.secret.is_empty() {
            return Err(ConfigError::Message(
                "jwt.secret must be set (JWT__SECRET)".to_string(),
            ));
        }

        Ok(config)
    }
}
