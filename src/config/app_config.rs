use std::time::Duration;

use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub invocation: InvocationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Shared secret for the admin routes; open when unset
    pub admin_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// `memory` or `postgres`
    pub backend: String,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

/// Settings for callers of the invocation pipeline
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InvocationConfig {
    /// Deadline the admin API and CLI impose around one invocation
    pub deadline_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            admin_token: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            database_url: None,
            max_connections: 10,
        }
    }
}

impl Default for InvocationConfig {
    fn default() -> Self {
        Self {
            deadline_secs: None,
            user_agent: concat!("worker-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl InvocationConfig {
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Rejects settings that deserialize but cannot work
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.invocation.deadline_secs == Some(0) {
            return Err(config::ConfigError::Message(
                "invocation.deadline_secs must be at least 1; omit it for no deadline".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert!(config.server.admin_token.is_none());
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.storage.backend, "memory");
        assert!(config.invocation.deadline().is_none());
        assert!(config.invocation.user_agent.starts_with("worker-gateway/"));
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: AppConfig = config::Config::builder()
            .set_override("server.port", 9090)
            .unwrap()
            .set_override("invocation.deadline_secs", 15)
            .unwrap()
            .set_override("logging.format", "json")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.invocation.deadline(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_zero_deadline_is_rejected() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.invocation.deadline_secs = Some(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("deadline_secs"));

        config.invocation.deadline_secs = Some(1);
        assert!(config.validate().is_ok());
    }
}
