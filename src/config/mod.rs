//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, InvocationConfig, LogFormat, LoggingConfig, ServerConfig, StorageSettings,
};
