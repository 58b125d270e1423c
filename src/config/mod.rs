mod app_config;

pub use app_config::{AppConfig, CatalogConfig, EngineConfig, LogFormat, LoggingConfig};
