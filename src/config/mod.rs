//! Application configuration loading

mod app_config;

pub use app_config::{
    AppConfig, DatabaseConfig, IngestionConfig, LogFormat, LoggingConfig, OpenAiConfig,
    ServerConfig, VectorStoreConfig,
};
