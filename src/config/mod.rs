/// Database configuration and connection management
pub mod database;

/// Engine configuration loading from config.toml
pub mod engine;
